//! Scenario context: one API handle, one world, one registry
//!
//! The API context is shared by every scenario of a run; the world and the
//! registry belong to exactly one scenario and are written by it alone.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::{ApiContext, ApiResult};
use crate::registry::{DrainReport, EntityKind, EntityRegistry};
use crate::types::Identified;
use crate::world::{Fixtures, World};

pub struct ScenarioContext<F = Fixtures> {
    pub api: Arc<ApiContext>,
    pub world: World<F>,
    pub registry: EntityRegistry,
}

impl<F: Default> ScenarioContext<F> {
    pub fn new(api: Arc<ApiContext>) -> Self {
        Self {
            api,
            world: World::new(),
            registry: EntityRegistry::new(),
        }
    }

    /// Reset scenario state before the first step.
    pub fn begin(&mut self) {
        self.world.reset();
    }

    /// Tear down everything the scenario created. Always leaves the
    /// registry empty.
    pub async fn finish(&mut self) -> DrainReport {
        self.registry.drain(self.api.as_ref()).await
    }
}

impl<F> ScenarioContext<F> {
    /// Record a creation in the world and, if it succeeded, in the registry.
    ///
    /// Only creation calls belong here; updates go through [`Self::record`].
    /// An entity already registered keeps its creation snapshot.
    pub fn track<T>(&mut self, kind: EntityKind, result: &ApiResult<T>)
    where
        T: Identified + Serialize,
    {
        self.world.record(result);
        if let Some(entity) = result.data() {
            self.snapshot(kind, entity.entity_id(), result.payload());
        }
    }

    /// Register an entity without touching the world, for setup steps.
    pub fn adopt<T>(&mut self, kind: EntityKind, entity: &T)
    where
        T: Identified + Serialize,
    {
        let payload = match serde_json::to_value(entity) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(kind = %kind, id = entity.entity_id(), error = %e, "could not encode entity");
                None
            }
        };
        self.snapshot(kind, entity.entity_id(), payload);
    }

    fn snapshot(&mut self, kind: EntityKind, id: &str, payload: Option<Value>) {
        if self.registry.contains(kind, id) {
            debug!(kind = %kind, id, "already tracked");
            return;
        }
        let payload = payload.unwrap_or_else(|| {
            warn!(kind = %kind, id, "tracking entity without a payload");
            Value::Null
        });
        debug!(kind = %kind, id, "tracking created entity");
        self.registry.register(kind, id, payload);
    }

    /// Record a call in the world only.
    pub fn record<T: Serialize>(&mut self, result: &ApiResult<T>) {
        self.world.record(result);
    }
}

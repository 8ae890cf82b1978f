//! Entity lifecycle registry
//!
//! Every entity a scenario creates is recorded here so teardown can run
//! even when a step fails halfway. Draining deletes in dependency order
//! (carts and orders before the products and users they reference,
//! categories last) and always leaves the registry empty.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::api::ApiResult;

/// Resource type of a tracked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Keyed by the owning user id
    Cart,
    Order,
    Product,
    User,
    Category,
}

impl EntityKind {
    /// Order in which [`EntityRegistry::drain`] tears entities down
    pub const TEARDOWN_ORDER: [EntityKind; 5] = [
        EntityKind::Cart,
        EntityKind::Order,
        EntityKind::Product,
        EntityKind::User,
        EntityKind::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Cart => "cart",
            EntityKind::Order => "order",
            EntityKind::Product => "product",
            EntityKind::User => "user",
            EntityKind::Category => "category",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a created entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub id: String,
    pub payload: Value,
}

/// Issues the delete/cancel/clear call for one tracked entity
#[async_trait::async_trait]
pub trait Teardown: Send + Sync {
    async fn remove(&self, kind: EntityKind, id: &str) -> ApiResult<()>;
}

/// A teardown call that did not succeed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeardownFailure {
    pub kind: EntityKind,
    pub id: String,
    pub status: u16,
    pub message: String,
}

/// What a drain attempted and what failed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrainReport {
    pub attempted: usize,
    pub failures: Vec<TeardownFailure>,
}

impl DrainReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Created entities of one scenario, keyed by (kind, id)
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: HashMap<EntityKind, IndexMap<String, Value>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entity. Registering the same (kind, id) again replaces the
    /// payload; it never creates a second record.
    pub fn register(&mut self, kind: EntityKind, id: impl Into<String>, payload: Value) {
        let id = id.into();
        debug!(kind = %kind, id = %id, "registered entity");
        self.entries.entry(kind).or_default().insert(id, payload);
    }

    /// Forget an entity that the scenario deleted itself.
    pub fn remove(&mut self, kind: EntityKind, id: &str) -> Option<EntityRecord> {
        let payload = self.entries.get_mut(&kind)?.shift_remove(id)?;
        Some(EntityRecord {
            kind,
            id: id.to_string(),
            payload,
        })
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Option<&Value> {
        self.entries.get(&kind)?.get(id)
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.get(kind, id).is_some()
    }

    pub fn ids(&self, kind: EntityKind) -> Vec<&str> {
        self.entries
            .get(&kind)
            .map(|ids| ids.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, in teardown order
    pub fn records(&self) -> Vec<EntityRecord> {
        EntityKind::TEARDOWN_ORDER
            .iter()
            .filter_map(|kind| self.entries.get(kind).map(|ids| (kind, ids)))
            .flat_map(|(kind, ids)| {
                ids.iter().map(move |(id, payload)| EntityRecord {
                    kind: *kind,
                    id: id.clone(),
                    payload: payload.clone(),
                })
            })
            .collect()
    }

    /// Tear down every tracked entity, best effort.
    ///
    /// The maps are emptied before the first call goes out, so the registry
    /// ends up empty whatever the calls return (or if the drain future is
    /// dropped midway). Failures are logged and reported, never raised.
    pub async fn drain<T>(&mut self, teardown: &T) -> DrainReport
    where
        T: Teardown + ?Sized,
    {
        let mut entries = std::mem::take(&mut self.entries);
        let mut report = DrainReport::default();

        for kind in EntityKind::TEARDOWN_ORDER {
            let Some(ids) = entries.remove(&kind) else {
                continue;
            };

            for id in ids.keys() {
                report.attempted += 1;
                match teardown.remove(kind, id).await {
                    ApiResult::Success { status, .. } => {
                        debug!(kind = %kind, id = %id, status, "teardown ok");
                    }
                    ApiResult::Failure { status, message, .. } => {
                        warn!(kind = %kind, id = %id, status, error = %message, "teardown failed");
                        report.failures.push(TeardownFailure {
                            kind,
                            id: id.clone(),
                            status,
                            message,
                        });
                    }
                }
            }
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                failed = report.failures.len(),
                "teardown finished"
            );
        }

        report
    }
}

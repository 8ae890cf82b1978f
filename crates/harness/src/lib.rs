//! shopcheck: end-to-end test harness for the storefront REST API
//!
//! This crate provides the runtime the scenarios are written against:
//! - Typed clients for products, users, orders, categories and cart
//! - Envelope normalization (`{data}`, `{data: {data}}` or bare bodies)
//! - Declarative schema validation with itemized violations
//! - An entity registry that tears down everything a scenario created,
//!   in dependency order, whether or not the scenario passed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ScenarioRunner (shopcheck bin)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioContext (one per scenario)                         │
//! │    ├── api: Arc<ApiContext>  (shared by the whole run)      │
//! │    │     ├── products / users / orders / categories / cart  │
//! │    │     └── RestClient ── reqwest ── normalize()           │
//! │    ├── world: World          (last response | last error)   │
//! │    └── registry: EntityRegistry                             │
//! │          └── drain(): cart → order → product → user →       │
//! │                       category                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  schema::catalog  (Validator per entity, DTO and list)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod normalize;
pub mod registry;
pub mod runner;
pub mod scenario;
pub mod scenarios;
pub mod schema;
pub mod types;
pub mod world;

pub use api::{ApiContext, ApiResult, FailureKind};
pub use config::{AuthConfig, HarnessConfig};
pub use error::{HarnessError, HarnessResult};
pub use registry::{DrainReport, EntityKind, EntityRegistry, Teardown};
pub use runner::{ScenarioRunner, SuiteResult};
pub use scenario::ScenarioContext;
pub use schema::{Schema, Validator};
pub use world::{Fixtures, World};

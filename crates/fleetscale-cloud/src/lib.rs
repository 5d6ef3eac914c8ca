//! FleetScale Cloud Fleet Management
//!
//! This crate tracks a fleet of disposable cloud nodes in a durable local
//! ledger and reconciles it against a cloud provider.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 FleetScale CLI                   │
//! │          (provision / teardown / bench)          │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               fleetscale-cloud                   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Provisioner  │  │   Teardown   │            │
//! │  └──────┬───────┘  └──────┬───────┘            │
//! │  ┌──────▼─────────────────▼─────┐ ┌──────────┐ │
//! │  │         StateStore           │ │Inventory │ │
//! │  └──────────────────────────────┘ └──────────┘ │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │ CloudProvider │ │  Automation   │
//! │   (linode)    │ │   (engine)    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod action;
pub mod error;
pub mod fleet;
pub mod inventory;
pub mod provider;
pub mod provision;
pub mod state;
pub mod teardown;

#[cfg(test)]
mod testing;

// Re-exports
pub use action::{Action, ActionType, Plan, PlanSummary};
pub use error::{CloudError, PartialRun, Result, RunResult};
pub use fleet::FleetSpec;
pub use inventory::InventoryProjector;
pub use provider::{AuthStatus, CloudProvider, CreateOutcome, CreatedInstance, InstanceRequest};
pub use provision::{ProvisionReport, Provisioner};
pub use state::{ResourceRecord, StateStore};
pub use teardown::{Teardown, TeardownReport};

//! rds-share-common - Shared snapshot types and policy
//!
//! Everything here is independent of the AWS SDK so the naming and retention
//! rules can be exercised without credentials.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values and RDS constants
//! - [`naming`]: Deterministic snapshot names, copy names and ARNs
//! - [`retention`]: Retention window and expiry selection
//! - [`snapshot`]: Described-snapshot view shared by runner and pruning
//! - [`tags`]: Tag keys applied to snapshots created by the tool

pub mod defaults;
pub mod naming;
pub mod retention;
pub mod snapshot;
pub mod tags;

pub use naming::SnapshotPlan;
pub use retention::{RetentionWindow, select_expired};
pub use snapshot::SnapshotInfo;

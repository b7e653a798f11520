//! Device remediation engine for an Aruba Central fleet.
//!
//! A technician scans serial numbers; each scan drives one of two
//! workflows against Central:
//!
//! - **[`FirmwareEngine`]** checks presence, firmware visibility, group
//!   placement and compliance, moving devices into the target group or
//!   escalating stuck upgrades.
//! - **[`DecommissionEngine`]** deletes gateways or releases their license
//!   subscriptions.
//!
//! Both sit behind a [`ScanSession`], which owns the double-scan
//! confirmation protocol: the first scan of a serial is a status query,
//! an immediate repeat authorizes the mutating branch.
//!
//! Shared state lives in a [`Fleet`]: the authenticated Central client
//! and the [`InventoryCache`], a partitioned, atomically swapped snapshot
//! of every monitored device. Output leaves the engine as
//! [`StatusEvent`]s and optional [`audit`] entries; the crate has no
//! opinion on how either is presented.

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod fleet;
pub mod model;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use audit::{AuditField, AuditLayout, AuditLog, AuditSheet};
pub use config::{DecommissionPolicy, RemediationConfig};
pub use engine::{
    ComplianceTargets, CycleOutcome, DecommissionEngine, FirmwareEngine, Reporter, Scan, Workflow,
};
pub use error::CoreError;
pub use event::{ClientMessage, StatusColor, StatusEvent, StatusSink};
pub use fleet::Fleet;
pub use model::{Device, DeviceKind, DeviceStatus, FirmwareVersion, Partition, Serial};
pub use session::{ScanOptions, ScanSession, ScanState};
pub use store::InventoryCache;

// ── Domain model ──

pub mod device;
pub mod serial;

pub use device::{Device, DeviceKind, DeviceStatus, FirmwareVersion, Partition};
pub use serial::Serial;

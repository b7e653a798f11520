// ── Shared inventory storage ──

mod gate;
pub mod inventory;

pub use inventory::{InventoryCache, Subscription};

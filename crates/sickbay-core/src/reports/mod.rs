//! Read-only dashboard reports.

mod doses;
mod stock;

pub use doses::*;
pub use stock::*;

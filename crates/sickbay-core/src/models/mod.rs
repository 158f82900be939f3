//! Domain models for the sickbay system.

mod dose;
mod prescription;
mod stock;
mod student;

pub use dose::*;
pub use prescription::*;
pub use stock::*;
pub use student::*;

//! Pure analysis helpers used by the agents.
//!
//! Nothing in here performs I/O: payload repair and advisory derivation
//! operate on data the backends already returned.

pub mod advisory;
pub mod repair;

pub use advisory::{Advisory, AdvisoryThresholds, ForecastSlice};
pub use repair::{repair, repair_into, RepairError, Shape};

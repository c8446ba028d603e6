//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants, hostname parsing and in-process telemetry shared across the
//! engine, the registry and the API.

pub mod constants;
pub mod hostname;
pub mod telemetry;

pub use constants::*;
pub use hostname::*;
pub use telemetry::*;

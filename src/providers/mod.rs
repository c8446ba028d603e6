//! Providers Module - External Data Sources
//!
//! Remote BlinkGuard registry client.

pub mod registry_client;

pub use registry_client::*;

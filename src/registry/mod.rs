//! Registry Module - Community Malicious-URL Registry
//!
//! `store` owns the JSON file; `matcher` answers lookups against it.

pub mod matcher;
pub mod store;

pub use matcher::*;
pub use store::*;

//! Core Module - Safety Engine
//!
//! Balance interpretation, heuristic classifiers, scoring and the
//! orchestrating service. Everything here except the service is pure.

pub mod balance;
pub mod heuristics;
pub mod risk_score;
pub mod safety;

pub use balance::*;
pub use heuristics::*;
pub use risk_score::*;
pub use safety::*;

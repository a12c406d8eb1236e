//! Shared data model for the prizeflow analytics engine.
//!
//! Everything here is plain data: raw protocol events as they arrive from the
//! ingestion layer, balance snapshots, draw results and the per-chain dataset
//! that bundles them.

pub mod chain;
pub mod dataset;
pub mod error;
pub mod events;
pub mod holdings;

pub use chain::*;
pub use dataset::*;
pub use error::*;
pub use events::*;
pub use holdings::*;

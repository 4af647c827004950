//! ipveil Runtime - detection orchestration
//!
//! Wires the gathering layers and provider adapters into one engine:
//! cache lookup, concurrent evidence fan-out, evaluation, aggregation,
//! then cache and history writes. Also hosts the bulk job machinery.

pub mod bulk;
pub mod cache;
pub mod engine;
pub mod history;
pub mod ranges;

pub use bulk::*;
pub use cache::*;
pub use engine::*;
pub use history::*;
pub use ranges::*;

use thiserror::Error;

/// Errors from the cache and history stores. The engine recovers from all of
/// them locally; they surface only in logs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend unavailable: {0}")]
    Backend(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

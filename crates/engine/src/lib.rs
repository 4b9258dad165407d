//! `engine` crate: runs a node over a batch of input items.

pub mod error;
pub mod executor;

pub use error::EngineError;
pub use executor::{BatchExecutor, BatchResult, ExecutorConfig, OutputItem};

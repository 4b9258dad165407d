//! Engine-level error types.

use nodes::NodeError;
use thiserror::Error;

/// Errors produced by the batch executor.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An item failed while continue-on-fail was off; the remaining items
    /// were not processed.
    #[error("item {item_index} failed: {source}")]
    ItemFailed {
        item_index: usize,
        #[source]
        source: NodeError,
    },
}

impl EngineError {
    /// Index of the item that aborted the batch.
    pub fn item_index(&self) -> usize {
        match self {
            EngineError::ItemFailed { item_index, .. } => *item_index,
        }
    }

    /// The node error behind the failure.
    pub fn node_error(&self) -> &NodeError {
        match self {
            EngineError::ItemFailed { source, .. } => source,
        }
    }
}

//! Batch execution engine.
//!
//! `BatchExecutor` drives one node over a batch of input items:
//! 1. Items are processed strictly in order, one at a time.
//! 2. Each item is handed to the node via `ExecutableNode::execute`.
//! 3. Every payload the node returns becomes an output item paired with the
//!    input's index (a node may return none, one or many).
//! 4. A failing item either aborts the batch (fail-fast) or is recorded as an
//!    `{error, errorDetails}` output item (continue-on-fail).
//!
//! Nothing is retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use nodes::{ExecutableNode, ExecutionContext, NodeError};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the executor.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Turn item failures into error output items instead of aborting.
    pub continue_on_fail: bool,
}

// ---------------------------------------------------------------------------
// Output of a completed batch
// ---------------------------------------------------------------------------

/// One output record, paired with the input item that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputItem {
    pub json: Value,
    pub paired_item: usize,
}

impl OutputItem {
    /// Error record emitted in continue-on-fail mode.
    fn from_error(err: &NodeError, paired_item: usize) -> Self {
        Self {
            json: json!({
                "error": err.to_string(),
                "errorDetails": err.details(),
            }),
            paired_item,
        }
    }
}

/// The result of running a full batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub execution_id: Uuid,
    pub items: Vec<OutputItem>,
    /// Input items that failed (only non-zero with continue-on-fail).
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// BatchExecutor
// ---------------------------------------------------------------------------

/// Runs one node over a batch of input items.
pub struct BatchExecutor {
    node: Arc<dyn ExecutableNode>,
    config: ExecutorConfig,
}

impl BatchExecutor {
    pub fn new(node: Arc<dyn ExecutableNode>, config: ExecutorConfig) -> Self {
        Self { node, config }
    }

    /// Run every item through the node and collect the output items.
    ///
    /// # Errors
    /// With continue-on-fail off, returns [`EngineError::ItemFailed`] for the
    /// first failing item; later items are not executed.
    #[instrument(
        skip(self, items),
        fields(node = %self.node.description().name, items = items.len())
    )]
    pub async fn run(&self, items: Vec<Value>) -> Result<BatchResult, EngineError> {
        let execution_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut output = Vec::with_capacity(items.len());
        let mut failed = 0usize;

        info!("execution {} started", execution_id);

        for (item_index, input) in items.into_iter().enumerate() {
            let ctx = ExecutionContext {
                execution_id,
                item_index,
            };

            match self.node.execute(input, &ctx).await {
                Ok(payloads) => {
                    output.extend(payloads.into_iter().map(|json| OutputItem {
                        json,
                        paired_item: item_index,
                    }));
                }

                Err(err) if self.config.continue_on_fail => {
                    warn!("item {} failed, continuing: {}", item_index, err);
                    failed += 1;
                    output.push(OutputItem::from_error(&err, item_index));
                }

                Err(err) => {
                    match err.description() {
                        Some(description) => error!("item {} failed: {}", item_index, description),
                        None => error!("item {} failed: {}", item_index, err),
                    }
                    return Err(EngineError::ItemFailed {
                        item_index,
                        source: err,
                    });
                }
            }
        }

        info!(
            "execution {} finished: {} output items, {} failed inputs",
            execution_id,
            output.len(),
            failed
        );

        Ok(BatchResult {
            execution_id,
            items: output,
            failed,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

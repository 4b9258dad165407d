//! The `ExecutableNode` trait: the contract every node must fulfil.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::descriptor::NodeDescription;
use crate::NodeError;

/// Context passed to a node for each input item.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// ID of the batch run this item belongs to.
    pub execution_id: uuid::Uuid,
    /// Position of the item in the batch.
    pub item_index: usize,
}

/// One entry returned by a list-search method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSearchResult {
    /// Label shown to the user.
    pub name: String,
    /// Value stored in the resource locator when picked.
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The core node trait.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Declarative description of the node's fields.
    fn description(&self) -> &NodeDescription;

    /// Execute the node for one input item.
    ///
    /// `input` is the item's parameter bag. Returns the JSON payloads of the
    /// output items produced for it: usually one, possibly none or many.
    async fn execute(
        &self,
        input: Value,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Value>, NodeError>;

    /// Run a named list-search method backing a resource locator.
    async fn list_search(
        &self,
        method: &str,
        _filter: Option<&str>,
    ) -> Result<Vec<ListSearchResult>, NodeError> {
        Err(NodeError::UnknownSearchMethod(method.to_owned()))
    }
}

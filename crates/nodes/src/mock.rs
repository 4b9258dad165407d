//! `MockNode`: a test double for `ExecutableNode`.
//!
//! Useful in engine tests where the behaviour of a real node is irrelevant
//! and only the item-by-item outcome matters.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use client::ClientError;
use serde_json::{json, Value};

use crate::descriptor::NodeDescription;
use crate::traits::ExecutionContext;
use crate::{ExecutableNode, NodeError};

/// What the mock does for one call.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Emit the input back, tagged with the node name and item index.
    Echo,
    /// Emit these output payloads (possibly none).
    ReturnItems(Vec<Value>),
    /// Fail as if the API answered `status` with `body`.
    FailApi { status: u16, body: Value },
    /// Fail with a parameter error naming this parameter.
    FailMissing(String),
}

/// A mock node that records every input it receives and plays back a
/// programmer-specified script of behaviours, one per call.
pub struct MockNode {
    description: NodeDescription,
    script: Mutex<VecDeque<MockBehaviour>>,
    fallback: MockBehaviour,
    /// All inputs seen by this node (in call order).
    pub calls: Arc<Mutex<Vec<Value>>>,
}

impl MockNode {
    fn with_script(name: &str, script: Vec<MockBehaviour>, fallback: MockBehaviour) -> Self {
        Self {
            description: NodeDescription {
                name: name.to_owned(),
                display_name: name.to_owned(),
                description: "mock node".into(),
                version: 1,
                credentials: vec![],
                properties: vec![],
            },
            script: Mutex::new(script.into()),
            fallback,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A mock that echoes each input back as a single output item.
    pub fn echo(name: &str) -> Self {
        Self::with_script(name, vec![], MockBehaviour::Echo)
    }

    /// A mock that always emits the given payloads.
    pub fn returning(name: &str, items: Vec<Value>) -> Self {
        Self::with_script(name, vec![], MockBehaviour::ReturnItems(items))
    }

    /// A mock that plays `script` in order, then echoes.
    pub fn scripted(name: &str, script: Vec<MockBehaviour>) -> Self {
        Self::with_script(name, script, MockBehaviour::Echo)
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    fn description(&self) -> &NodeDescription {
        &self.description
    }

    async fn execute(&self, input: Value, ctx: &ExecutionContext) -> Result<Vec<Value>, NodeError> {
        self.calls.lock().unwrap().push(input.clone());

        let behaviour = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match behaviour {
            MockBehaviour::Echo => Ok(vec![json!({
                "node": self.description.name,
                "item": ctx.item_index,
                "input": input,
            })]),
            MockBehaviour::ReturnItems(items) => Ok(items),
            MockBehaviour::FailApi { status, body } => Err(NodeError::Api(ClientError::Status {
                status,
                reason: format!("mock failure {status}"),
                body: Some(body),
            })),
            MockBehaviour::FailMissing(name) => Err(NodeError::MissingParameter(name)),
        }
    }
}

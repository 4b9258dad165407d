//! Node-level error type.

use client::ClientError;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// None of them are retried. The engine either aborts the batch or turns the
/// error into an output item, depending on its continue-on-fail setting:
/// - parameter errors (`Unknown*`, `MissingParameter`, `InvalidParameter`)
///   are raised before any request is sent;
/// - `Api` wraps a failed call to the remote service.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The `resource` parameter names no resource this node handles.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// The `operation` parameter is not valid for the selected resource.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// A required parameter is absent or empty.
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// A parameter is present but fails its type, option or pattern check.
    #[error("invalid value for parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// The host asked for a list-search method the node does not provide.
    #[error("unknown list search method '{0}'")]
    UnknownSearchMethod(String),

    /// The remote API call failed.
    #[error(transparent)]
    Api(#[from] ClientError),
}

impl NodeError {
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        NodeError::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Response body of a failed API call, or `null`.
    pub fn details(&self) -> Value {
        match self {
            NodeError::Api(err) => err.details().cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Extra context shown alongside the message when the batch aborts.
    pub fn description(&self) -> Option<String> {
        match self {
            NodeError::Api(err) => Some(format!("Failed to call CloudCLI API: {err}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_errors_carry_details_and_description() {
        let err = NodeError::from(ClientError::Status {
            status: 404,
            reason: "Environment not found".into(),
            body: Some(json!({ "error": "Environment not found" })),
        });
        assert_eq!(err.details(), json!({ "error": "Environment not found" }));
        assert_eq!(
            err.description().unwrap(),
            "Failed to call CloudCLI API: request failed with status code 404: Environment not found"
        );
    }

    #[test]
    fn parameter_errors_have_no_details() {
        let err = NodeError::UnknownResource("database".into());
        assert_eq!(err.to_string(), "Unknown resource: database");
        assert_eq!(err.details(), Value::Null);
        assert!(err.description().is_none());
    }
}

//! `nodes` crate: the `ExecutableNode` trait and the Cloud CLI node.
//!
//! Every node must implement [`ExecutableNode`]. The engine crate dispatches
//! execution through this trait object, one input item at a time.

pub mod cloudcli;
pub mod descriptor;
pub mod error;
pub mod mock;
pub mod params;
pub mod traits;

pub use cloudcli::CloudCliNode;
pub use descriptor::{CredentialDescription, NodeDescription};
pub use error::NodeError;
pub use params::{Parameters, ResourceLocator};
pub use traits::{ExecutableNode, ExecutionContext, ListSearchResult};

#[cfg(test)]
mod cloudcli_tests;

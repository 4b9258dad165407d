//! Typed async client for the Cloud CLI REST API.
//!
//! Covers the credential test, the environment lifecycle endpoints and agent
//! execution. Responses are handed back as raw JSON so callers can relay them
//! untouched.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::CloudCliClient;
pub use config::{ClientConfig, Credentials, DEFAULT_AGENT_TIMEOUT, DEFAULT_HOST};
pub use error::ClientError;
pub use models::{
    AgentExecutionRequest, AgentProvider, CreateEnvironmentRequest, Environment,
    EnvironmentStatus,
};

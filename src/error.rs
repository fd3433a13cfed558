//! Unified error model for the client facade, the identity realm and the legacy
//! authorization bridge. Each variant carries a stable code string so transports can
//! map failures without matching on message text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification used by callers deciding whether a failure is retryable,
/// a misconfiguration or a security decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Permission,
    UnsupportedRequest,
    Execution,
    Security,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientError {
    #[error("no asynchronous executor available")]
    NoAsyncExecutor,
    /// The executor dropped the task before it ran, e.g. after its runtime shut down.
    #[error("asynchronous executor rejected the call")]
    ExecutorRejected,
    #[error("permission denied: {permission}")]
    PermissionDenied { permission: String },
    #[error("unsupported callback: {kind}")]
    UnsupportedCallback { kind: String },
    #[error("{code}: {message}")]
    Execution { code: String, message: String },
    #[error("security realm unavailable: {message}")]
    RealmUnavailable { message: String },
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },
    /// Only produced when a caller explicitly asks for a cancelled outcome as a `Result`.
    #[error("operation cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn code_str(&self) -> &str {
        match self {
            ClientError::NoAsyncExecutor => "no_async_executor",
            ClientError::ExecutorRejected => "executor_rejected",
            ClientError::PermissionDenied { .. } => "permission_denied",
            ClientError::UnsupportedCallback { .. } => "unsupported_callback",
            ClientError::Execution { code, .. } => code.as_str(),
            ClientError::RealmUnavailable { .. } => "realm_unavailable",
            ClientError::AuthenticationFailed { .. } => "authentication_failed",
            ClientError::Cancelled => "cancelled",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::NoAsyncExecutor | ClientError::ExecutorRejected => ErrorKind::Configuration,
            ClientError::PermissionDenied { .. } => ErrorKind::Permission,
            ClientError::UnsupportedCallback { .. } => ErrorKind::UnsupportedRequest,
            ClientError::Execution { .. } => ErrorKind::Execution,
            ClientError::RealmUnavailable { .. } | ClientError::AuthenticationFailed { .. } => ErrorKind::Security,
            ClientError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn execution<S: Into<String>>(code: S, msg: S) -> Self { ClientError::Execution { code: code.into(), message: msg.into() } }
    pub fn permission<S: Into<String>>(permission: S) -> Self { ClientError::PermissionDenied { permission: permission.into() } }
    pub fn unsupported_callback<S: Into<String>>(kind: S) -> Self { ClientError::UnsupportedCallback { kind: kind.into() } }
    pub fn realm_unavailable<S: Into<String>>(msg: S) -> Self { ClientError::RealmUnavailable { message: msg.into() } }
    pub fn authentication<S: Into<String>>(msg: S) -> Self { ClientError::AuthenticationFailed { message: msg.into() } }

    /// Whether a caller could reasonably try the same request again.
    /// Nothing in this layer retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::RealmUnavailable { .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as an execution failure unless classified elsewhere
        ClientError::Execution { code: "exec_error".into(), message: err.to_string() }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

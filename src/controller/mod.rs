//! The management controller contract consumed by the client facade, and the
//! operation/response documents that flow through it.
//! The controller itself lives outside this crate; only its interface is defined here.

mod operation;
mod response;

pub use operation::{InputStream, Operation, OperationAttachments};
pub use response::{
    CANCELLED, FAILED, FAILURE_DESCRIPTION, OUTCOME, Outcome, OperationResponse, RESULT, ResponseStream, SUCCESS,
};

use crate::error::ClientError;
use crate::identity::ExecutionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Warn,
    Error,
}

/// Receives progress messages emitted while an operation executes.
pub trait MessageHandler: Send + Sync {
    fn handle_report(&self, severity: MessageSeverity, message: &str);
}

/// Drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardMessageHandler;

impl MessageHandler for DiscardMessageHandler {
    fn handle_report(&self, _severity: MessageSeverity, _message: &str) {}
}

/// Forwards reports to the `modelgate::controller` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMessageHandler;

impl MessageHandler for TracingMessageHandler {
    fn handle_report(&self, severity: MessageSeverity, message: &str) {
        match severity {
            MessageSeverity::Info => tracing::info!(target: "modelgate::controller", "{}", message),
            MessageSeverity::Warn => tracing::warn!(target: "modelgate::controller", "{}", message),
            MessageSeverity::Error => tracing::error!(target: "modelgate::controller", "{}", message),
        }
    }
}

/// How the controller should settle the transaction once the operation has run.
/// Clients always commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionControl {
    Commit,
    Rollback,
}

/// Executes operations synchronously. Implementations may run arbitrarily long and
/// should poll [`ExecutionContext::is_interrupted`] if they want to honour cancellation.
pub trait ModelController: Send + Sync {
    fn execute(
        &self,
        ctx: &ExecutionContext,
        operation: Operation,
        handler: &dyn MessageHandler,
        control: TransactionControl,
    ) -> Result<OperationResponse, ClientError>;
}

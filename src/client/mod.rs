//! In-process clients for the management controller.
//!
//! A [`LocalClient`] executes synchronously on the caller's thread or hands the call to
//! a caller-supplied [`Executor`] and returns a cancellable [`ResponseFuture`]. A
//! [`SuperUserClient`] wraps it and runs every call inside the trusted boundary.
//! Both come from a [`ClientFactory`], which checks the access policy first.

mod executor;
mod future;
mod local;
mod elevated;
mod factory;

pub use executor::{Executor, Task, WorkerPool};
pub use future::{CallOutcome, FutureStatus, ResponseFuture};
pub use local::LocalClient;
pub use elevated::SuperUserClient;
pub use factory::{AccessPolicy, ClientFactory, DenyAll, Permission, PermitAll};

use std::sync::Arc;

use serde_json::Value;

use crate::controller::{MessageHandler, Operation, OperationResponse};
use crate::error::ClientResult;
use crate::identity::CallContext;

pub trait ModelControllerClient: Send + Sync {
    /// Executes on the calling thread and returns the controller's response or failure.
    fn execute_operation(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>) -> ClientResult<OperationResponse>;

    /// Executes on the worker pool; the future yields the response document with any
    /// streams already closed.
    fn execute_async(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>) -> ClientResult<ResponseFuture<Value>>;

    /// Executes on the worker pool; the future yields the full response, streams included.
    fn execute_operation_async(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>) -> ClientResult<ResponseFuture<OperationResponse>>;

    fn close(&self);
}

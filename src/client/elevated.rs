use std::sync::Arc;

use serde_json::Value;

use crate::controller::{MessageHandler, Operation, OperationResponse};
use crate::error::ClientResult;
use crate::identity::CallContext;

use super::future::ResponseFuture;
use super::local::LocalClient;
use super::ModelControllerClient;

/// Runs every call as if the caller were inside the trusted boundary. The elevation is
/// scoped to the call; the caller's own context is never changed.
#[derive(Clone)]
pub struct SuperUserClient {
    delegate: LocalClient,
}

impl SuperUserClient {
    pub(crate) fn new(delegate: LocalClient) -> Self { Self { delegate } }
}

impl ModelControllerClient for SuperUserClient {
    fn execute_operation(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>) -> ClientResult<OperationResponse> {
        ctx.run_in_vm(|ctx| self.delegate.execute_operation(ctx, operation, handler))
    }

    fn execute_async(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>) -> ClientResult<ResponseFuture<Value>> {
        ctx.run_in_vm(|ctx| self.delegate.execute_async(ctx, operation, handler))
    }

    fn execute_operation_async(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>) -> ClientResult<ResponseFuture<OperationResponse>> {
        ctx.run_in_vm(|ctx| self.delegate.execute_operation_async(ctx, operation, handler))
    }

    fn close(&self) {
        self.delegate.close();
    }
}

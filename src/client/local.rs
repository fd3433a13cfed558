use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::controller::{MessageHandler, ModelController, Operation, OperationResponse, TransactionControl};
use crate::error::{ClientError, ClientResult};
use crate::identity::{CallContext, ExecutionContext, IdentitySupplier, Interrupt};

use super::executor::Executor;
use super::future::{PendingCall, ResponseConverter, ResponseFuture, to_operation_response, to_response_node};
use super::ModelControllerClient;

/// Client that runs calls with the caller's own rights only.
#[derive(Clone)]
pub struct LocalClient {
    controller: Arc<dyn ModelController>,
    identities: Arc<dyn IdentitySupplier>,
    executor: Option<Arc<dyn Executor>>,
}

impl LocalClient {
    pub(crate) fn new(controller: Arc<dyn ModelController>, identities: Arc<dyn IdentitySupplier>, executor: Option<Arc<dyn Executor>>) -> Self {
        Self { controller, identities, executor }
    }

    fn submit<T>(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>, converter: ResponseConverter<T>) -> ClientResult<ResponseFuture<T>>
    where
        T: Clone + Send + 'static,
    {
        let Some(executor) = self.executor.as_ref() else {
            return Err(ClientError::NoAsyncExecutor);
        };

        let call = PendingCall::new(converter);
        // Both are captured on the calling thread and re-established on the worker.
        let identity = self.identities.current_identity();
        let in_vm = ctx.is_in_vm();
        let controller = self.controller.clone();
        let guard = DispatchGuard(call.clone());
        debug!(
            target: "modelgate::client",
            operation = operation.name().unwrap_or("<unnamed>"),
            user = identity.as_ref().map(|i| i.name()).unwrap_or("<anonymous>"),
            in_vm,
            "submitting asynchronous call"
        );

        executor.execute(Box::new(move || {
            let guard = guard;
            let task_call = &guard.0;
            let Some(interrupt) = task_call.claim() else {
                debug!(target: "modelgate::client", "call cancelled before dispatch");
                return;
            };
            let result = catch_unwind(AssertUnwindSafe(|| {
                ExecutionContext::run_as(identity, interrupt, |ec| {
                    let op = operation.request_copy();
                    if in_vm {
                        ec.run_in_vm(|ec| controller.execute(ec, op, handler.as_ref(), TransactionControl::Commit))
                    } else {
                        controller.execute(ec, op, handler.as_ref(), TransactionControl::Commit)
                    }
                })
            }))
            .unwrap_or_else(|panic| Err(ClientError::execution("panic".to_string(), panic_message(panic))));
            task_call.finish(result);
        }));
        Ok(ResponseFuture::new(call))
    }
}

/// Travels with the task. If the executor drops the task unrun, the call fails
/// instead of waiting forever.
struct DispatchGuard<T: Clone>(Arc<PendingCall<T>>);

impl<T: Clone> Drop for DispatchGuard<T> {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "controller panicked".to_string()
    }
}

impl ModelControllerClient for LocalClient {
    fn execute_operation(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>) -> ClientResult<OperationResponse> {
        let identity = self.identities.current_identity();
        ExecutionContext::run_as(identity, Interrupt::new(), |ec| {
            if ctx.is_in_vm() {
                ec.run_in_vm(|ec| self.controller.execute(ec, operation, handler.as_ref(), TransactionControl::Commit))
            } else {
                self.controller.execute(ec, operation, handler.as_ref(), TransactionControl::Commit)
            }
        })
    }

    fn execute_async(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>) -> ClientResult<ResponseFuture<Value>> {
        self.submit(ctx, operation, handler, to_response_node)
    }

    fn execute_operation_async(&self, ctx: &CallContext, operation: Operation, handler: Arc<dyn MessageHandler>) -> ClientResult<ResponseFuture<OperationResponse>> {
        self.submit(ctx, operation, handler, to_operation_response)
    }

    fn close(&self) {}
}

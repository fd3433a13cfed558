//! Client facade integration tests: synchronous and asynchronous call shapes, identity
//! and trusted-boundary propagation, cancellation and client construction.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use serde_json::{Value, json};

use modelgate::client::Task;
use modelgate::controller::{
    DiscardMessageHandler, MessageHandler, ModelController, Operation, OperationAttachments, OperationResponse, InputStream,
    TransactionControl,
};
use modelgate::identity::{CallContext, ExecutionContext, Identity, IdentitySupplier, Principal, SharedIdentitySupplier};
use modelgate::{
    CallOutcome, ClientConfig, ClientError, ClientFactory, DenyAll, Executor, FutureStatus, ModelControllerClient, WorkerPool,
};

#[derive(Debug, Clone, PartialEq)]
struct Seen {
    user: Option<String>,
    in_vm: bool,
    streams: usize,
    thread: std::thread::ThreadId,
}

#[derive(Default)]
struct RecordingController {
    seen: Mutex<Vec<Seen>>,
    calls: AtomicUsize,
}

impl ModelController for RecordingController {
    fn execute(&self, ctx: &ExecutionContext, operation: Operation, _h: &dyn MessageHandler, control: TransactionControl) -> Result<OperationResponse, ClientError> {
        assert_eq!(control, TransactionControl::Commit);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(Seen {
            user: ctx.identity().map(|i| i.name().to_string()),
            in_vm: ctx.is_in_vm(),
            streams: operation.input_streams().len(),
            thread: std::thread::current().id(),
        });
        Ok(OperationResponse::success(operation.node().clone()))
    }
}

/// Controller whose response is chosen by the test.
struct ScriptedController(fn() -> Result<OperationResponse, ClientError>);

impl ModelController for ScriptedController {
    fn execute(&self, _ctx: &ExecutionContext, _op: Operation, _h: &dyn MessageHandler, _c: TransactionControl) -> Result<OperationResponse, ClientError> {
        (self.0)()
    }
}

/// Runs until interrupted, then reports success anyway.
struct StubbornController {
    started: AtomicUsize,
}

impl ModelController for StubbornController {
    fn execute(&self, ctx: &ExecutionContext, _op: Operation, _h: &dyn MessageHandler, _c: TransactionControl) -> Result<OperationResponse, ClientError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        while !ctx.is_interrupted() {
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok(OperationResponse::success(json!("finished anyway")))
    }
}

/// Holds tasks until the test runs them.
#[derive(Default)]
struct ManualExecutor {
    queued: Mutex<Vec<Task>>,
}

impl ManualExecutor {
    fn run_all(&self) {
        let tasks: Vec<Task> = std::mem::take(&mut *self.queued.lock());
        for t in tasks {
            t();
        }
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, task: Task) {
        self.queued.lock().push(task);
    }
}

/// Accepts nothing: every task is dropped unrun.
struct DroppingExecutor;

impl Executor for DroppingExecutor {
    fn execute(&self, task: Task) {
        drop(task);
    }
}

fn fails_with_boom() -> Result<OperationResponse, ClientError> {
    Err(ClientError::execution("op_failed", "boom"))
}

fn fails_with_nope() -> Result<OperationResponse, ClientError> {
    Err(ClientError::execution("op_failed", "nope"))
}

fn reports_cancelled() -> Result<OperationResponse, ClientError> {
    Ok(OperationResponse::cancelled())
}

fn explodes() -> Result<OperationResponse, ClientError> {
    panic!("controller exploded")
}

fn dynamic(exec: &Arc<ManualExecutor>) -> Option<Arc<dyn Executor>> {
    let exec: Arc<dyn Executor> = exec.clone();
    Some(exec)
}

fn alice() -> Identity {
    Identity::new(Principal::new("alice")).with_roles(["operator"])
}

fn supplier_for(identity: Identity) -> Arc<dyn IdentitySupplier> {
    let s = SharedIdentitySupplier::new();
    s.establish(identity);
    Arc::new(s)
}

fn handler() -> Arc<dyn MessageHandler> {
    Arc::new(DiscardMessageHandler)
}

fn op(name: &str) -> Operation {
    Operation::new(json!({ "operation": name }))
}

#[test]
fn synchronous_call_runs_inline_with_identity() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let factory = ClientFactory::new(controller.clone(), supplier_for(alice()));
    let client = factory.create_client(None)?;

    let resp = client.execute_operation(&CallContext::external(), op("read-resource"), handler())?;
    assert_eq!(resp.response_node()["result"]["operation"], "read-resource");

    let seen = controller.seen.lock().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].user.as_deref(), Some("alice"));
    assert!(!seen[0].in_vm);
    assert_eq!(seen[0].thread, std::thread::current().id());
    Ok(())
}

#[test]
fn synchronous_failure_surfaces_directly() -> Result<()> {
    let factory = ClientFactory::new(
        Arc::new(ScriptedController(fails_with_boom)),
        supplier_for(alice()),
    );
    let client = factory.create_client(None)?;
    let err = client.execute_operation(&CallContext::external(), op("x"), handler()).unwrap_err();
    assert_eq!(err, ClientError::execution("op_failed", "boom"));
    Ok(())
}

#[test]
fn async_call_without_executor_is_a_configuration_error() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let client = ClientFactory::new(controller.clone(), supplier_for(alice())).create_client(None)?;
    let err = client.execute_async(&CallContext::external(), op("x"), handler()).unwrap_err();
    assert_eq!(err, ClientError::NoAsyncExecutor);
    let err = client.execute_operation_async(&CallContext::external(), op("x"), handler()).unwrap_err();
    assert_eq!(err, ClientError::NoAsyncExecutor);
    assert_eq!(controller.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn async_call_completes_on_worker_with_document() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let pool: Arc<dyn Executor> = Arc::new(WorkerPool::new(2, "client-test")?);
    let client = ClientFactory::new(controller.clone(), supplier_for(alice())).create_client(Some(pool))?;

    let fut = client.execute_async(&CallContext::external(), op("read-resource"), handler())?;
    let doc = fut.get().into_result()?;
    assert_eq!(doc, json!({"outcome": "success", "result": {"operation": "read-resource"}}));

    let seen = controller.seen.lock().clone();
    assert_eq!(seen[0].user.as_deref(), Some("alice"));
    assert_ne!(seen[0].thread, std::thread::current().id());
    Ok(())
}

#[test]
fn full_response_call_carries_attachments_to_controller() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let exec = Arc::new(ManualExecutor::default());
    let client = ClientFactory::new(controller.clone(), supplier_for(alice())).create_client(dynamic(&exec))?;

    let operation = Operation::with_attachments(
        json!({"operation": "deploy"}),
        OperationAttachments::new(vec![InputStream::new(b"war".to_vec()), InputStream::new(b"cfg".to_vec())], true),
    );
    let fut = client.execute_operation_async(&CallContext::external(), operation, handler())?;
    exec.run_all();
    match fut.get() {
        CallOutcome::Completed(resp) => assert_eq!(resp.response_node()["outcome"], "success"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(controller.seen.lock()[0].streams, 2);
    Ok(())
}

#[test]
fn identity_is_captured_at_dispatch() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let supplier = SharedIdentitySupplier::new();
    supplier.establish(alice());
    let exec = Arc::new(ManualExecutor::default());
    let client = ClientFactory::new(controller.clone(), Arc::new(supplier.clone())).create_client(dynamic(&exec))?;

    let fut = client.execute_async(&CallContext::external(), op("x"), handler())?;
    supplier.establish(Identity::new(Principal::new("mallory")));
    exec.run_all();
    assert_eq!(fut.get().status(), FutureStatus::Complete);
    assert_eq!(controller.seen.lock()[0].user.as_deref(), Some("alice"));
    Ok(())
}

#[test]
fn trusted_boundary_marker_follows_the_caller_not_the_worker() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let exec = Arc::new(ManualExecutor::default());
    let client = ClientFactory::new(controller.clone(), supplier_for(alice())).create_client(dynamic(&exec))?;

    let outside = client.execute_async(&CallContext::external(), op("a"), handler())?;
    let inside = client.execute_async(&CallContext::trusted(), op("b"), handler())?;
    exec.run_all();
    outside.get();
    inside.get();

    let seen = controller.seen.lock().clone();
    assert!(!seen[0].in_vm);
    assert!(seen[1].in_vm);
    Ok(())
}

#[test]
fn super_user_client_runs_every_shape_in_vm() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let exec = Arc::new(ManualExecutor::default());
    let client = ClientFactory::new(controller.clone(), supplier_for(alice())).create_super_user_client(dynamic(&exec))?;
    let ctx = CallContext::external();

    client.execute_operation(&ctx, op("sync"), handler())?;
    let a = client.execute_async(&ctx, op("doc"), handler())?;
    let b = client.execute_operation_async(&ctx, op("full"), handler())?;
    assert!(!ctx.is_in_vm());
    exec.run_all();
    a.get();
    b.get();

    let seen = controller.seen.lock().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|s| s.in_vm));
    assert!(seen.iter().all(|s| s.user.as_deref() == Some("alice")));
    assert!(!ctx.is_in_vm());
    client.close();
    Ok(())
}

#[test]
fn super_user_failures_are_not_rewrapped() -> Result<()> {
    let factory = ClientFactory::new(
        Arc::new(ScriptedController(fails_with_nope)),
        supplier_for(alice()),
    );
    let client = factory.create_super_user_client(None)?;
    let ctx = CallContext::external();
    let err = client.execute_operation(&ctx, op("x"), handler()).unwrap_err();
    assert_eq!(err, ClientError::execution("op_failed", "nope"));
    assert!(!ctx.is_in_vm());
    Ok(())
}

#[test]
fn denied_permission_blocks_both_constructors() {
    let factory = ClientFactory::new(Arc::new(RecordingController::default()), supplier_for(alice()))
        .with_access_policy(Arc::new(DenyAll));
    let err = factory.create_client(None).err().expect("denied");
    assert_eq!(err, ClientError::permission("modelgate.controller.access"));
    assert!(matches!(factory.create_super_user_client(None), Err(ClientError::PermissionDenied { .. })));
}

#[test]
fn policy_is_skipped_when_enforcement_is_off() {
    let mut cfg = ClientConfig::default();
    cfg.enforce_access_permission = false;
    let factory = ClientFactory::new(Arc::new(RecordingController::default()), supplier_for(alice()))
        .with_access_policy(Arc::new(DenyAll))
        .with_config(&cfg);
    assert!(factory.create_client(None).is_ok());
}

#[test]
fn cancel_before_dispatch_never_reaches_controller() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let exec = Arc::new(ManualExecutor::default());
    let client = ClientFactory::new(controller.clone(), supplier_for(alice())).create_client(dynamic(&exec))?;

    let fut = client.execute_async(&CallContext::external(), op("x"), handler())?;
    assert!(fut.cancel(true));
    exec.run_all();
    assert_eq!(fut.get(), CallOutcome::Cancelled);
    assert_eq!(controller.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn cancelled_outcome_from_controller_cancels_future() -> Result<()> {
    let exec = Arc::new(ManualExecutor::default());
    let client = ClientFactory::new(Arc::new(ScriptedController(reports_cancelled)), supplier_for(alice()))
        .create_client(dynamic(&exec))?;
    let fut = client.execute_async(&CallContext::external(), op("x"), handler())?;
    exec.run_all();
    assert_eq!(fut.status(), FutureStatus::Cancelled);
    assert_eq!(fut.get().into_result(), Err(ClientError::Cancelled));
    Ok(())
}

#[test]
fn controller_error_and_panic_fail_the_future() -> Result<()> {
    let exec = Arc::new(ManualExecutor::default());
    let failing = ClientFactory::new(
        Arc::new(ScriptedController(fails_with_boom)),
        supplier_for(alice()),
    )
    .create_client(dynamic(&exec))?;
    let panicking = ClientFactory::new(Arc::new(ScriptedController(explodes)), supplier_for(alice()))
        .create_client(dynamic(&exec))?;

    let a = failing.execute_async(&CallContext::external(), op("x"), handler())?;
    let b = panicking.execute_async(&CallContext::external(), op("y"), handler())?;
    exec.run_all();

    assert_eq!(a.get(), CallOutcome::Failed(ClientError::execution("op_failed", "boom")));
    match b.get() {
        CallOutcome::Failed(e) => {
            assert_eq!(e.code_str(), "panic");
            assert!(e.to_string().contains("controller exploded"));
        }
        other => panic!("unexpected {:?}", other),
    }
    // a finished call can no longer be cancelled
    assert!(!a.cancel(false));
    assert_eq!(a.status(), FutureStatus::Failed);
    Ok(())
}

#[test]
fn dropped_task_fails_the_future_instead_of_hanging() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let client = ClientFactory::new(controller.clone(), supplier_for(alice()))
        .create_client(Some(Arc::new(DroppingExecutor) as Arc<dyn Executor>))?;

    let doc = client.execute_async(&CallContext::external(), op("x"), handler())?;
    let full = client.execute_operation_async(&CallContext::external(), op("y"), handler())?;
    assert_eq!(doc.wait_timeout(Duration::from_secs(5)), FutureStatus::Failed);
    assert_eq!(doc.get().into_result(), Err(ClientError::ExecutorRejected));
    assert_eq!(full.get().into_result().unwrap_err().code_str(), "executor_rejected");
    assert_eq!(controller.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn queued_tasks_dropped_with_their_executor_fail() -> Result<()> {
    let exec = Arc::new(ManualExecutor::default());
    let client = ClientFactory::new(Arc::new(RecordingController::default()), supplier_for(alice()))
        .create_client(dynamic(&exec))?;
    let fut = client.execute_async(&CallContext::external(), op("x"), handler())?;
    let cancelled = client.execute_async(&CallContext::external(), op("y"), handler())?;
    assert!(cancelled.cancel(false));
    assert_eq!(fut.status(), FutureStatus::Waiting);

    exec.queued.lock().clear();
    assert_eq!(fut.get(), CallOutcome::Failed(ClientError::ExecutorRejected));
    assert_eq!(cancelled.get(), CallOutcome::Cancelled);
    Ok(())
}

#[test]
fn handle_of_shut_down_runtime_fails_the_future() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let exec: Arc<dyn Executor> = Arc::new(runtime.handle().clone());
    drop(runtime);
    let client = ClientFactory::new(Arc::new(RecordingController::default()), supplier_for(alice())).create_client(Some(exec))?;

    let fut = client.execute_async(&CallContext::external(), op("x"), handler())?;
    assert_eq!(fut.wait_timeout(Duration::from_secs(5)), FutureStatus::Failed);
    assert_eq!(fut.get().into_result(), Err(ClientError::ExecutorRejected));
    Ok(())
}

#[test]
fn cancel_interrupts_running_call_and_waits_for_it() -> Result<()> {
    let controller = Arc::new(StubbornController { started: AtomicUsize::new(0) });
    let pool = Arc::new(WorkerPool::new(2, "cancel-test")?);
    let client = ClientFactory::new(controller.clone(), supplier_for(alice())).create_client(Some(pool.clone() as Arc<dyn Executor>))?;

    let fut = client.execute_async(&CallContext::external(), op("long-running"), handler())?;
    while controller.started.load(Ordering::SeqCst) == 0 {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(fut.cancel(true));
    assert_eq!(fut.get(), CallOutcome::Cancelled);
    Ok(())
}

#[tokio::test]
async fn future_can_be_awaited() -> Result<()> {
    let controller = Arc::new(RecordingController::default());
    let exec: Arc<dyn Executor> = Arc::new(tokio::runtime::Handle::current());
    let client = ClientFactory::new(controller.clone(), supplier_for(alice())).create_client(Some(exec))?;

    let doc: Value = client.execute_async(&CallContext::external(), op("read"), handler())?.await.into_result()?;
    assert_eq!(doc["outcome"], "success");
    Ok(())
}

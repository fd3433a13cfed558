use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use modelgate::controller::{
    MessageHandler, MessageSeverity, ModelController, Operation, OperationResponse, TracingMessageHandler, TransactionControl,
};
use modelgate::identity::{AnonymousSupplier, CallContext, ExecutionContext};
use modelgate::{ClientConfig, ClientError, ClientFactory, Executor, ModelControllerClient, WorkerPool};

/// Answers every operation with the request it was given and the context it ran in.
struct EchoController;

impl ModelController for EchoController {
    fn execute(
        &self,
        ctx: &ExecutionContext,
        operation: Operation,
        handler: &dyn MessageHandler,
        _control: TransactionControl,
    ) -> Result<OperationResponse, ClientError> {
        handler.handle_report(MessageSeverity::Info, &format!("executing {}", operation.name().unwrap_or("<unnamed>")));
        Ok(OperationResponse::success(serde_json::json!({
            "request": operation.node(),
            "request-id": ctx.request_id(),
            "in-vm": ctx.is_in_vm(),
            "user": ctx.identity().map(|i| i.name().to_string()),
        })))
    }
}

fn main() -> Result<()> {
    let config = ClientConfig::from_env();

    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let mut super_user = false;
    let mut raw: Option<String> = None;
    for a in args.by_ref() {
        match a.as_str() {
            "--super-user" => super_user = true,
            _ => raw = Some(a),
        }
    }
    let raw = raw.ok_or_else(|| anyhow!("usage: modelgate [--super-user] '<operation json>'"))?;
    let node: Value = serde_json::from_str(&raw).context("operation is not valid JSON")?;

    info!(
        target: "modelgate",
        "modelgate starting: workers={}, thread_name='{}', super_user={}",
        config.worker_threads, config.worker_thread_name, super_user
    );

    let pool = Arc::new(WorkerPool::from_config(&config)?);
    let executor: Arc<dyn Executor> = pool.clone();
    let factory = ClientFactory::new(Arc::new(EchoController), Arc::new(AnonymousSupplier)).with_config(&config);
    let client: Box<dyn ModelControllerClient> = if super_user {
        Box::new(factory.create_super_user_client(Some(executor))?)
    } else {
        Box::new(factory.create_client(Some(executor))?)
    };

    let future = client.execute_async(&CallContext::external(), Operation::new(node), Arc::new(TracingMessageHandler))?;
    let response = future.get().into_result()?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    client.close();
    drop(client);

    if let Ok(pool) = Arc::try_unwrap(pool) {
        pool.shutdown_timeout(Duration::from_secs(5));
    }
    Ok(())
}

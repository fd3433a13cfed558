use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::ClientConfig;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Where asynchronous calls run. Supplied by the caller; the client never creates
/// threads of its own. An executor that cannot run a task may drop it; the call then
/// fails with [`ClientError::ExecutorRejected`](crate::ClientError::ExecutorRejected).
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

/// Runs tasks on the runtime's blocking pool, since controller calls block. Once the
/// runtime has shut down, tasks are dropped unrun.
impl Executor for Handle {
    fn execute(&self, task: Task) {
        drop(self.spawn_blocking(task));
    }
}

/// A dedicated tokio runtime whose blocking pool executes controller calls.
pub struct WorkerPool {
    runtime: Runtime,
}

impl WorkerPool {
    pub fn new(worker_threads: usize, thread_name: &str) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(worker_threads.max(1))
            .thread_name(thread_name)
            .enable_all()
            .build()
            .with_context(|| format!("building worker pool '{}'", thread_name))?;
        Ok(Self { runtime })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.worker_threads, &config.worker_thread_name)
    }

    pub fn handle(&self) -> Handle { self.runtime.handle().clone() }

    /// Stop accepting work; tasks still running after `timeout` are abandoned.
    pub fn shutdown_timeout(self, timeout: Duration) {
        self.runtime.shutdown_timeout(timeout);
    }
}

impl Executor for WorkerPool {
    fn execute(&self, task: Task) {
        drop(self.runtime.spawn_blocking(task));
    }
}

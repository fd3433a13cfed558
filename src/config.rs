use serde::{Deserialize, Serialize};

pub const ENV_WORKER_THREADS: &str = "MODELGATE_WORKER_THREADS";
pub const ENV_WORKER_THREAD_NAME: &str = "MODELGATE_WORKER_THREAD_NAME";
pub const ENV_LOG: &str = "MODELGATE_LOG";
pub const ENV_ENFORCE_ACCESS: &str = "MODELGATE_ENFORCE_ACCESS";

/// Settings for the worker pool, logging and the client factory's permission check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound on concurrently executing asynchronous calls.
    pub worker_threads: usize,
    pub worker_thread_name: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Consult the installed access policy when clients are created.
    pub enforce_access_permission: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            worker_threads: 8,
            worker_thread_name: "modelgate-worker".to_string(),
            log_filter: "info".to_string(),
            enforce_access_permission: true,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `MODELGATE_*` variables. Unparseable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut cfg = Self::default();
        if let Some(n) = lookup(ENV_WORKER_THREADS).and_then(|v| v.trim().parse::<usize>().ok()) {
            if n > 0 { cfg.worker_threads = n; }
        }
        if let Some(name) = lookup(ENV_WORKER_THREAD_NAME).filter(|v| !v.trim().is_empty()) {
            cfg.worker_thread_name = name;
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            cfg.log_filter = filter;
        }
        if let Some(b) = lookup(ENV_ENFORCE_ACCESS).and_then(|v| parse_bool(&v)) {
            cfg.enforce_access_permission = b;
        }
        cfg
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

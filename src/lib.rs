pub mod error;
pub mod config;
pub mod controller;
pub mod identity;
pub mod client;

pub use client::{
    AccessPolicy, CallOutcome, ClientFactory, DenyAll, Executor, FutureStatus, LocalClient, ModelControllerClient, Permission,
    PermitAll, ResponseFuture, SuperUserClient, WorkerPool,
};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorKind};

// Test-only printing helper: expands to eprintln! during tests and debug builds and is absent otherwise.
// Usage in tests: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}

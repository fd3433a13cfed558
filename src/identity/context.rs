//! Explicit execution contexts. Neither the caller's trusted-boundary marker nor the
//! propagated identity lives in thread-local or process state; both travel as values
//! so the hand-off onto a worker thread is visible at every call site.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use super::principal::Identity;

/// What the caller tells the client about where it is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    in_vm: bool,
}

impl CallContext {
    /// A caller outside the trusted boundary.
    pub fn external() -> Self { Self { in_vm: false } }

    /// A caller already inside the trusted boundary.
    pub fn trusted() -> Self { Self { in_vm: true } }

    pub fn is_in_vm(&self) -> bool { self.in_vm }

    /// Run `action` with an in-VM copy of this context. `self` is not modified, so the
    /// marker reverts as soon as `action` returns, whatever it returns.
    pub fn run_in_vm<R>(&self, action: impl FnOnce(&CallContext) -> R) -> R {
        let elevated = CallContext { in_vm: true };
        action(&elevated)
    }
}

/// Cooperative interruption flag shared between a worker and whoever cancels it.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self { Self::default() }

    pub fn raise(&self) { self.0.store(true, Ordering::SeqCst); }

    pub fn is_raised(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

/// The context a controller sees while executing one operation.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    identity: Option<Identity>,
    in_vm: bool,
    interrupt: Interrupt,
    request_id: String,
}

impl ExecutionContext {
    /// Run `action` as `identity`, outside the trusted boundary.
    pub fn run_as<R>(identity: Option<Identity>, interrupt: Interrupt, action: impl FnOnce(&ExecutionContext) -> R) -> R {
        let ctx = ExecutionContext {
            identity,
            in_vm: false,
            interrupt,
            request_id: Uuid::new_v4().to_string(),
        };
        action(&ctx)
    }

    /// Run `action` with the trusted-boundary marker set. Whatever `action` returns is
    /// handed back untouched.
    pub fn run_in_vm<R>(&self, action: impl FnOnce(&ExecutionContext) -> R) -> R {
        let elevated = ExecutionContext { in_vm: true, ..self.clone() };
        action(&elevated)
    }

    pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }

    pub fn is_in_vm(&self) -> bool { self.in_vm }

    pub fn is_interrupted(&self) -> bool { self.interrupt.is_raised() }

    pub fn request_id(&self) -> &str { &self.request_id }
}

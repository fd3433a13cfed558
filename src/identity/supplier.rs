use std::sync::Arc;

use parking_lot::RwLock;

use super::principal::Identity;

/// Returns the identity established for the current caller. Called once per dispatch
/// and expected to be side-effect free.
pub trait IdentitySupplier: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
}

impl<F> IdentitySupplier for F
where
    F: Fn() -> Option<Identity> + Send + Sync,
{
    fn current_identity(&self) -> Option<Identity> { self() }
}

/// Supplier for callers that have not authenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSupplier;

impl IdentitySupplier for AnonymousSupplier {
    fn current_identity(&self) -> Option<Identity> { None }
}

/// Holds whatever identity the connection authenticator last established.
#[derive(Debug, Clone, Default)]
pub struct SharedIdentitySupplier {
    current: Arc<RwLock<Option<Identity>>>,
}

impl SharedIdentitySupplier {
    pub fn new() -> Self { Self::default() }

    pub fn establish(&self, identity: Identity) {
        *self.current.write() = Some(identity);
    }

    pub fn clear(&self) -> Option<Identity> {
        self.current.write().take()
    }
}

impl IdentitySupplier for SharedIdentitySupplier {
    fn current_identity(&self) -> Option<Identity> {
        self.current.read().clone()
    }
}

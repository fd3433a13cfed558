use std::sync::Arc;

use tracing::warn;

use crate::config::ClientConfig;
use crate::controller::ModelController;
use crate::error::{ClientError, ClientResult};
use crate::identity::IdentitySupplier;

use super::elevated::SuperUserClient;
use super::executor::Executor;
use super::local::LocalClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Needed to obtain any in-process controller client.
    ControllerAccess,
}

impl Permission {
    pub fn name(&self) -> &'static str {
        match self {
            Permission::ControllerAccess => "modelgate.controller.access",
        }
    }
}

/// The embedding environment's permission check.
pub trait AccessPolicy: Send + Sync {
    fn check_permission(&self, permission: Permission) -> ClientResult<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAll;

impl AccessPolicy for PermitAll {
    fn check_permission(&self, _permission: Permission) -> ClientResult<()> { Ok(()) }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl AccessPolicy for DenyAll {
    fn check_permission(&self, permission: Permission) -> ClientResult<()> {
        Err(ClientError::permission(permission.name()))
    }
}

/// Builds in-process clients for one controller.
pub struct ClientFactory {
    controller: Arc<dyn ModelController>,
    identities: Arc<dyn IdentitySupplier>,
    policy: Arc<dyn AccessPolicy>,
    enforce: bool,
}

impl ClientFactory {
    pub fn new(controller: Arc<dyn ModelController>, identities: Arc<dyn IdentitySupplier>) -> Self {
        Self { controller, identities, policy: Arc::new(PermitAll), enforce: true }
    }

    pub fn with_access_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.enforce = config.enforce_access_permission;
        self
    }

    /// A client limited to the rights of the caller's propagated identity.
    pub fn create_client(&self, executor: Option<Arc<dyn Executor>>) -> ClientResult<LocalClient> {
        self.create_local_client(executor)
    }

    /// A client whose every call runs inside the trusted boundary.
    pub fn create_super_user_client(&self, executor: Option<Arc<dyn Executor>>) -> ClientResult<SuperUserClient> {
        Ok(SuperUserClient::new(self.create_local_client(executor)?))
    }

    fn create_local_client(&self, executor: Option<Arc<dyn Executor>>) -> ClientResult<LocalClient> {
        if self.enforce {
            if let Err(e) = self.policy.check_permission(Permission::ControllerAccess) {
                warn!(target: "modelgate::security", error = %e, "client creation denied");
                return Err(e);
            }
        }
        Ok(LocalClient::new(self.controller.clone(), self.identities.clone(), executor))
    }
}

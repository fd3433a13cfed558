use std::sync::Arc;

use crate::error::{ClientError, ClientResult};
use crate::tprintln;

use super::callback::{AuthMechanism, AuthorizeCallback, Callback, CallbackHandler, ClientCertCallbackHandler};
use super::evidence::Evidence;
use super::principal::{Attrs, Identity};
use super::realm::{IdentityLocator, SecurityRealm};
use super::supplier::SharedIdentitySupplier;

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub evidence: Evidence,
    /// Identity the caller wants to act as; `None` means itself.
    pub authorization_id: Option<String>,
    pub ip: Option<String>,
}

impl LoginRequest {
    pub fn new(evidence: Evidence) -> Self {
        Self { evidence, authorization_id: None, ip: None }
    }
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub identity: Identity,
}

/// Connection-level authentication, run once before any operation is accepted.
pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> ClientResult<LoginResponse>;
}

/// Authenticates presented evidence against a realm and, when the caller asks to act
/// as someone, runs the legacy authorize callback.
pub struct EvidenceAuthProvider {
    realm_name: String,
    mechanism: AuthMechanism,
    realm: Arc<dyn SecurityRealm>,
    callbacks: Arc<dyn CallbackHandler>,
    established: Option<SharedIdentitySupplier>,
}

impl EvidenceAuthProvider {
    pub fn new(realm_name: impl Into<String>, mechanism: AuthMechanism, realm: Arc<dyn SecurityRealm>, callbacks: Arc<dyn CallbackHandler>) -> Self {
        Self { realm_name: realm_name.into(), mechanism, realm, callbacks, established: None }
    }

    /// Client-certificate realm with its matching callback handler.
    pub fn client_cert(realm_name: impl Into<String>) -> Self {
        let handler = ClientCertCallbackHandler::new();
        let realm: Arc<dyn SecurityRealm> = Arc::new(handler.security_realm());
        Self::new(realm_name, handler.preferred_mechanism(), realm, Arc::new(handler))
    }

    /// Record every successful login in `supplier`, where the client facade reads it.
    pub fn establish_into(mut self, supplier: SharedIdentitySupplier) -> Self {
        self.established = Some(supplier);
        self
    }

    fn authorize(&self, authentication_id: &str, authorization_id: &str) -> ClientResult<bool> {
        let mut cbs = [Callback::Authorize(AuthorizeCallback::new(authentication_id, authorization_id))];
        self.callbacks.handle(&mut cbs)?;
        Ok(matches!(&cbs[0], Callback::Authorize(acb) if acb.is_authorized()))
    }
}

impl AuthProvider for EvidenceAuthProvider {
    fn login(&self, req: &LoginRequest) -> ClientResult<LoginResponse> {
        let evidence_type = req.evidence.evidence_type();
        if !self.realm.evidence_verify_support(evidence_type, None)?.may_be_supported() {
            return Err(ClientError::authentication(format!("evidence {:?} not supported by realm '{}'", evidence_type, self.realm_name)));
        }
        let realm_identity = self.realm.realm_identity(&IdentityLocator::from_evidence(req.evidence.clone()))?;
        if !realm_identity.exists()? {
            return Err(ClientError::authentication("identity does not exist"));
        }
        if !realm_identity.verify_evidence(&req.evidence)? {
            return Err(ClientError::authentication("evidence verification failed"));
        }
        let Some(principal) = realm_identity.principal().cloned() else {
            return Err(ClientError::authentication("realm identity has no principal"));
        };
        if let Some(authz) = req.authorization_id.as_deref() {
            if !self.authorize(&principal.name, authz)? {
                return Err(ClientError::authentication(format!("'{}' may not act as '{}'", principal.name, authz)));
            }
        }

        let identity = Identity {
            principal,
            roles: Vec::new(),
            attrs: Attrs {
                realm: Some(self.realm_name.clone()),
                mechanism: Some(self.mechanism.as_str().to_string()),
                ip: req.ip.clone(),
            },
        };
        tracing::debug!(target: "modelgate::security", user = %identity.principal, realm = %self.realm_name, "login succeeded");
        tprintln!("auth.login user={} realm={}", identity.principal, self.realm_name);
        if let Some(s) = &self.established {
            s.establish(identity.clone());
        }
        Ok(LoginResponse { identity })
    }
}

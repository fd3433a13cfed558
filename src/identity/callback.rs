//! Legacy callback-style authorization for transports that still negotiate
//! authenticationID/authorizationID pairs.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

use super::realm::ClientCertRealm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthMechanism {
    ClientCert,
    Digest,
    Plain,
    Local,
}

impl AuthMechanism {
    /// Wire name, matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMechanism::ClientCert => "CLIENT_CERT",
            AuthMechanism::Digest => "DIGEST",
            AuthMechanism::Plain => "PLAIN",
            AuthMechanism::Local => "LOCAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeCallback {
    authentication_id: String,
    authorization_id: String,
    authorized: bool,
}

impl AuthorizeCallback {
    pub fn new(authentication_id: impl Into<String>, authorization_id: impl Into<String>) -> Self {
        Self { authentication_id: authentication_id.into(), authorization_id: authorization_id.into(), authorized: false }
    }

    pub fn authentication_id(&self) -> &str { &self.authentication_id }

    pub fn authorization_id(&self) -> &str { &self.authorization_id }

    pub fn is_authorized(&self) -> bool { self.authorized }

    pub fn set_authorized(&mut self, authorized: bool) { self.authorized = authorized; }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Authorize(AuthorizeCallback),
    Name { prompt: String, name: Option<String> },
    Password { prompt: String, password: Option<String> },
    Realm { prompt: String, realm: Option<String> },
}

impl Callback {
    pub fn kind(&self) -> &'static str {
        match self {
            Callback::Authorize(_) => "authorize",
            Callback::Name { .. } => "name",
            Callback::Password { .. } => "password",
            Callback::Realm { .. } => "realm",
        }
    }
}

pub trait CallbackHandler: Send + Sync {
    fn handle(&self, callbacks: &mut [Callback]) -> ClientResult<()>;
}

/// Callback handler backing client-certificate authentication. The only callback it
/// answers is the authorize check, and only a caller acting as itself is authorized.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientCertCallbackHandler;

impl ClientCertCallbackHandler {
    pub fn new() -> Self { Self }

    pub fn preferred_mechanism(&self) -> AuthMechanism { AuthMechanism::ClientCert }

    pub fn supplementary_mechanisms(&self) -> HashSet<AuthMechanism> { HashSet::new() }

    pub fn configuration_options(&self) -> HashMap<String, String> { HashMap::new() }

    /// Client-cert authentication happens during the TLS handshake, never through an
    /// HTTP challenge.
    pub fn is_ready_for_http_challenge(&self) -> bool { false }

    pub fn security_realm(&self) -> ClientCertRealm { ClientCertRealm::new() }
}

impl CallbackHandler for ClientCertCallbackHandler {
    fn handle(&self, callbacks: &mut [Callback]) -> ClientResult<()> {
        // Reject the whole batch before touching any of it.
        if let Some(bad) = callbacks.iter().find(|c| !matches!(c, Callback::Authorize(_))) {
            return Err(ClientError::unsupported_callback(bad.kind()));
        }
        for current in callbacks.iter_mut() {
            if let Callback::Authorize(acb) = current {
                let authorized = acb.authentication_id == acb.authorization_id;
                if !authorized {
                    tracing::trace!(
                        target: "modelgate::security",
                        authentication_id = %acb.authentication_id,
                        authorization_id = %acb.authorization_id,
                        "Checking 'AuthorizeCallback', authorized=false"
                    );
                }
                acb.set_authorized(authorized);
            }
        }
        Ok(())
    }
}

//! Caller identity: how it is established (evidence realm, legacy authorize callbacks)
//! and how it travels into execution (explicit contexts, identity supplier).

mod principal;
mod supplier;
mod context;
mod evidence;
mod realm;
mod callback;
mod provider;

pub use principal::{Attrs, Identity, Principal};
pub use supplier::{AnonymousSupplier, IdentitySupplier, SharedIdentitySupplier};
pub use context::{CallContext, ExecutionContext, Interrupt};
pub use evidence::{Certificate, Credential, CredentialType, Evidence, EvidenceType, SupportLevel, X509PeerCertificateChainEvidence};
pub use realm::{ClientCertRealm, ClientCertRealmIdentity, IdentityLocator, NonExistentIdentity, RealmIdentity, SecurityRealm};
pub use callback::{AuthMechanism, AuthorizeCallback, Callback, CallbackHandler, ClientCertCallbackHandler};
pub use provider::{AuthProvider, EvidenceAuthProvider, LoginRequest, LoginResponse};

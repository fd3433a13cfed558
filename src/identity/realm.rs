use crate::error::ClientResult;

use super::evidence::{Credential, CredentialType, Evidence, EvidenceType, SupportLevel};
use super::principal::Principal;

/// What a caller presents to a realm when asking for an identity.
#[derive(Debug, Clone, Default)]
pub struct IdentityLocator {
    pub name: Option<String>,
    pub evidence: Option<Evidence>,
}

impl IdentityLocator {
    pub fn from_evidence(evidence: Evidence) -> Self {
        Self { name: None, evidence: Some(evidence) }
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), evidence: None }
    }
}

/// A source of realm identities. Implementations report, per credential and evidence
/// type, what they can do before any lookup happens.
pub trait SecurityRealm: Send + Sync {
    fn credential_acquire_support(&self, credential_type: CredentialType, algorithm: Option<&str>) -> ClientResult<SupportLevel>;

    fn evidence_verify_support(&self, evidence_type: EvidenceType, algorithm: Option<&str>) -> ClientResult<SupportLevel>;

    fn realm_identity(&self, locator: &IdentityLocator) -> ClientResult<Box<dyn RealmIdentity>>;
}

pub trait RealmIdentity: Send + Sync {
    fn principal(&self) -> Option<&Principal>;

    fn credential_acquire_support(&self, credential_type: CredentialType, algorithm: Option<&str>) -> ClientResult<SupportLevel>;

    fn credential(&self, credential_type: CredentialType) -> ClientResult<Option<Credential>>;

    fn evidence_verify_support(&self, evidence_type: EvidenceType, algorithm: Option<&str>) -> ClientResult<SupportLevel>;

    fn verify_evidence(&self, evidence: &Evidence) -> ClientResult<bool>;

    fn exists(&self) -> ClientResult<bool>;
}

/// Returned when a locator does not resolve to anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonExistentIdentity;

impl RealmIdentity for NonExistentIdentity {
    fn principal(&self) -> Option<&Principal> { None }

    fn credential_acquire_support(&self, _: CredentialType, _: Option<&str>) -> ClientResult<SupportLevel> {
        Ok(SupportLevel::Unsupported)
    }

    fn credential(&self, _: CredentialType) -> ClientResult<Option<Credential>> { Ok(None) }

    fn evidence_verify_support(&self, _: EvidenceType, _: Option<&str>) -> ClientResult<SupportLevel> {
        Ok(SupportLevel::Unsupported)
    }

    fn verify_evidence(&self, _: &Evidence) -> ClientResult<bool> { Ok(false) }

    fn exists(&self) -> ClientResult<bool> { Ok(false) }
}

/// Realm for client-certificate authentication. It never hands out credentials and
/// accepts any peer certificate chain it is shown: chain trust has already been
/// checked by the transport's trust manager when the connection was established.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientCertRealm;

impl ClientCertRealm {
    pub fn new() -> Self { Self }
}

impl SecurityRealm for ClientCertRealm {
    fn credential_acquire_support(&self, _credential_type: CredentialType, _algorithm: Option<&str>) -> ClientResult<SupportLevel> {
        Ok(SupportLevel::Unsupported)
    }

    fn evidence_verify_support(&self, evidence_type: EvidenceType, _algorithm: Option<&str>) -> ClientResult<SupportLevel> {
        Ok(match evidence_type {
            EvidenceType::X509PeerCertificateChain => SupportLevel::Supported,
            EvidenceType::PasswordGuess | EvidenceType::BearerToken => SupportLevel::Unsupported,
        })
    }

    fn realm_identity(&self, locator: &IdentityLocator) -> ClientResult<Box<dyn RealmIdentity>> {
        match &locator.evidence {
            Some(Evidence::X509PeerCertificateChain(chain)) => {
                Ok(Box::new(ClientCertRealmIdentity { realm: *self, principal: chain.principal() }))
            }
            Some(Evidence::PasswordGuess { .. }) | Some(Evidence::BearerToken { .. }) | None => {
                Ok(Box::new(NonExistentIdentity))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientCertRealmIdentity {
    realm: ClientCertRealm,
    principal: Principal,
}

impl RealmIdentity for ClientCertRealmIdentity {
    fn principal(&self) -> Option<&Principal> { Some(&self.principal) }

    fn credential_acquire_support(&self, credential_type: CredentialType, algorithm: Option<&str>) -> ClientResult<SupportLevel> {
        self.realm.credential_acquire_support(credential_type, algorithm)
    }

    fn credential(&self, _credential_type: CredentialType) -> ClientResult<Option<Credential>> { Ok(None) }

    fn evidence_verify_support(&self, evidence_type: EvidenceType, algorithm: Option<&str>) -> ClientResult<SupportLevel> {
        self.realm.evidence_verify_support(evidence_type, algorithm)
    }

    fn verify_evidence(&self, evidence: &Evidence) -> ClientResult<bool> {
        Ok(match evidence {
            Evidence::X509PeerCertificateChain(_) => true,
            Evidence::PasswordGuess { .. } | Evidence::BearerToken { .. } => false,
        })
    }

    // Resolution already filtered out everything that is not a chain.
    fn exists(&self) -> ClientResult<bool> { Ok(true) }
}

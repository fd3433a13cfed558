//! Evidence and credential kinds understood by the realms in this crate. The sets are
//! closed; realms match on them exhaustively.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

use super::principal::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportLevel {
    Unsupported,
    PossiblySupported,
    Supported,
}

impl SupportLevel {
    pub fn may_be_supported(&self) -> bool { !matches!(self, SupportLevel::Unsupported) }

    pub fn is_definitely_supported(&self) -> bool { matches!(self, SupportLevel::Supported) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    Password,
    X509CertificateChain,
    BearerToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    X509PeerCertificateChain,
    PasswordGuess,
    BearerToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub subject: String,
    pub issuer: String,
}

impl Certificate {
    pub fn new(subject: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self { subject: subject.into(), issuer: issuer.into() }
    }
}

/// The peer's certificate chain as presented on an already-trusted connection,
/// leaf first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509PeerCertificateChainEvidence {
    chain: Vec<Certificate>,
}

impl X509PeerCertificateChainEvidence {
    pub fn new(chain: Vec<Certificate>) -> ClientResult<Self> {
        if chain.is_empty() {
            return Err(ClientError::authentication("empty certificate chain"));
        }
        Ok(Self { chain })
    }

    pub fn chain(&self) -> &[Certificate] { &self.chain }

    pub fn first_certificate(&self) -> &Certificate { &self.chain[0] }

    /// Subject of the leaf certificate.
    pub fn principal(&self) -> Principal {
        Principal::new(self.first_certificate().subject.clone())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Evidence {
    X509PeerCertificateChain(X509PeerCertificateChainEvidence),
    PasswordGuess { guess: String },
    BearerToken { token: String },
}

impl Evidence {
    pub fn evidence_type(&self) -> EvidenceType {
        match self {
            Evidence::X509PeerCertificateChain(_) => EvidenceType::X509PeerCertificateChain,
            Evidence::PasswordGuess { .. } => EvidenceType::PasswordGuess,
            Evidence::BearerToken { .. } => EvidenceType::BearerToken,
        }
    }
}

impl std::fmt::Debug for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evidence::X509PeerCertificateChain(e) => f.debug_tuple("X509PeerCertificateChain").field(e).finish(),
            Evidence::PasswordGuess { .. } => f.write_str("PasswordGuess { guess: *** }"),
            Evidence::BearerToken { .. } => f.write_str("BearerToken { token: *** }"),
        }
    }
}

/// Stored credential material a realm may hand out.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Password(String),
    X509CertificateChain(Vec<Certificate>),
    BearerToken(String),
}

impl Credential {
    pub fn credential_type(&self) -> CredentialType {
        match self {
            Credential::Password(_) => CredentialType::Password,
            Credential::X509CertificateChain(_) => CredentialType::X509CertificateChain,
            Credential::BearerToken(_) => CredentialType::BearerToken,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential({:?})", self.credential_type())
    }
}

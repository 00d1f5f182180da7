use bytes::Bytes;
use chrono::{DateTime, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureStatus {
    Valid,
    Bad,
    /// The signing key is not yet known locally.
    MissingKey,
}

/// A detached signature found on a feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub fingerprint: String,
    /// When the signer claims to have signed the feed.
    pub timestamp: DateTime<Utc>,
    pub status: SignatureStatus,
}

impl Signature {
    pub fn valid(fingerprint: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            timestamp,
            status: SignatureStatus::Valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == SignatureStatus::Valid
    }
}

/// A downloaded feed that has not been trusted yet.
#[derive(Clone, Debug)]
pub struct PendingFeed {
    pub url: String,
    pub body: Bytes,
    pub signatures: Vec<Signature>,
    /// Newest timestamp among the valid signatures.
    pub signed_at: Option<DateTime<Utc>>,
}

impl PendingFeed {
    pub fn new(url: impl Into<String>, body: Bytes, signatures: Vec<Signature>) -> Self {
        let signed_at = signatures
            .iter()
            .filter(|s| s.is_valid())
            .map(|s| s.timestamp)
            .max();
        Self {
            url: url.into(),
            body,
            signatures,
            signed_at,
        }
    }

    pub fn valid_fingerprints(&self) -> Vec<String> {
        self.signatures
            .iter()
            .filter(|s| s.is_valid())
            .map(|s| s.fingerprint.clone())
            .collect()
    }

    pub fn needs_keys(&self) -> bool {
        self.signatures
            .iter()
            .any(|s| s.status == SignatureStatus::MissingKey)
    }
}

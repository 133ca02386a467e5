//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the ledger. These prevent
//! accidental identifier confusion — you cannot pass a `ListingId` where a
//! `CreditId` is expected.
//!
//! ## Security Invariant
//!
//! Type-level distinction between identifier namespaces prevents
//! cross-namespace confusion attacks where an attacker substitutes one
//! kind of identifier for another.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, EncodingError};

/// Unique identifier for a carbon credit token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreditId(pub Uuid);

/// Unique identifier for a marketplace listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub Uuid);

/// An account identifier: the external owner of credits and listings.
///
/// Opaque to the ledger — accounts are managed by the surrounding platform.
/// Validated at construction: non-empty, at most 128 bytes, no control
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

/// Opaque fixed-size identifier binding a credit to its energy project.
///
/// 32 bytes, rendered as 64 lowercase hex characters. The ledger never
/// interprets the contents — the registry that assigns project hashes is
/// an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectHash([u8; 32]);

impl CreditId {
    /// Generate a new random credit identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CreditId {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingId {
    /// Generate a new random listing identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountId {
    /// Maximum accepted length in bytes.
    pub const MAX_LEN: usize = 128;

    /// Construct a validated account identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(CoreError::InvalidIdentifier(
                "account id must not be empty".to_string(),
            ));
        }
        if raw.len() > Self::MAX_LEN {
            return Err(CoreError::InvalidIdentifier(format!(
                "account id exceeds {} bytes",
                Self::MAX_LEN
            )));
        }
        if raw.chars().any(|c| c.is_control()) {
            return Err(CoreError::InvalidIdentifier(
                "account id must not contain control characters".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = CoreError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> String {
        id.0
    }
}

impl ProjectHash {
    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a 64-character lowercase hex string.
    pub fn parse(hex: &str) -> Result<Self, EncodingError> {
        if hex.len() != 64 {
            return Err(EncodingError::MalformedHex(format!(
                "project hash must be 64 hex chars, got {}",
                hex.len()
            )));
        }
        let mut out = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let s = std::str::from_utf8(chunk)
                .map_err(|e| EncodingError::MalformedHex(format!("invalid hex: {e}")))?;
            out[i] = u8::from_str_radix(s, 16)
                .map_err(|e| EncodingError::MalformedHex(format!("invalid hex at {i}: {e}")))?;
        }
        Ok(Self(out))
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl TryFrom<String> for ProjectHash {
    type Error = EncodingError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<ProjectHash> for String {
    fn from(h: ProjectHash) -> String {
        h.to_hex()
    }
}

impl std::fmt::Display for CreditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "credit:{}", self.0)
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listing:{}", self.0)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ProjectHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "project:{}", self.to_hex())
    }
}

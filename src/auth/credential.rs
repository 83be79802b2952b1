//! Credential Codec
//!
//! Issues bearer credentials and derives the two stored forms: a one-way
//! bcrypt digest used for verification and a short display hint. The raw
//! credential exists only in the registration response; neither stored form
//! can recover it.

use std::fmt::Write as _;

use rand::RngCore;
use thiserror::Error;

/// Prefix carried by every issued credential
pub const CREDENTIAL_PREFIX: &str = "alpha_";

/// Random bytes of entropy behind each credential
pub const CREDENTIAL_ENTROPY_BYTES: usize = 32;

/// Characters of the raw credential kept in the stored hint
pub const HINT_PREFIX_CHARS: usize = 12;

/// bcrypt cost factor for stored digests
pub const BCRYPT_COST: u32 = 10;

/// Errors from digest derivation
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to derive credential digest: {0}")]
    Digest(#[from] bcrypt::BcryptError),
}

/// Issues credentials and derives their stored forms.
///
/// The cost factor is fixed at construction; [`CredentialCodec::with_cost`]
/// exists so tests can use bcrypt's minimum cost instead of paying the
/// production work factor per verification.
#[derive(Debug, Clone)]
pub struct CredentialCodec {
    cost: u32,
}

impl Default for CredentialCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialCodec {
    /// Create a codec with the production cost factor
    pub fn new() -> Self {
        Self { cost: BCRYPT_COST }
    }

    /// Create a codec with a custom cost factor
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Issue a fresh credential: the fixed prefix plus 32 CSPRNG bytes in
    /// lowercase hex
    pub fn issue(&self) -> String {
        let mut bytes = [0u8; CREDENTIAL_ENTROPY_BYTES];
        rand::rng().fill_bytes(&mut bytes);

        let mut credential =
            String::with_capacity(CREDENTIAL_PREFIX.len() + CREDENTIAL_ENTROPY_BYTES * 2);
        credential.push_str(CREDENTIAL_PREFIX);
        for byte in bytes {
            // Writing to a String cannot fail
            let _ = write!(credential, "{byte:02x}");
        }
        credential
    }

    /// Derive the stored digest for a credential
    pub fn hash(&self, credential: &str) -> Result<String, CredentialError> {
        Ok(bcrypt::hash(credential, self.cost)?)
    }

    /// Derive the display hint: the first 12 characters plus an ellipsis.
    ///
    /// The hint identifies a credential to its owner without revealing
    /// enough to reconstruct it.
    pub fn hint(&self, credential: &str) -> String {
        let prefix: String = credential.chars().take(HINT_PREFIX_CHARS).collect();
        format!("{prefix}...")
    }

    /// Compare a candidate against a stored digest using bcrypt's own
    /// comparison routine
    pub fn verify(&self, candidate: &str, digest: &str) -> Result<bool, bcrypt::BcryptError> {
        bcrypt::verify(candidate, digest)
    }

    /// Whether a string has the shape of an issued credential
    pub fn has_prefix(credential: &str) -> bool {
        credential.starts_with(CREDENTIAL_PREFIX)
    }
}

//! Authentication Module
//!
//! Credential issuance and verification for registered agents.
//!
//! # Features
//!
//! - Opaque bearer credentials: `alpha_` plus 32 CSPRNG bytes in hex
//! - bcrypt digests in the store; the raw credential is never persisted
//! - Full-scan verification with no token-to-agent index
//! - Fire-and-forget activity refresh on successful verification

pub mod credential;
pub mod verifier;

pub use credential::{CredentialCodec, CredentialError, CREDENTIAL_PREFIX};
pub use verifier::CredentialVerifier;

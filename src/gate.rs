//! Request Gate
//!
//! Composes credential verification and rate limiting into the two
//! authorization decisions the service makes: may this caller send a message
//! to a room, and may this caller read from one. The gate knows nothing
//! about HTTP; callers translate its verdicts into responses.

use std::sync::Arc;

use thiserror::Error;

use crate::auth::CredentialVerifier;
use crate::rate_limit::{RateLimitDecision, RateLimiter};
use crate::store::{AuthenticatedAgent, StoreError};

/// Gate verdicts that end a request
#[derive(Debug, Error)]
pub enum GateError {
    /// No identity could be established. Malformed and unknown tokens land
    /// here identically; a denied caller learns nothing about which it was.
    #[error("Invalid or missing API key")]
    Unauthorized,

    /// A window denied the action. Recoverable by waiting out the hint.
    #[error("too many requests")]
    RateLimited(RateLimitDecision),

    /// The store failed. Not an authentication or quota verdict.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A granted message send: who is sending, and how much quota is left
#[derive(Debug, Clone)]
pub struct SendGrant {
    pub agent: AuthenticatedAgent,
    pub decision: RateLimitDecision,
}

/// A granted read
#[derive(Debug, Clone)]
pub enum ReadAccess {
    /// Authenticated agent; agent reads are not metered
    Agent(AuthenticatedAgent),
    /// Unauthenticated spectator admitted through the per-IP window
    Spectator,
}

impl ReadAccess {
    /// The authenticated identity, if any
    pub fn agent(&self) -> Option<&AuthenticatedAgent> {
        match self {
            ReadAccess::Agent(agent) => Some(agent),
            ReadAccess::Spectator => None,
        }
    }
}

/// Admission control for every chat operation.
#[derive(Clone)]
pub struct RequestGate {
    verifier: CredentialVerifier,
    limiter: Arc<RateLimiter>,
}

impl RequestGate {
    /// Create a gate over a verifier and a shared limiter
    pub fn new(verifier: CredentialVerifier, limiter: Arc<RateLimiter>) -> Self {
        Self { verifier, limiter }
    }

    /// Establish identity without consuming any window.
    ///
    /// Profile and room listings require a credential but are not metered.
    pub async fn authenticate(
        &self,
        bearer: Option<&str>,
    ) -> Result<AuthenticatedAgent, GateError> {
        let token = bearer.ok_or(GateError::Unauthorized)?;
        self.verifier
            .resolve(token)
            .await?
            .ok_or(GateError::Unauthorized)
    }

    /// Authorize a message send.
    ///
    /// Identity is established first, then the send windows are consumed;
    /// an unauthenticated caller never spends quota and a rate-limited
    /// caller has already proven who they are.
    pub async fn authorize_send(&self, bearer: Option<&str>) -> Result<SendGrant, GateError> {
        let agent = self.authenticate(bearer).await?;

        let decision = self.limiter.check_message(&agent.id);
        if !decision.allowed {
            return Err(GateError::RateLimited(decision));
        }

        Ok(SendGrant { agent, decision })
    }

    /// Authorize a read.
    ///
    /// A caller presenting a working credential reads as an agent with no
    /// metering. Everyone else, including callers with a bad token, reads
    /// as a spectator through the per-IP window.
    pub async fn authorize_read(
        &self,
        bearer: Option<&str>,
        ip: &str,
    ) -> Result<ReadAccess, GateError> {
        if let Some(token) = bearer {
            if let Some(agent) = self.verifier.resolve(token).await? {
                return Ok(ReadAccess::Agent(agent));
            }
        }

        let decision = self.limiter.check_ip(ip);
        if !decision.allowed {
            return Err(GateError::RateLimited(decision));
        }
        Ok(ReadAccess::Spectator)
    }

    /// The shared limiter, for the background sweeper
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }
}

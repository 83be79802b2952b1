//! Credential Verifier
//!
//! Maps a presented bearer token to at most one registered agent. There is
//! no token-to-agent index: verification scans every stored digest and stops
//! at the first match, trading lookup speed for a store with no recoverable
//! credential material. The linear cost grows with the agent population.

use std::sync::Arc;

use crate::metrics;
use crate::store::{AuthenticatedAgent, ChatStore, StoreError};

use super::credential::CredentialCodec;

/// Resolves bearer tokens to agent identities.
#[derive(Clone)]
pub struct CredentialVerifier {
    codec: CredentialCodec,
    store: Arc<dyn ChatStore>,
}

impl CredentialVerifier {
    /// Create a verifier with the production codec
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self::with_codec(store, CredentialCodec::new())
    }

    /// Create a verifier with a custom codec (tests use a cheap cost factor)
    pub fn with_codec(store: Arc<dyn ChatStore>, codec: CredentialCodec) -> Self {
        Self { codec, store }
    }

    /// Resolve a token to the agent it was issued to.
    ///
    /// Returns `Ok(None)` for both malformed and unknown tokens; callers
    /// cannot tell the two apart, and neither can their error messages. A
    /// token without the credential prefix is rejected before any digest
    /// work. Store failures propagate as errors and are not an
    /// authentication verdict.
    ///
    /// On a match the agent's `last_active_at` is refreshed on a spawned
    /// task; the request path never waits for it and a failed refresh only
    /// produces a log line.
    pub async fn resolve(&self, token: &str) -> Result<Option<AuthenticatedAgent>, StoreError> {
        if !CredentialCodec::has_prefix(token) {
            metrics::AUTH_FAILURES_TOTAL.inc();
            return Ok(None);
        }

        let agents = self.store.list_agents().await?;
        for agent in &agents {
            match self.codec.verify(token, &agent.api_key_hash) {
                Ok(true) => {
                    let store = Arc::clone(&self.store);
                    let agent_id = agent.id.clone();
                    tokio::spawn(async move {
                        if let Err(e) = store.touch_agent(&agent_id).await {
                            tracing::debug!(agent_id = %agent_id, error = %e, "failed to record agent activity");
                        }
                    });

                    metrics::AUTH_SUCCESSES_TOTAL.inc();
                    tracing::debug!(agent_id = %agent.id, "credential verified");
                    return Ok(Some(AuthenticatedAgent::from(agent)));
                }
                Ok(false) => {}
                Err(e) => {
                    // A corrupt stored digest must not lock every agent out
                    // of verification; skip it and keep scanning
                    tracing::warn!(agent_id = %agent.id, error = %e, "skipping unverifiable digest");
                }
            }
        }

        metrics::AUTH_FAILURES_TOTAL.inc();
        Ok(None)
    }
}

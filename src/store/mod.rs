//! Chat Storage Module
//!
//! The storage collaborator behind the service: agents, rooms, memberships,
//! and messages. The core only depends on the [`ChatStore`] trait; the
//! shipped implementation is the in-memory [`MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Storage failures surfaced to the core
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint was violated
    #[error("{what} already exists")]
    Conflict { what: &'static str },

    /// Any other storage failure; the core reports these without retrying
    #[error("store failure: {0}")]
    Internal(String),
}

/// A registered agent as stored, credential digest included.
///
/// Only the store and the credential verifier ever see this record; API
/// responses are built from [`AuthenticatedAgent`] or narrower views.
#[derive(Clone)]
pub struct Agent {
    /// Stable identifier, `agent-<uuid>`
    pub id: String,

    /// Unique immutable display name
    pub name: String,

    /// Free-form self-description
    pub description: String,

    /// bcrypt digest of the bearer credential
    pub api_key_hash: String,

    /// First characters of the credential plus an ellipsis
    pub api_key_hint: String,

    /// Registration time
    pub created_at: DateTime<Utc>,

    /// Last successful authentication, if any
    pub last_active_at: Option<DateTime<Utc>>,
}

// The digest stays out of Debug output so accidental logging of an Agent
// record cannot leak it.
impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("api_key_hash", &"<redacted>")
            .field("api_key_hint", &self.api_key_hint)
            .field("created_at", &self.created_at)
            .field("last_active_at", &self.last_active_at)
            .finish()
    }
}

/// The identity attached to a request after credential verification.
///
/// Carries everything handlers need and nothing they must not see; in
/// particular there is no digest field.
#[derive(Debug, Clone)]
pub struct AuthenticatedAgent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl From<&Agent> for AuthenticatedAgent {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            description: agent.description.clone(),
            created_at: agent.created_at,
            last_active_at: agent.last_active_at,
        }
    }
}

/// Fields for creating an agent
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub description: String,
    pub api_key_hash: String,
    pub api_key_hint: String,
}

/// A chat room
#[derive(Debug, Clone)]
pub struct Room {
    /// Stable identifier, `room-<uuid>`
    pub id: String,

    /// Unique room name, used in URLs
    pub name: String,

    /// Room description
    pub description: String,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A room together with its membership and traffic counts
#[derive(Debug, Clone)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub member_count: usize,
    pub message_count: usize,
}

/// A message joined with its author's public identity.
///
/// Agent names are immutable, so the author name is denormalized into the
/// record at creation time.
#[derive(Debug, Clone)]
pub struct Message {
    /// Stable identifier, `msg-<uuid>`
    pub id: String,

    /// Room this message was posted to
    pub room_id: String,

    /// Message body
    pub content: String,

    /// Creation time; also the pagination cursor
    pub created_at: DateTime<Utc>,

    /// Author id
    pub agent_id: String,

    /// Author name at creation time
    pub agent_name: String,
}

/// Storage operations the service is built against.
///
/// Implementations must be safe to share across request tasks. The core
/// treats every error as terminal for the current request; it never retries.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// All registered agents, sorted by name
    async fn list_agents(&self) -> Result<Vec<Agent>, StoreError>;

    /// Look up an agent by its unique name
    async fn find_agent_by_name(&self, name: &str) -> Result<Option<Agent>, StoreError>;

    /// Create an agent, enforcing name uniqueness
    async fn create_agent(&self, new_agent: NewAgent) -> Result<Agent, StoreError>;

    /// Record a successful authentication for an agent
    async fn touch_agent(&self, agent_id: &str) -> Result<(), StoreError>;

    /// All rooms with membership and traffic counts, sorted by name
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, StoreError>;

    /// Look up a room by its unique name
    async fn find_room_by_name(&self, name: &str) -> Result<Option<Room>, StoreError>;

    /// Create a room, enforcing name uniqueness
    async fn create_room(&self, name: &str, description: &str) -> Result<Room, StoreError>;

    /// Find a room by name or create it; used for startup seeding
    async fn ensure_room(&self, name: &str, description: &str) -> Result<Room, StoreError>;

    /// Add an agent to a room if not already a member; returns whether a
    /// membership was created
    async fn ensure_membership(&self, room_id: &str, agent_id: &str) -> Result<bool, StoreError>;

    /// Append a message to a room
    async fn create_message(
        &self,
        room_id: &str,
        agent_id: &str,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// Messages in a room, oldest first, strictly newer than `since` when
    /// given, at most `limit`
    async fn list_messages(
        &self,
        room_id: &str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError>;
}

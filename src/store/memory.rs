//! In-Memory Chat Store
//!
//! The shipped [`ChatStore`] implementation: plain maps behind async
//! read-write locks. State lives for the process lifetime; a restart starts
//! empty and re-seeds the default room.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Agent, ChatStore, Message, NewAgent, Room, RoomSummary, StoreError};
use async_trait::async_trait;

/// In-memory chat store.
///
/// Cloning shares the underlying maps, so every clone observes the same
/// state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// Agents by id
    agents: Arc<RwLock<HashMap<String, Agent>>>,

    /// Rooms by id
    rooms: Arc<RwLock<HashMap<String, Room>>>,

    /// Room id to member agent ids
    members: Arc<RwLock<HashMap<String, HashSet<String>>>>,

    /// Room id to messages in creation order
    messages: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            agents: Arc::new(RwLock::new(HashMap::new())),
            rooms: Arc::new(RwLock::new(HashMap::new())),
            members: Arc::new(RwLock::new(HashMap::new())),
            messages: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn list_agents(&self) -> Result<Vec<Agent>, StoreError> {
        let agents = self.agents.read().await;
        let mut all: Vec<Agent> = agents.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_agent_by_name(&self, name: &str) -> Result<Option<Agent>, StoreError> {
        let agents = self.agents.read().await;
        Ok(agents.values().find(|a| a.name == name).cloned())
    }

    async fn create_agent(&self, new_agent: NewAgent) -> Result<Agent, StoreError> {
        let mut agents = self.agents.write().await;

        // Uniqueness is enforced under the write lock, so a concurrent
        // registration for the same name cannot slip through
        if agents.values().any(|a| a.name == new_agent.name) {
            return Err(StoreError::Conflict { what: "agent name" });
        }

        let agent = Agent {
            id: format!("agent-{}", Uuid::new_v4()),
            name: new_agent.name,
            description: new_agent.description,
            api_key_hash: new_agent.api_key_hash,
            api_key_hint: new_agent.api_key_hint,
            created_at: Utc::now(),
            last_active_at: None,
        };
        agents.insert(agent.id.clone(), agent.clone());
        Ok(agent)
    }

    async fn touch_agent(&self, agent_id: &str) -> Result<(), StoreError> {
        let mut agents = self.agents.write().await;
        match agents.get_mut(agent_id) {
            Some(agent) => {
                agent.last_active_at = Some(Utc::now());
                Ok(())
            }
            None => Err(StoreError::Internal(format!(
                "agent not found: {agent_id}"
            ))),
        }
    }

    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, StoreError> {
        let rooms = self.rooms.read().await;
        let members = self.members.read().await;
        let messages = self.messages.read().await;

        let mut summaries: Vec<RoomSummary> = rooms
            .values()
            .map(|room| RoomSummary {
                id: room.id.clone(),
                name: room.name.clone(),
                description: room.description.clone(),
                created_at: room.created_at,
                member_count: members.get(&room.id).map_or(0, HashSet::len),
                message_count: messages.get(&room.id).map_or(0, Vec::len),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn find_room_by_name(&self, name: &str) -> Result<Option<Room>, StoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.values().find(|r| r.name == name).cloned())
    }

    async fn create_room(&self, name: &str, description: &str) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.write().await;

        if rooms.values().any(|r| r.name == name) {
            return Err(StoreError::Conflict { what: "room name" });
        }

        let room = Room {
            id: format!("room-{}", Uuid::new_v4()),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        rooms.insert(room.id.clone(), room.clone());
        Ok(room)
    }

    async fn ensure_room(&self, name: &str, description: &str) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.write().await;

        if let Some(room) = rooms.values().find(|r| r.name == name) {
            return Ok(room.clone());
        }

        let room = Room {
            id: format!("room-{}", Uuid::new_v4()),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        rooms.insert(room.id.clone(), room.clone());
        Ok(room)
    }

    async fn ensure_membership(&self, room_id: &str, agent_id: &str) -> Result<bool, StoreError> {
        let mut members = self.members.write().await;
        Ok(members
            .entry(room_id.to_string())
            .or_default()
            .insert(agent_id.to_string()))
    }

    async fn create_message(
        &self,
        room_id: &str,
        agent_id: &str,
        content: &str,
    ) -> Result<Message, StoreError> {
        let agent_name = {
            let agents = self.agents.read().await;
            match agents.get(agent_id) {
                Some(agent) => agent.name.clone(),
                None => {
                    return Err(StoreError::Internal(format!(
                        "agent not found: {agent_id}"
                    )))
                }
            }
        };

        {
            let rooms = self.rooms.read().await;
            if !rooms.contains_key(room_id) {
                return Err(StoreError::Internal(format!("room not found: {room_id}")));
            }
        }

        let message = Message {
            id: format!("msg-{}", Uuid::new_v4()),
            room_id: room_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            agent_id: agent_id.to_string(),
            agent_name,
        };

        let mut messages = self.messages.write().await;
        messages
            .entry(room_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn list_messages(
        &self,
        room_id: &str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.read().await;
        let room_messages = match messages.get(room_id) {
            Some(list) => list,
            None => return Ok(Vec::new()),
        };

        // Messages are appended in creation order, so the vec is already
        // sorted oldest first
        Ok(room_messages
            .iter()
            .filter(|m| since.map_or(true, |s| m.created_at > s))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_agent(name: &str) -> NewAgent {
        NewAgent {
            name: name.to_string(),
            description: format!("{name} description"),
            api_key_hash: format!("$2b$04$fake-digest-for-{name}"),
            api_key_hint: "alpha_000000...".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_agents_sorted() {
        let store = MemoryStore::new();

        store.create_agent(new_agent("zeta")).await.unwrap();
        store.create_agent(new_agent("alpha_bot")).await.unwrap();
        store.create_agent(new_agent("mid")).await.unwrap();

        let agents = store.list_agents().await.unwrap();
        let names: Vec<&str> = agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["alpha_bot", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_duplicate_agent_name_conflicts() {
        let store = MemoryStore::new();

        store.create_agent(new_agent("scout")).await.unwrap();
        let error = store.create_agent(new_agent("scout")).await.unwrap_err();
        assert!(matches!(error, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_find_agent_by_name() {
        let store = MemoryStore::new();
        let created = store.create_agent(new_agent("scout")).await.unwrap();

        let found = store.find_agent_by_name("scout").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        assert!(store.find_agent_by_name("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_touch_agent_sets_last_active() {
        let store = MemoryStore::new();
        let agent = store.create_agent(new_agent("scout")).await.unwrap();
        assert!(agent.last_active_at.is_none());

        store.touch_agent(&agent.id).await.unwrap();

        let touched = store.find_agent_by_name("scout").await.unwrap().unwrap();
        assert!(touched.last_active_at.is_some());
    }

    #[tokio::test]
    async fn test_touch_unknown_agent_fails() {
        let store = MemoryStore::new();
        assert!(store.touch_agent("agent-missing").await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_room_is_idempotent() {
        let store = MemoryStore::new();

        let first = store.ensure_room("alpha", "the main room").await.unwrap();
        let second = store.ensure_room("alpha", "different text").await.unwrap();

        assert_eq!(first.id, second.id);
        // The original description wins
        assert_eq!(second.description, "the main room");
        assert_eq!(store.list_rooms().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_room_name_conflicts() {
        let store = MemoryStore::new();
        store.create_room("alpha", "main").await.unwrap();
        let error = store.create_room("alpha", "again").await.unwrap_err();
        assert!(matches!(error, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_membership_created_once() {
        let store = MemoryStore::new();
        let room = store.ensure_room("alpha", "main").await.unwrap();
        let agent = store.create_agent(new_agent("scout")).await.unwrap();

        assert!(store.ensure_membership(&room.id, &agent.id).await.unwrap());
        assert!(!store.ensure_membership(&room.id, &agent.id).await.unwrap());

        let rooms = store.list_rooms().await.unwrap();
        assert_eq!(rooms[0].member_count, 1);
    }

    #[tokio::test]
    async fn test_messages_in_creation_order_with_author() {
        let store = MemoryStore::new();
        let room = store.ensure_room("alpha", "main").await.unwrap();
        let agent = store.create_agent(new_agent("scout")).await.unwrap();

        store
            .create_message(&room.id, &agent.id, "first")
            .await
            .unwrap();
        store
            .create_message(&room.id, &agent.id, "second")
            .await
            .unwrap();

        let messages = store.list_messages(&room.id, None, 50).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
        assert_eq!(messages[0].agent_name, "scout");
        assert!(messages[0].id.starts_with("msg-"));
    }

    #[tokio::test]
    async fn test_list_messages_since_is_strictly_newer() {
        let store = MemoryStore::new();
        let room = store.ensure_room("alpha", "main").await.unwrap();
        let agent = store.create_agent(new_agent("scout")).await.unwrap();

        let first = store
            .create_message(&room.id, &agent.id, "first")
            .await
            .unwrap();
        let second = store
            .create_message(&room.id, &agent.id, "second")
            .await
            .unwrap();

        let newer = store
            .list_messages(&room.id, Some(first.created_at), 50)
            .await
            .unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].id, second.id);

        // A cursor at the newest message returns nothing
        let none = store
            .list_messages(&room.id, Some(second.created_at), 50)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_list_messages_respects_limit() {
        let store = MemoryStore::new();
        let room = store.ensure_room("alpha", "main").await.unwrap();
        let agent = store.create_agent(new_agent("scout")).await.unwrap();

        for i in 0..5 {
            store
                .create_message(&room.id, &agent.id, &format!("m{i}"))
                .await
                .unwrap();
        }

        let limited = store.list_messages(&room.id, None, 3).await.unwrap();
        assert_eq!(limited.len(), 3);
        assert_eq!(limited[2].content, "m2");
    }

    #[tokio::test]
    async fn test_unknown_room_lists_no_messages() {
        let store = MemoryStore::new();
        let messages = store.list_messages("room-missing", None, 50).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_message_to_unknown_room_fails() {
        let store = MemoryStore::new();
        let agent = store.create_agent(new_agent("scout")).await.unwrap();
        assert!(store
            .create_message("room-missing", &agent.id, "hello")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_room_counts_in_summaries() {
        let store = MemoryStore::new();
        let alpha = store.ensure_room("alpha", "main").await.unwrap();
        store.ensure_room("beta", "side").await.unwrap();
        let agent = store.create_agent(new_agent("scout")).await.unwrap();

        store.ensure_membership(&alpha.id, &agent.id).await.unwrap();
        store
            .create_message(&alpha.id, &agent.id, "hello")
            .await
            .unwrap();

        let rooms = store.list_rooms().await.unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].name, "alpha");
        assert_eq!(rooms[0].member_count, 1);
        assert_eq!(rooms[0].message_count, 1);
        assert_eq!(rooms[1].name, "beta");
        assert_eq!(rooms[1].member_count, 0);
        assert_eq!(rooms[1].message_count, 0);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_keep_names_unique() {
        let store = MemoryStore::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create_agent(new_agent("contested")).await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.list_agents().await.unwrap().len(), 1);
    }
}

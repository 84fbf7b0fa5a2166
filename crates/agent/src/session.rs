use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::runtime::ActionResult;

pub const DEFAULT_IDLE_TIMEOUT_SECS: i64 = 1_800;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub correlation_id: String,
    pub received_at: DateTime<Utc>,
    pub text: String,
    pub stripped_text: String,
    pub results: Vec<ActionResult>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
}

impl Conversation {
    fn start(id: &str, at: DateTime<Utc>) -> Self {
        Self { id: id.to_string(), started_at: at, last_active_at: at, turns: Vec::new() }
    }

    fn is_idle(&self, now: DateTime<Utc>, idle_timeout: Duration) -> bool {
        now - self.last_active_at >= idle_timeout
    }
}

/// Per-conversation history, keyed by the caller's conversation id.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get(&self, conversation_id: &str) -> anyhow::Result<Option<Conversation>>;

    /// Appends a turn, starting the conversation if it is new or has gone idle.
    async fn append_turn(
        &self,
        conversation_id: &str,
        turn: ConversationTurn,
    ) -> anyhow::Result<Conversation>;

    /// Drops conversations idle at `now`; returns how many were evicted.
    async fn expire(&self, now: DateTime<Utc>) -> anyhow::Result<usize>;
}

pub struct InMemoryConversationStore {
    idle_timeout: Duration,
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_IDLE_TIMEOUT_SECS))
    }
}

impl InMemoryConversationStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self { idle_timeout, conversations: RwLock::new(HashMap::new()) }
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, conversation_id: &str) -> anyhow::Result<Option<Conversation>> {
        Ok(self.conversations.read().await.get(conversation_id).cloned())
    }

    async fn append_turn(
        &self,
        conversation_id: &str,
        turn: ConversationTurn,
    ) -> anyhow::Result<Conversation> {
        let mut conversations = self.conversations.write().await;
        let at = turn.received_at;

        let conversation = conversations
            .entry(conversation_id.to_string())
            .or_insert_with(|| Conversation::start(conversation_id, at));
        if conversation.is_idle(at, self.idle_timeout) {
            *conversation = Conversation::start(conversation_id, at);
        }

        conversation.last_active_at = at;
        conversation.turns.push(turn);
        Ok(conversation.clone())
    }

    async fn expire(&self, now: DateTime<Utc>) -> anyhow::Result<usize> {
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|_, conversation| !conversation.is_idle(now, self.idle_timeout));
        Ok(before - conversations.len())
    }
}

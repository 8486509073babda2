//! crates/learner_core/src/chat.rs
//!
//! Owns one conversation's in-memory transcript and keeps it aligned with the
//! append-only log held by the persistence service.
//!
//! The transcript shown to the learner is always the persisted history (in
//! stored order) followed by locally produced messages in the order they were
//! sent. Messages are never reordered, merged or deduplicated. New exchanges
//! are appended optimistically and persisted best-effort afterwards: a failed
//! write is logged, never surfaced, and never rolls the transcript back.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::domain::{ChatMessage, SessionKey};
use crate::ports::{ContentService, PersistenceService, PortError, PortResult};

/// A persisted log entry. A single entry may hold one message or a
/// user/assistant pair that `send` wrote atomically.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Pair(Vec<ChatMessage>),
    Single(ChatMessage),
}

pub struct ChatSessionManager {
    content: Arc<dyn ContentService>,
    store: Arc<dyn PersistenceService>,
    key: SessionKey,
    transcript: Vec<ChatMessage>,
}

impl ChatSessionManager {
    pub fn new(
        content: Arc<dyn ContentService>,
        store: Arc<dyn PersistenceService>,
        key: SessionKey,
    ) -> Self {
        Self {
            content,
            store,
            key,
            transcript: Vec::new(),
        }
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.key
    }

    /// The transcript as the UI should display it.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Replaces the in-memory transcript with the persisted history.
    ///
    /// Each stored entry decodes to one or more messages; flattening keeps
    /// the intra-entry order. Entries that fail to decode are preserved
    /// verbatim as raw messages so history is never silently dropped. On a
    /// fetch error the current transcript is left untouched.
    pub async fn load(&mut self) -> PortResult<&[ChatMessage]> {
        let entries = self.store.get_chat_history(&self.key.storage_key()).await?;

        let mut transcript = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_str::<StoredEntry>(&entry) {
                Ok(StoredEntry::Pair(messages)) => transcript.extend(messages),
                Ok(StoredEntry::Single(message)) => transcript.push(message),
                Err(_) => transcript.push(ChatMessage::raw(entry)),
            }
        }

        self.transcript = transcript;
        Ok(&self.transcript)
    }

    /// Sends a prompt and returns the message that was appended in response:
    /// an assistant message on success, an error message on remote failure.
    ///
    /// The user message is appended before the remote call so the UI can
    /// show it immediately. Error messages are never persisted. Callers must
    /// serialize `send` calls per session, which `&mut self` enforces.
    pub async fn send(&mut self, prompt: &str) -> PortResult<ChatMessage> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PortError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }

        self.transcript.push(ChatMessage::user(prompt));

        let appended = match self.content.chat(&self.key.notebook_id, prompt, true).await {
            Ok(reply) => {
                let assistant =
                    ChatMessage::assistant(reply.response, reply.original_response, reply.enhanced);
                self.transcript.push(assistant.clone());
                self.persist_last_exchange().await;
                assistant
            }
            Err(e) => {
                let failure = ChatMessage::error(format!("Error: {e}"));
                self.transcript.push(failure.clone());
                failure
            }
        };

        Ok(appended)
    }

    /// Resets the in-memory transcript without touching persisted history;
    /// a fresh `load` restores it.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Best-effort write of the trailing user/assistant pair as one atomic
    /// log entry. Failure never disturbs the visible transcript.
    async fn persist_last_exchange(&self) {
        let session = self.key.storage_key();
        let pair = &self.transcript[self.transcript.len() - 2..];

        let encoded = match serde_json::to_string(pair) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(session = %session, "failed to encode chat exchange: {e}");
                return;
            }
        };

        match self.store.store_chat_message(&session, &encoded).await {
            Ok(true) => {}
            Ok(false) => warn!(session = %session, "store refused the chat exchange"),
            Err(e) => warn!(session = %session, "failed to persist chat exchange: {e}"),
        }
    }
}

//! crates/learner_core/src/testing.rs
//!
//! Script-driven service doubles shared by the component tests. Each
//! operation pops its next reply from a queue; counters record how often
//! the media endpoints were hit so the poll-loop tests can assert exact
//! call counts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Character, MediaStatus, PodcastEpisode, SpeakerMap, Topic};
use crate::ports::{
    BatchReply, ChatReply, ContentService, PersistenceService, PortError, PortResult, QuizPayload,
    StatusReport, VideoRequest, VideoTicket,
};

fn next<T>(queue: &Mutex<VecDeque<PortResult<T>>>, operation: &str) -> PortResult<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| panic!("no scripted reply left for {operation}"))
}

#[derive(Default)]
pub(crate) struct ScriptedContent {
    pub chat: Mutex<VecDeque<PortResult<ChatReply>>>,
    pub chat_only: Mutex<VecDeque<PortResult<String>>>,
    pub enhancements: Mutex<VecDeque<PortResult<String>>>,
    pub batches: Mutex<VecDeque<PortResult<Vec<BatchReply>>>>,
    pub quizzes: Mutex<VecDeque<PortResult<QuizPayload>>>,
    pub portraits: Mutex<VecDeque<PortResult<String>>>,
    pub video_starts: Mutex<VecDeque<PortResult<VideoTicket>>>,
    /// Status replies, in poll order. When exhausted, further queries
    /// answer `Processing` so cancellation tests can poll indefinitely.
    pub statuses: Mutex<VecDeque<PortResult<StatusReport>>>,
    pub podcasts: Mutex<VecDeque<PortResult<PodcastEpisode>>>,
    chat_count: AtomicUsize,
    status_count: AtomicUsize,
    probe_count: AtomicUsize,
    podcast_count: AtomicUsize,
}

impl ScriptedContent {
    pub fn chat_calls(&self) -> usize {
        self.chat_count.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_count.load(Ordering::SeqCst)
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    pub fn podcast_calls(&self) -> usize {
        self.podcast_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentService for ScriptedContent {
    async fn chat(
        &self,
        _notebook_id: &str,
        _prompt: &str,
        _enhance: bool,
    ) -> PortResult<ChatReply> {
        self.chat_count.fetch_add(1, Ordering::SeqCst);
        next(&self.chat, "chat")
    }

    async fn chat_only(&self, _notebook_id: &str, _prompt: &str) -> PortResult<String> {
        next(&self.chat_only, "chat_only")
    }

    async fn enhance(&self, _text: &str, _instructions: Option<&str>) -> PortResult<String> {
        next(&self.enhancements, "enhance")
    }

    async fn batch_chat(
        &self,
        _notebook_id: &str,
        _prompts: &[String],
        _enhance: bool,
    ) -> PortResult<Vec<BatchReply>> {
        next(&self.batches, "batch_chat")
    }

    async fn generate_quiz(&self, _content: &str) -> PortResult<QuizPayload> {
        next(&self.quizzes, "generate_quiz")
    }

    async fn generate_character(&self, _prompt: Option<&str>) -> PortResult<String> {
        next(&self.portraits, "generate_character")
    }

    async fn start_video(&self, _request: &VideoRequest) -> PortResult<VideoTicket> {
        next(&self.video_starts, "start_video")
    }

    async fn video_status(&self, _task_id: &str) -> PortResult<StatusReport> {
        self.status_count.fetch_add(1, Ordering::SeqCst);
        self.statuses.lock().unwrap().pop_front().unwrap_or(Ok(StatusReport {
            status: MediaStatus::Processing,
            created_at: None,
            result_locator: None,
        }))
    }

    async fn probe_video(&self, _task_id: &str) -> PortResult<bool> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn generate_podcast(
        &self,
        _notebook_id: &str,
        _speakers: Option<&SpeakerMap>,
    ) -> PortResult<PodcastEpisode> {
        self.podcast_count.fetch_add(1, Ordering::SeqCst);
        next(&self.podcasts, "generate_podcast")
    }
}

pub(crate) struct ScriptedStore {
    pub history: Mutex<Vec<String>>,
    /// Every `(session_key, encoded_entry)` pair that was written.
    pub stored: Mutex<Vec<(String, String)>>,
    /// Replies for `store_chat_message`; when exhausted, writes succeed.
    pub store_replies: Mutex<VecDeque<PortResult<bool>>>,
    pub topics: Mutex<Vec<Topic>>,
    pub characters: Mutex<Vec<Character>>,
    pub authorized: AtomicBool,
    pub login_ok: AtomicBool,
}

impl Default for ScriptedStore {
    fn default() -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            stored: Mutex::new(Vec::new()),
            store_replies: Mutex::new(VecDeque::new()),
            topics: Mutex::new(Vec::new()),
            characters: Mutex::new(Vec::new()),
            authorized: AtomicBool::new(true),
            login_ok: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl PersistenceService for ScriptedStore {
    async fn get_chat_history(&self, _session_key: &str) -> PortResult<Vec<String>> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn store_chat_message(
        &self,
        session_key: &str,
        encoded_entry: &str,
    ) -> PortResult<bool> {
        let reply = self
            .store_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(true));
        if matches!(reply, Ok(true)) {
            self.stored
                .lock()
                .unwrap()
                .push((session_key.to_string(), encoded_entry.to_string()));
            self.history
                .lock()
                .unwrap()
                .push(encoded_entry.to_string());
        }
        reply
    }

    async fn get_topics(&self) -> PortResult<Vec<Topic>> {
        Ok(self.topics.lock().unwrap().clone())
    }

    async fn add_topic(&self, notebook_id: &str, title: &str) -> PortResult<bool> {
        if !self.authorized.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.topics.lock().unwrap().push(Topic {
            notebook_id: notebook_id.to_string(),
            title: title.to_string(),
        });
        Ok(true)
    }

    async fn remove_topic(&self, notebook_id: &str) -> PortResult<bool> {
        if !self.authorized.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.topics
            .lock()
            .unwrap()
            .retain(|t| t.notebook_id != notebook_id);
        Ok(true)
    }

    async fn get_characters(&self) -> PortResult<Vec<Character>> {
        Ok(self.characters.lock().unwrap().clone())
    }

    async fn add_character(&self, character: &Character) -> PortResult<bool> {
        if !self.authorized.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.characters.lock().unwrap().push(character.clone());
        Ok(true)
    }

    async fn remove_character(&self, id: &str) -> PortResult<bool> {
        if !self.authorized.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.characters.lock().unwrap().retain(|c| c.id != id);
        Ok(true)
    }

    async fn login_user(&self, _user_name: &str) -> PortResult<bool> {
        Ok(self.login_ok.load(Ordering::SeqCst))
    }
}

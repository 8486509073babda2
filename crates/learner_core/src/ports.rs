//! crates/learner_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete transports used to reach the remote
//! content-generation service and the durable store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{Character, MediaStatus, PodcastEpisode, SpeakerMap, Topic};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
///
/// Remote failures are converted into this type at the port boundary; the
/// orchestration components then convert it into their own failure
/// representation (an error transcript message, a surfaced string, a failed
/// task) rather than letting it escape further.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Locally rejected input; no remote call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The remote service answered, but reported a failure.
    #[error("Service failure: {0}")]
    Service(String),
    /// The call itself failed (network, timeout, undecodable body).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The durable store refused an administrator operation.
    #[error("Not authorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Reply Payloads
//=========================================================================================

/// One generated chat answer, possibly post-processed by the enhancement
/// step.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// The text to display: the enhanced response when enhancement ran,
    /// the raw response otherwise.
    pub response: String,
    /// The raw response, kept alongside when enhancement rewrote it.
    pub original_response: Option<String>,
    pub enhanced: bool,
}

/// Outcome for one prompt of a batch request. The batch as a whole succeeds
/// even when individual prompts fail.
#[derive(Debug, Clone)]
pub struct BatchReply {
    pub prompt: String,
    pub outcome: Result<ChatReply, String>,
}

/// The structured question set as the generation service returns it, before
/// normalization by the quiz engine.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizPayload {
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionPayload {
    pub question: String,
    pub options: Vec<String>,
    /// Option letter (`A`–`D`, either case) or literal option text.
    pub correct: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Parameters for starting a video generation job.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub user_request: String,
    pub notebook_id: Option<String>,
    /// Presenter description the video should be built around.
    pub character: Option<String>,
}

/// Returned when the service accepts a video generation job.
#[derive(Debug, Clone)]
pub struct VideoTicket {
    pub task_id: String,
    pub message: Option<String>,
}

/// One answer to a video status query.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub status: MediaStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub result_locator: Option<String>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote AI content-generation service. Pure request/response; the
/// implementation holds no conversation state.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Generates a chat answer grounded in the given notebook, optionally
    /// running the enhancement post-processing step.
    async fn chat(&self, notebook_id: &str, prompt: &str, enhance: bool) -> PortResult<ChatReply>;

    /// Generates a raw answer with enhancement unconditionally disabled.
    async fn chat_only(&self, notebook_id: &str, prompt: &str) -> PortResult<String>;

    /// Rewrites arbitrary text, optionally steered by instructions.
    async fn enhance(&self, text: &str, instructions: Option<&str>) -> PortResult<String>;

    /// Answers several prompts in one round trip, reporting per-prompt
    /// success.
    async fn batch_chat(
        &self,
        notebook_id: &str,
        prompts: &[String],
        enhance: bool,
    ) -> PortResult<Vec<BatchReply>>;

    /// Turns free-form study material into a structured question set.
    async fn generate_quiz(&self, content: &str) -> PortResult<QuizPayload>;

    /// Generates a presenter portrait; returns the image as base64.
    async fn generate_character(&self, prompt: Option<&str>) -> PortResult<String>;

    /// Starts an asynchronous video generation job.
    async fn start_video(&self, request: &VideoRequest) -> PortResult<VideoTicket>;

    /// Queries the state of a running video job.
    async fn video_status(&self, task_id: &str) -> PortResult<StatusReport>;

    /// Lightweight reachability check of a finished video. The result is
    /// only ever used for diagnostic logging.
    async fn probe_video(&self, task_id: &str) -> PortResult<bool>;

    /// Generates a podcast; the finished artifact comes back in one call.
    async fn generate_podcast(
        &self,
        notebook_id: &str,
        speakers: Option<&SpeakerMap>,
    ) -> PortResult<PodcastEpisode>;
}

/// The durable store for topics, characters and chat transcripts. Pure
/// request/response; the implementation holds no conversation state.
///
/// Mutating operations return `false` when the store refuses them (the
/// caller is not an administrator); components map that to
/// [`PortError::Unauthorized`].
#[async_trait]
pub trait PersistenceService: Send + Sync {
    // --- Chat Transcripts ---

    /// Returns the opaque encoded log entries for a session, oldest first.
    async fn get_chat_history(&self, session_key: &str) -> PortResult<Vec<String>>;

    /// Appends one encoded entry to a session's log.
    async fn store_chat_message(&self, session_key: &str, encoded_entry: &str)
        -> PortResult<bool>;

    // --- Topic Catalog ---
    async fn get_topics(&self) -> PortResult<Vec<Topic>>;
    async fn add_topic(&self, notebook_id: &str, title: &str) -> PortResult<bool>;
    async fn remove_topic(&self, notebook_id: &str) -> PortResult<bool>;

    // --- Character Catalog ---
    async fn get_characters(&self) -> PortResult<Vec<Character>>;
    async fn add_character(&self, character: &Character) -> PortResult<bool>;
    async fn remove_character(&self, id: &str) -> PortResult<bool>;

    // --- Learner Login ---
    async fn login_user(&self, user_name: &str) -> PortResult<bool>;
}

//! crates/learner_core/src/domain.rs
//!
//! Defines the pure, core data structures for the learner application.
//! These structs are independent of any storage or transport format, with
//! one exception: `ChatMessage` carries serde derives because chat history
//! entries are persisted as JSON-encoded log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A study topic an administrator has made available to learners.
///
/// `notebook_id` is the opaque content-source identifier the generation
/// service is addressed with; it doubles as the topic's unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub notebook_id: String,
    pub title: String,
}

/// A video presenter persona, created once by an administrator and
/// immutable afterwards except for removal.
#[derive(Debug, Clone)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub description: String,
    pub portrait_base64: String,
    pub created_at: DateTime<Utc>,
}

/// Identifies one chat conversation: a learner working on one notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub user_name: String,
    pub notebook_id: String,
}

impl SessionKey {
    pub fn new(user_name: impl Into<String>, notebook_id: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            notebook_id: notebook_id.into(),
        }
    }

    /// The key under which the persistence service files this conversation.
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.user_name, self.notebook_id)
    }
}

/// Who (or what) produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    /// A locally produced failure notice. Never persisted.
    Error,
    /// A history entry that could not be decoded as structured data and is
    /// preserved verbatim instead of being dropped.
    System,
}

/// One entry in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    #[serde(default)]
    pub was_enhanced: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            original_content: None,
            was_enhanced: false,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        original_content: Option<String>,
        was_enhanced: bool,
    ) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            original_content,
            was_enhanced,
            timestamp: Utc::now(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Error,
            content: content.into(),
            original_content: None,
            was_enhanced: false,
            timestamp: Utc::now(),
        }
    }

    /// Wraps an undecodable history entry so it still shows up in the
    /// transcript.
    pub fn raw(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
            original_content: None,
            was_enhanced: false,
            timestamp: Utc::now(),
        }
    }
}

//=========================================================================================
// Quiz Data
//=========================================================================================

/// How the generation service encoded a question's correct answer.
///
/// The upstream format is ambiguous: `correct` may be an option letter
/// (`A`–`D`, either case) or the literal option text. The key is resolved
/// exactly once, when a quiz payload is normalized: a letter whose index
/// fits the option list becomes `Letter`, anything else (including an
/// out-of-range letter) is kept as the text it arrived as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
    /// Zero-based index into the question's options.
    Letter(usize),
    /// Raw answer text, compared verbatim against submitted answers.
    Literal(String),
}

impl AnswerKey {
    pub fn parse(raw: &str, option_count: usize) -> Self {
        let index = match raw {
            "A" | "a" => Some(0),
            "B" | "b" => Some(1),
            "C" | "c" => Some(2),
            "D" | "d" => Some(3),
            _ => None,
        };
        match index {
            Some(i) if i < option_count => AnswerKey::Letter(i),
            _ => AnswerKey::Literal(raw.to_string()),
        }
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: AnswerKey,
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// The option text a submitted answer is compared against.
    ///
    /// A `Literal` key that matches none of the options makes the question
    /// unwinnable; that is a property of the upstream data, not something
    /// this crate papers over.
    pub fn canonical_answer(&self) -> &str {
        match &self.answer {
            AnswerKey::Letter(index) => &self.options[*index],
            AnswerKey::Literal(text) => text,
        }
    }
}

/// A generated question set. Immutable once built; discarded on topic
/// change or retake.
#[derive(Debug, Clone)]
pub struct Quiz {
    pub topic: String,
    pub questions: Vec<QuizQuestion>,
    pub generated_at: DateTime<Utc>,
}

/// Mutable state for one quiz-taking session. Owned exclusively by the
/// quiz engine for the attempt's lifetime.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    /// Recorded answers, indexed by question position. `None` = unanswered.
    pub answers: Vec<Option<String>>,
    pub current: usize,
}

impl QuizAttempt {
    pub fn new(question_count: usize) -> Self {
        Self {
            answers: vec![None; question_count],
            current: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub correct: usize,
    pub total: usize,
    /// 0–100, rounded to the nearest integer.
    pub percentage: u32,
}

//=========================================================================================
// Media Generation Data
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Podcast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl MediaStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MediaStatus::Completed | MediaStatus::Failed)
    }
}

/// A long-running, server-side generation job tracked client-side.
///
/// Created on a successful generation-start call; `status` only moves
/// forward. Discarded when the user starts a new generation or navigates
/// away.
#[derive(Debug, Clone)]
pub struct MediaTask {
    /// Opaque, service-assigned identifier (a filename for video jobs).
    pub task_id: String,
    pub kind: MediaKind,
    pub status: MediaStatus,
    pub created_at: Option<DateTime<Utc>>,
    /// Where the finished artifact can be fetched, once known.
    pub result_locator: Option<String>,
}

/// A finished podcast: the service returns the whole artifact in one call.
#[derive(Debug, Clone)]
pub struct PodcastEpisode {
    pub audio: Vec<u8>,
    pub script: String,
    pub format: String,
}

/// Ordered speaker-name to voice-name assignment for podcast generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerMap(Vec<(String, String)>);

impl SpeakerMap {
    pub fn new(assignments: Vec<(String, String)>) -> Self {
        Self(assignments)
    }

    pub fn assignments(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SpeakerMap {
    /// The two-host default used when the learner does not customize
    /// speakers.
    fn default() -> Self {
        Self(vec![
            ("Joe".to_string(), "Kore".to_string()),
            ("Jane".to_string(), "Puck".to_string()),
        ])
    }
}

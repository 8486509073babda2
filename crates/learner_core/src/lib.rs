pub mod auth;
pub mod catalog;
pub mod chat;
pub mod domain;
pub mod enhance;
pub mod media;
pub mod ports;
pub mod quiz;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::CatalogManager;
pub use chat::ChatSessionManager;
pub use domain::{
    AnswerKey, Character, ChatMessage, ChatRole, MediaKind, MediaStatus, MediaTask,
    PodcastEpisode, Quiz, QuizAttempt, QuizQuestion, ScoreSummary, SessionKey, SpeakerMap, Topic,
};
pub use enhance::{BatchRunner, TextEnhancer, MAX_BATCH_PROMPTS};
pub use media::{MediaOrchestrator, DEFAULT_POLL_INTERVAL};
pub use ports::{ContentService, PersistenceService, PortError, PortResult};
pub use quiz::{QuizEngine, QuizPhase};

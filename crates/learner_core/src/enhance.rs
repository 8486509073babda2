//! crates/learner_core/src/enhance.rs
//!
//! Study tools built on the enhancement-capable endpoints: standalone text
//! enhancement and batched question answering.

use std::sync::Arc;

use crate::ports::{BatchReply, ContentService, PortError, PortResult};

/// Upper bound on prompts per batch request.
pub const MAX_BATCH_PROMPTS: usize = 10;

/// Rewrites learner-supplied text through the enhancement endpoint.
pub struct TextEnhancer {
    content: Arc<dyn ContentService>,
}

impl TextEnhancer {
    pub fn new(content: Arc<dyn ContentService>) -> Self {
        Self { content }
    }

    pub async fn enhance(&self, text: &str, instructions: Option<&str>) -> PortResult<String> {
        if text.trim().is_empty() {
            return Err(PortError::InvalidInput(
                "text to enhance must not be empty".to_string(),
            ));
        }
        let instructions = instructions.map(str::trim).filter(|i| !i.is_empty());
        self.content.enhance(text, instructions).await
    }
}

/// Answers a list of prompts against one notebook in a single round trip.
pub struct BatchRunner {
    content: Arc<dyn ContentService>,
    notebook_id: String,
}

impl BatchRunner {
    pub fn new(content: Arc<dyn ContentService>, notebook_id: impl Into<String>) -> Self {
        Self {
            content,
            notebook_id: notebook_id.into(),
        }
    }

    /// Runs the batch. Blank prompts are dropped before the request; an
    /// effectively empty or oversized batch is rejected without a network
    /// round trip. Per-prompt failures come back inside the replies.
    pub async fn run(&self, prompts: &[String], enhance: bool) -> PortResult<Vec<BatchReply>> {
        let prompts: Vec<String> = prompts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        if prompts.is_empty() {
            return Err(PortError::InvalidInput(
                "at least one prompt is required".to_string(),
            ));
        }
        if prompts.len() > MAX_BATCH_PROMPTS {
            return Err(PortError::InvalidInput(format!(
                "at most {MAX_BATCH_PROMPTS} prompts per batch"
            )));
        }

        self.content.batch_chat(&self.notebook_id, &prompts, enhance).await
    }
}

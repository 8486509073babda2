//! crates/learner_core/src/catalog.rs
//!
//! Administrator curation of the topic and character catalogs.
//!
//! Topics are plain records in the durable store. Characters are a small
//! pipeline: a portrait is generated by the content service first, and the
//! assembled character is persisted second; when the store refuses the
//! write, the generated portrait is discarded.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Character, Topic};
use crate::ports::{ContentService, PersistenceService, PortError, PortResult};

pub struct CatalogManager {
    content: Arc<dyn ContentService>,
    store: Arc<dyn PersistenceService>,
}

impl CatalogManager {
    pub fn new(content: Arc<dyn ContentService>, store: Arc<dyn PersistenceService>) -> Self {
        Self { content, store }
    }

    pub async fn topics(&self) -> PortResult<Vec<Topic>> {
        self.store.get_topics().await
    }

    pub async fn add_topic(&self, notebook_id: &str, title: &str) -> PortResult<()> {
        let notebook_id = notebook_id.trim();
        let title = title.trim();
        if notebook_id.is_empty() || title.is_empty() {
            return Err(PortError::InvalidInput(
                "both a notebook id and a title are required".to_string(),
            ));
        }
        if self.store.add_topic(notebook_id, title).await? {
            info!(notebook_id = %notebook_id, "topic added");
            Ok(())
        } else {
            Err(PortError::Unauthorized)
        }
    }

    pub async fn remove_topic(&self, notebook_id: &str) -> PortResult<()> {
        if self.store.remove_topic(notebook_id).await? {
            Ok(())
        } else {
            Err(PortError::Unauthorized)
        }
    }

    pub async fn characters(&self) -> PortResult<Vec<Character>> {
        self.store.get_characters().await
    }

    /// Generates a portrait for a new presenter character and persists it.
    ///
    /// The visual prompt defaults to `"A {description}"` when the
    /// administrator does not supply one.
    pub async fn create_character(
        &self,
        name: &str,
        description: &str,
        visual_prompt: Option<&str>,
    ) -> PortResult<Character> {
        let name = name.trim();
        let description = description.trim();
        if name.is_empty() || description.is_empty() {
            return Err(PortError::InvalidInput(
                "a character name and description are required".to_string(),
            ));
        }

        let prompt = visual_prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("A {description}"));

        let portrait = self.content.generate_character(Some(&prompt)).await?;

        let character = Character {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            portrait_base64: portrait,
            created_at: Utc::now(),
        };

        if self.store.add_character(&character).await? {
            info!(id = %character.id, name = %character.name, "character created");
            Ok(character)
        } else {
            Err(PortError::Unauthorized)
        }
    }

    pub async fn remove_character(&self, id: &str) -> PortResult<()> {
        if self.store.remove_character(id).await? {
            Ok(())
        } else {
            Err(PortError::Unauthorized)
        }
    }
}

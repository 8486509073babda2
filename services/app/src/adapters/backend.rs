//! services/app/src/adapters/backend.rs
//!
//! This module contains the adapter for the durable store backing topics,
//! characters and chat transcripts. It implements the `PersistenceService`
//! port from the `core` crate over the backend's JSON HTTP API.
//!
//! Administrator mutations are authorized with an identity token that the
//! store hands out at login. The token lives in a swappable slot so a
//! login or logout rotates credentials without rebuilding any component;
//! a refused mutation comes back as `false`, which the core maps to
//! `Unauthorized`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learner_core::domain::{Character, Topic};
use learner_core::ports::{PersistenceService, PortError, PortResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `PersistenceService` port against the
/// backend store.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    identity: RwLock<Option<String>>,
}

impl BackendClient {
    /// Creates a new `BackendClient` with no identity attached.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url: String = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http,
            base_url,
            identity: RwLock::new(None),
        }
    }

    /// Swaps the identity used to authorize administrator calls. Pass
    /// `None` on logout.
    pub async fn set_identity(&self, token: Option<String>) {
        *self.identity.write().await = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.identity.read().await.as_ref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        let request = self.authorize(self.http.get(self.url(path))).await;
        let response = request.send().await.map_err(transport)?;
        response
            .error_for_status()
            .map_err(transport)?
            .json::<T>()
            .await
            .map_err(transport)
    }

    /// Sends a mutation and decodes the store's boolean verdict. A `403`
    /// is the same answer as an explicit `false`: not authorized.
    async fn mutate(&self, request: reqwest::RequestBuilder) -> PortResult<bool> {
        let request = self.authorize(request).await;
        let response = request.send().await.map_err(transport)?;
        if response.status() == StatusCode::FORBIDDEN {
            return Ok(false);
        }
        response
            .error_for_status()
            .map_err(transport)?
            .json::<bool>()
            .await
            .map_err(transport)
    }
}

fn transport(e: reqwest::Error) -> PortError {
    PortError::Transport(e.to_string())
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct TopicRecord {
    notebook_id: String,
    title: String,
}

impl TopicRecord {
    fn to_domain(self) -> Topic {
        Topic {
            notebook_id: self.notebook_id,
            title: self.title,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CharacterRecord {
    id: String,
    name: String,
    description: String,
    image_base64: String,
    created_at: DateTime<Utc>,
}

impl CharacterRecord {
    fn to_domain(self) -> Character {
        Character {
            id: self.id,
            name: self.name,
            description: self.description,
            portrait_base64: self.image_base64,
            created_at: self.created_at,
        }
    }

    fn from_domain(character: &Character) -> Self {
        Self {
            id: character.id.clone(),
            name: character.name.clone(),
            description: character.description.clone(),
            image_base64: character.portrait_base64.clone(),
            created_at: character.created_at,
        }
    }
}

//=========================================================================================
// `PersistenceService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersistenceService for BackendClient {
    async fn get_chat_history(&self, session_key: &str) -> PortResult<Vec<String>> {
        self.fetch(&format!("/api/sessions/{session_key}/messages"))
            .await
    }

    async fn store_chat_message(
        &self,
        session_key: &str,
        encoded_entry: &str,
    ) -> PortResult<bool> {
        let request = self
            .http
            .post(self.url(&format!("/api/sessions/{session_key}/messages")))
            .json(&json!({ "message": encoded_entry }));
        self.mutate(request).await
    }

    async fn get_topics(&self) -> PortResult<Vec<Topic>> {
        let records: Vec<TopicRecord> = self.fetch("/api/topics").await?;
        Ok(records.into_iter().map(TopicRecord::to_domain).collect())
    }

    async fn add_topic(&self, notebook_id: &str, title: &str) -> PortResult<bool> {
        let request = self.http.post(self.url("/api/topics")).json(&json!({
            "notebook_id": notebook_id,
            "title": title,
        }));
        self.mutate(request).await
    }

    async fn remove_topic(&self, notebook_id: &str) -> PortResult<bool> {
        let request = self.http.delete(self.url(&format!("/api/topics/{notebook_id}")));
        self.mutate(request).await
    }

    async fn get_characters(&self) -> PortResult<Vec<Character>> {
        let records: Vec<CharacterRecord> = self.fetch("/api/characters").await?;
        Ok(records.into_iter().map(CharacterRecord::to_domain).collect())
    }

    async fn add_character(&self, character: &Character) -> PortResult<bool> {
        let request = self
            .http
            .post(self.url("/api/characters"))
            .json(&CharacterRecord::from_domain(character));
        self.mutate(request).await
    }

    async fn remove_character(&self, id: &str) -> PortResult<bool> {
        let request = self.http.delete(self.url(&format!("/api/characters/{id}")));
        self.mutate(request).await
    }

    async fn login_user(&self, user_name: &str) -> PortResult<bool> {
        let request = self
            .http
            .post(self.url("/api/login"))
            .json(&json!({ "user_name": user_name }));
        self.mutate(request).await
    }
}

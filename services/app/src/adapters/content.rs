//! services/app/src/adapters/content.rs
//!
//! This module contains the adapter for the remote content-generation
//! proxy. It implements the `ContentService` port from the `core` crate
//! over the proxy's JSON HTTP API.
//!
//! The proxy wraps every reply in a `{success, error, ...}` envelope; a
//! `success: false` envelope is mapped to `PortError::Service` here so the
//! core never has to look at wire flags.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use learner_core::domain::{MediaStatus, PodcastEpisode, SpeakerMap};
use learner_core::ports::{
    BatchReply, ChatReply, ContentService, PortError, PortResult, QuizPayload, StatusReport,
    VideoRequest, VideoTicket,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ContentService` port against the
/// NotebookLM-style generation proxy.
#[derive(Clone)]
pub struct NotebookApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NotebookApiClient {
    /// Creates a new `NotebookApiClient`.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let mut base_url: String = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http,
            base_url,
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL a finished video can be streamed or downloaded from.
    pub fn video_url(&self, task_id: &str) -> String {
        self.url(&format!("/api/v1/video/{task_id}"))
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-API-Key", key),
            None => request,
        }
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> PortResult<T> {
        let request = self.with_key(self.http.post(self.url(path)).json(body));
        let response = request.send().await.map_err(transport)?;
        response.json::<T>().await.map_err(transport)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        let request = self.with_key(self.http.get(self.url(path)));
        let response = request.send().await.map_err(transport)?;
        response.json::<T>().await.map_err(transport)
    }
}

fn transport(e: reqwest::Error) -> PortError {
    PortError::Transport(e.to_string())
}

fn service_failure(error: Option<String>, fallback: &str) -> PortError {
    PortError::Service(error.unwrap_or_else(|| fallback.to_string()))
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct ChatWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    enhanced_response: Option<String>,
    #[serde(default)]
    original_response: Option<String>,
    #[serde(default)]
    enhanced: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct EnhanceWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    enhanced_text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct BatchWire {
    #[serde(default)]
    results: Vec<BatchItemWire>,
}

#[derive(Deserialize)]
struct BatchItemWire {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    enhanced_response: Option<String>,
    #[serde(default)]
    original_response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl BatchItemWire {
    fn to_reply(self) -> BatchReply {
        let outcome = if self.success {
            let enhanced = self.enhanced_response.is_some();
            match self.enhanced_response.or_else(|| self.original_response.clone()) {
                Some(response) => Ok(ChatReply {
                    response,
                    original_response: self.original_response,
                    enhanced,
                }),
                None => Err("response contained no text".to_string()),
            }
        } else {
            Err(self.error.unwrap_or_else(|| "Failed to process".to_string()))
        };
        BatchReply {
            prompt: self.prompt,
            outcome,
        }
    }
}

#[derive(Deserialize)]
struct QuizWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    quiz: Option<QuizPayload>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct CharacterWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    character_image_base64: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct VideoStartWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct VideoStatusWire {
    #[serde(default)]
    status: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    created_at: Option<i64>,
}

#[derive(Deserialize)]
struct PodcastWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    script: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_status(raw: &str) -> MediaStatus {
    match raw {
        "queued" => MediaStatus::Queued,
        "processing" => MediaStatus::Processing,
        "completed" => MediaStatus::Completed,
        "failed" => MediaStatus::Failed,
        other => {
            // An unknown status keeps the poll loop alive rather than
            // wedging the task.
            warn!(status = %other, "unrecognized video status");
            MediaStatus::Processing
        }
    }
}

//=========================================================================================
// `ContentService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentService for NotebookApiClient {
    async fn chat(&self, notebook_id: &str, prompt: &str, enhance: bool) -> PortResult<ChatReply> {
        let body = json!({
            "notebook_id": notebook_id,
            "prompt": prompt,
            "enhance": enhance,
        });
        let wire: ChatWire = self.post("/api/v1/chat", &body).await?;
        if !wire.success {
            return Err(service_failure(wire.error, "chat request failed"));
        }

        let response = wire
            .enhanced_response
            .or(wire.response)
            .ok_or_else(|| PortError::Service("chat reply contained no text".to_string()))?;
        Ok(ChatReply {
            response,
            original_response: wire.original_response,
            enhanced: wire.enhanced,
        })
    }

    async fn chat_only(&self, notebook_id: &str, prompt: &str) -> PortResult<String> {
        let body = json!({
            "notebook_id": notebook_id,
            "prompt": prompt,
        });
        let wire: ChatWire = self.post("/api/v1/chat-only", &body).await?;
        if !wire.success {
            return Err(service_failure(wire.error, "chat-only request failed"));
        }
        wire.response
            .ok_or_else(|| PortError::Service("chat reply contained no text".to_string()))
    }

    async fn enhance(&self, text: &str, instructions: Option<&str>) -> PortResult<String> {
        let mut body = json!({ "text": text });
        if let Some(instructions) = instructions {
            body["prompt"] = json!(instructions);
        }
        let wire: EnhanceWire = self.post("/api/v1/enhance", &body).await?;
        if !wire.success {
            return Err(service_failure(wire.error, "enhancement failed"));
        }
        wire.enhanced_text
            .ok_or_else(|| PortError::Service("enhancement reply contained no text".to_string()))
    }

    async fn batch_chat(
        &self,
        notebook_id: &str,
        prompts: &[String],
        enhance: bool,
    ) -> PortResult<Vec<BatchReply>> {
        let body = json!({
            "notebook_id": notebook_id,
            "prompts": prompts,
            "enhance": enhance,
        });
        let wire: BatchWire = self.post("/api/v1/batch-chat", &body).await?;
        Ok(wire.results.into_iter().map(BatchItemWire::to_reply).collect())
    }

    async fn generate_quiz(&self, content: &str) -> PortResult<QuizPayload> {
        let body = json!({ "content": content });
        let wire: QuizWire = self.post("/api/v1/generate-quiz", &body).await?;
        if !wire.success {
            return Err(service_failure(wire.error, "quiz generation failed"));
        }
        wire.quiz
            .ok_or_else(|| PortError::Service("quiz reply contained no questions".to_string()))
    }

    async fn generate_character(&self, prompt: Option<&str>) -> PortResult<String> {
        let body = match prompt {
            Some(prompt) => json!({ "prompt": prompt }),
            None => json!({}),
        };
        let wire: CharacterWire = self.post("/api/v1/generate-character", &body).await?;
        if !wire.success {
            return Err(service_failure(wire.error, "character generation failed"));
        }
        wire.character_image_base64
            .ok_or_else(|| PortError::Service("character reply contained no image".to_string()))
    }

    async fn start_video(&self, request: &VideoRequest) -> PortResult<VideoTicket> {
        let mut body = json!({ "user_request": request.user_request });
        if let Some(notebook_id) = &request.notebook_id {
            body["notebook_id"] = json!(notebook_id);
        }
        if let Some(character) = &request.character {
            body["character"] = json!(character);
        }
        let wire: VideoStartWire = self.post("/api/v1/generate-video", &body).await?;
        if !wire.success {
            return Err(service_failure(wire.error, "video generation failed"));
        }
        let task_id = wire
            .filename
            .ok_or_else(|| PortError::Service("video reply contained no filename".to_string()))?;
        Ok(VideoTicket {
            task_id,
            message: wire.message,
        })
    }

    async fn video_status(&self, task_id: &str) -> PortResult<StatusReport> {
        let wire: VideoStatusWire = self
            .get(&format!("/api/v1/video-status/{task_id}"))
            .await?;
        let status = parse_status(wire.status.as_deref().unwrap_or("processing"));
        let result_locator =
            (status == MediaStatus::Completed).then(|| self.video_url(task_id));
        Ok(StatusReport {
            status,
            created_at: wire
                .created_at
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            result_locator,
        })
    }

    async fn probe_video(&self, task_id: &str) -> PortResult<bool> {
        let request = self.with_key(self.http.head(self.video_url(task_id)));
        match request.send().await {
            Ok(response) => Ok(response.status().is_success()),
            // The probe is diagnostic only; an unreachable endpoint is the
            // same answer as a missing file.
            Err(_) => Ok(false),
        }
    }

    async fn generate_podcast(
        &self,
        notebook_id: &str,
        speakers: Option<&SpeakerMap>,
    ) -> PortResult<PodcastEpisode> {
        let mut body = json!({ "notebook_id": notebook_id });
        if let Some(map) = speakers {
            let assignments: serde_json::Map<String, Value> = map
                .assignments()
                .iter()
                .map(|(name, voice)| (name.clone(), json!(voice)))
                .collect();
            body["speakers"] = Value::Object(assignments);
        }
        let wire: PodcastWire = self.post("/api/v1/generate-podcast", &body).await?;
        if !wire.success {
            return Err(service_failure(wire.error, "podcast generation failed"));
        }

        let audio_base64 = wire
            .audio
            .ok_or_else(|| PortError::Service("podcast reply contained no audio".to_string()))?;
        let audio = BASE64
            .decode(audio_base64.as_bytes())
            .map_err(|e| PortError::Service(format!("podcast audio was not valid base64: {e}")))?;

        Ok(PodcastEpisode {
            audio,
            script: wire.script.unwrap_or_default(),
            format: wire.format.unwrap_or_else(|| "wav".to_string()),
        })
    }
}

//! crates/learner_core/src/media.rs
//!
//! Driver for long-running media generation jobs.
//!
//! Video generation is asynchronous on the service side: after an accepted
//! start call the orchestrator polls the job's status on a fixed interval
//! until it reports `completed` or `failed`, or the caller cancels. Podcast
//! generation is a single request/response call and needs no polling.
//!
//! The poll loop is single-flight and resilient: a failed status query is
//! logged and the loop keeps going; only an explicit terminal status ends
//! it. Cancellation is cooperative: the token is checked before every new
//! query is scheduled and again when an in-flight query returns, so its
//! result is discarded rather than applied.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::{MediaKind, MediaStatus, MediaTask, PodcastEpisode, SpeakerMap};
use crate::ports::{ContentService, PortError, PortResult, VideoRequest};

/// How often a running video job is asked for its status.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

pub struct MediaOrchestrator {
    content: Arc<dyn ContentService>,
    poll_interval: Duration,
    video: Option<VideoHandle>,
}

struct VideoHandle {
    cancel: CancellationToken,
    status_rx: watch::Receiver<MediaTask>,
}

impl MediaOrchestrator {
    pub fn new(content: Arc<dyn ContentService>) -> Self {
        Self::with_poll_interval(content, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(content: Arc<dyn ContentService>, poll_interval: Duration) -> Self {
        Self {
            content,
            poll_interval,
            video: None,
        }
    }

    /// Starts a new video generation job, superseding any job still being
    /// tracked. Returns the initial task snapshot once the service accepts;
    /// a rejected or failed start call performs no polling and leaves no
    /// task behind.
    pub async fn start_video(&mut self, request: VideoRequest) -> PortResult<MediaTask> {
        if request.user_request.trim().is_empty() {
            return Err(PortError::InvalidInput(
                "video request must not be empty".to_string(),
            ));
        }

        self.cancel_video();

        let ticket = self.content.start_video(&request).await?;
        if let Some(message) = &ticket.message {
            info!(task_id = %ticket.task_id, "video generation accepted: {message}");
        }

        let task = MediaTask {
            task_id: ticket.task_id.clone(),
            kind: MediaKind::Video,
            status: MediaStatus::Processing,
            created_at: None,
            result_locator: None,
        };

        let (status_tx, status_rx) = watch::channel(task.clone());
        let cancel = CancellationToken::new();
        tokio::spawn(poll_until_terminal(
            self.content.clone(),
            ticket.task_id,
            self.poll_interval,
            cancel.clone(),
            status_tx,
        ));

        self.video = Some(VideoHandle { cancel, status_rx });
        Ok(task)
    }

    /// Latest snapshot of the tracked video job, if any.
    pub fn video_task(&self) -> Option<MediaTask> {
        self.video.as_ref().map(|h| h.status_rx.borrow().clone())
    }

    /// A receiver the UI can watch for status transitions.
    pub fn watch_video(&self) -> Option<watch::Receiver<MediaTask>> {
        self.video.as_ref().map(|h| h.status_rx.clone())
    }

    /// Waits until the tracked job reaches `Completed` or `Failed`. If the
    /// job is cancelled first, returns the last snapshot seen.
    pub async fn await_video(&self) -> Option<MediaTask> {
        let mut rx = self.watch_video()?;
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.status.is_terminal() {
                return Some(snapshot);
            }
            if rx.changed().await.is_err() {
                return Some(rx.borrow().clone());
            }
        }
    }

    /// Stops tracking the current job and halts its poll loop. No status
    /// query is issued after this returns; a query already in flight has
    /// its result discarded. Must be called when the job is discarded, when
    /// a new generation starts, and on teardown (`Drop` does the latter).
    pub fn cancel_video(&mut self) {
        if let Some(handle) = self.video.take() {
            handle.cancel.cancel();
        }
    }

    /// Generates a podcast in one synchronous round trip.
    pub async fn generate_podcast(
        &self,
        notebook_id: &str,
        speakers: Option<&SpeakerMap>,
    ) -> PortResult<PodcastEpisode> {
        if notebook_id.trim().is_empty() {
            return Err(PortError::InvalidInput(
                "a notebook id is required".to_string(),
            ));
        }
        if let Some(map) = speakers {
            if map.len() < 2 || map.len() > 5 {
                return Err(PortError::InvalidInput(
                    "a podcast needs between 2 and 5 speakers".to_string(),
                ));
            }
        }
        self.content.generate_podcast(notebook_id, speakers).await
    }
}

impl Drop for MediaOrchestrator {
    fn drop(&mut self) {
        self.cancel_video();
    }
}

async fn poll_until_terminal(
    content: Arc<dyn ContentService>,
    task_id: String,
    interval: Duration,
    cancel: CancellationToken,
    status_tx: watch::Sender<MediaTask>,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(task_id = %task_id, "video polling cancelled");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
        // Checked again so a cancel that raced the timer never schedules
        // another query.
        if cancel.is_cancelled() {
            info!(task_id = %task_id, "video polling cancelled");
            return;
        }

        let report = content.video_status(&task_id).await;
        if cancel.is_cancelled() {
            // The job was discarded while this query was in flight.
            return;
        }

        match report {
            Ok(report) => {
                let status = report.status;
                status_tx.send_modify(|task| {
                    task.status = status;
                    if report.created_at.is_some() {
                        task.created_at = report.created_at;
                    }
                    if report.result_locator.is_some() {
                        task.result_locator = report.result_locator.clone();
                    }
                });
                match status {
                    MediaStatus::Completed => {
                        probe_result(content.as_ref(), &task_id).await;
                        return;
                    }
                    MediaStatus::Failed => {
                        error!(task_id = %task_id, "video generation failed");
                        return;
                    }
                    MediaStatus::Queued | MediaStatus::Processing => {}
                }
            }
            // A failed query does not stop the loop; the next interval
            // retries.
            Err(e) => warn!(task_id = %task_id, "video status check failed: {e}"),
        }
    }
}

/// Best-effort reachability check of the finished artifact. The outcome is
/// diagnostic only and never changes task state.
async fn probe_result(content: &dyn ContentService, task_id: &str) {
    match content.probe_video(task_id).await {
        Ok(true) => info!(task_id = %task_id, "generated video is reachable"),
        Ok(false) => warn!(task_id = %task_id, "generated video is not reachable for streaming"),
        Err(e) => warn!(task_id = %task_id, "video reachability probe failed: {e}"),
    }
}

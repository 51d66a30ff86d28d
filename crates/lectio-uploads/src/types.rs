//! Submission requests, handles, and outcomes.

use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use lectio_core::MediaFile;

/// Callback invoked once after a successful publication.
pub type CompletionFn = Box<dyn FnOnce() + Send + 'static>;

/// Everything needed to publish one lesson.
pub struct UploadRequest {
    /// Primary media payload, image or video.
    pub file: MediaFile,
    /// Optional companion document stored alongside the lesson.
    pub companion_file: Option<MediaFile>,
    pub title: String,
    /// Course module the lesson belongs to.
    pub module: String,
    /// Instructor shown on the lesson. A blank value falls back to the
    /// configured default.
    pub instructor: String,
    /// Explicit duration override in minutes. Videos derive it from the
    /// probe when absent.
    pub duration_minutes: Option<u32>,
    /// Id of the submitting user, recorded as `created_by`.
    pub user_id: String,
    /// Invoked after the success notification. Never invoked on failure.
    pub on_complete: Option<CompletionFn>,
}

impl UploadRequest {
    pub fn new(file: MediaFile, title: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            file,
            companion_file: None,
            title: title.into(),
            module: module.into(),
            instructor: String::new(),
            duration_minutes: None,
            user_id: String::new(),
            on_complete: None,
        }
    }
}

/// Why a submission was rejected before any work started.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Upload title must not be blank")]
    BlankTitle,

    #[error("Upload file must not be empty")]
    EmptyFile,
}

/// Terminal result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Completed {
        media_url: String,
        companion_url: Option<String>,
    },
    Failed {
        reason: String,
    },
}

/// Handle to a submitted upload.
///
/// The pipeline run proceeds whether or not the handle is awaited; dropping
/// it only discards the outcome.
#[derive(Debug)]
pub struct UploadHandle {
    pub task_id: Uuid,
    join: JoinHandle<UploadOutcome>,
}

impl UploadHandle {
    pub(crate) fn new(task_id: Uuid, join: JoinHandle<UploadOutcome>) -> Self {
        Self { task_id, join }
    }

    /// Wait for the pipeline run to finish.
    pub async fn wait(self) -> UploadOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => UploadOutcome::Failed {
                reason: format!("upload task aborted: {e}"),
            },
        }
    }
}

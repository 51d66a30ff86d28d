use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::media::MediaKind;

/// Stage of an upload task as shown to progress consumers.
///
/// Legal transitions run `compressing → uploading → (uploading_companion) →
/// completed`; `error` is reachable from any non-terminal stage. `completed`
/// and `error` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Compressing,
    Uploading,
    UploadingCompanion,
    Completed,
    Error,
}

impl UploadStatus {
    /// Terminal statuses are never left once entered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Error)
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Compressing => write!(f, "compressing"),
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::UploadingCompanion => write!(f, "uploading_companion"),
            UploadStatus::Completed => write!(f, "completed"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for UploadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compressing" => Ok(UploadStatus::Compressing),
            "uploading" => Ok(UploadStatus::Uploading),
            "uploading_companion" => Ok(UploadStatus::UploadingCompanion),
            "completed" => Ok(UploadStatus::Completed),
            "error" => Ok(UploadStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid upload status: {}", s)),
        }
    }
}

/// One user-initiated media publication attempt, as tracked by the registry.
///
/// The registry owns every task for its full lifetime; only the pipeline run
/// processing a task mutates its `status`/`progress` fields. `progress` is an
/// integer percentage that is meaningful only while the task is non-terminal
/// and resets to 0 at stage transitions. A task in `error` keeps its last
/// recorded progress, but consumers must not interpret it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTask {
    pub id: Uuid,
    pub title: String,
    pub kind: MediaKind,
    pub status: UploadStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}

impl UploadTask {
    /// Create a task in its initial state (`compressing`, progress 0).
    pub fn new(title: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            status: UploadStatus::Compressing,
            progress: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_status_display() {
        assert_eq!(UploadStatus::Compressing.to_string(), "compressing");
        assert_eq!(UploadStatus::Uploading.to_string(), "uploading");
        assert_eq!(
            UploadStatus::UploadingCompanion.to_string(),
            "uploading_companion"
        );
        assert_eq!(UploadStatus::Completed.to_string(), "completed");
        assert_eq!(UploadStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_upload_status_from_str() {
        assert_eq!(
            "compressing".parse::<UploadStatus>().unwrap(),
            UploadStatus::Compressing
        );
        assert_eq!(
            "uploading".parse::<UploadStatus>().unwrap(),
            UploadStatus::Uploading
        );
        assert_eq!(
            "uploading_companion".parse::<UploadStatus>().unwrap(),
            UploadStatus::UploadingCompanion
        );
        assert_eq!(
            "completed".parse::<UploadStatus>().unwrap(),
            UploadStatus::Completed
        );
        assert_eq!("error".parse::<UploadStatus>().unwrap(), UploadStatus::Error);
        assert!("invalid_status".parse::<UploadStatus>().is_err());
    }

    #[test]
    fn test_upload_status_terminal() {
        assert!(UploadStatus::Completed.is_terminal());
        assert!(UploadStatus::Error.is_terminal());
        assert!(!UploadStatus::Compressing.is_terminal());
        assert!(!UploadStatus::Uploading.is_terminal());
        assert!(!UploadStatus::UploadingCompanion.is_terminal());
    }

    #[test]
    fn test_upload_status_serde_snake_case() {
        let json = serde_json::to_string(&UploadStatus::UploadingCompanion).unwrap();
        assert_eq!(json, "\"uploading_companion\"");
        let status: UploadStatus = serde_json::from_str("\"compressing\"").unwrap();
        assert_eq!(status, UploadStatus::Compressing);
    }

    #[test]
    fn test_new_task_initial_state() {
        let task = UploadTask::new("Intro", MediaKind::Video);
        assert_eq!(task.title, "Intro");
        assert_eq!(task.kind, MediaKind::Video);
        assert_eq!(task.status, UploadStatus::Compressing);
        assert_eq!(task.progress, 0);
        assert!(!task.is_terminal());
    }

    #[test]
    fn test_new_tasks_get_distinct_ids() {
        let a = UploadTask::new("A", MediaKind::Image);
        let b = UploadTask::new("A", MediaKind::Image);
        assert_ne!(a.id, b.id);
    }
}

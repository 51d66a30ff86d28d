use serde::{Deserialize, Serialize};

/// The single flat record written to the metadata store when an upload
/// pipeline run finishes successfully.
///
/// `duration_minutes` is video-only: the caller's value wins, otherwise the
/// pipeline fills in the duration probed during transcoding, otherwise it is
/// left empty. `companion_doc_url` is set only when a companion document was
/// uploaded alongside the media.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewLesson {
    pub title: String,
    pub module: String,
    pub duration_minutes: Option<u32>,
    pub media_url: String,
    pub companion_doc_url: Option<String>,
    pub instructor: String,
    pub created_by: String,
}

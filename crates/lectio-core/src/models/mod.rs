pub mod lesson;
pub mod media;
pub mod task;

pub use lesson::NewLesson;
pub use media::{MediaFile, MediaKind};
pub use task::{UploadStatus, UploadTask};

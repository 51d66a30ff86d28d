//! Lectio Uploads Library
//!
//! Orchestration for lesson publication: a shared task registry for progress
//! display, the seams for catalog persistence and user notification, and the
//! pipeline that compresses, stores, and records each submitted lesson.

pub mod catalog;
pub mod notify;
pub mod pipeline;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use catalog::{CatalogError, LessonCatalog};
pub use notify::{LogNotifier, Notifier};
pub use pipeline::{PipelineSettings, UploadPipeline};
pub use registry::UploadRegistry;
pub use types::{CompletionFn, SubmitError, UploadHandle, UploadOutcome, UploadRequest};

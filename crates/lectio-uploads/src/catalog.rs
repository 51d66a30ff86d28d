//! Lesson catalog seam.

use async_trait::async_trait;
use thiserror::Error;

use lectio_core::NewLesson;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog insert failed: {0}")]
    InsertFailed(String),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Destination for published lesson records.
///
/// Abstracts the host application's database so orchestration never touches
/// it directly. An insert must be all-or-nothing: on error no partial record
/// may remain visible.
#[async_trait]
pub trait LessonCatalog: Send + Sync {
    async fn insert(&self, lesson: NewLesson) -> Result<(), CatalogError>;
}

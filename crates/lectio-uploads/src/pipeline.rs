//! Lesson publication pipeline
//!
//! Orchestrates the complete publication workflow for one submitted lesson:
//! compress → store media → store companion → record lesson → notify.
//! Each submission runs on its own task; observers follow along through the
//! shared [`UploadRegistry`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use uuid::Uuid;

use lectio_core::{NewLesson, UploadStatus};
use lectio_media::{Compress, ProgressFn};
use lectio_storage::{keys, ContentStore};

use crate::catalog::LessonCatalog;
use crate::notify::Notifier;
use crate::registry::UploadRegistry;
use crate::types::{CompletionFn, SubmitError, UploadHandle, UploadOutcome, UploadRequest};

/// Pipeline knobs that do not belong to any single collaborator.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub media_key_prefix: String,
    pub companion_key_prefix: String,
    pub default_instructor: String,
}

impl PipelineSettings {
    pub fn from_config(config: &lectio_core::Config) -> Self {
        Self {
            media_key_prefix: config.media_key_prefix.clone(),
            companion_key_prefix: config.companion_key_prefix.clone(),
            default_instructor: config.default_instructor.clone(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&lectio_core::Config::default())
    }
}

/// Entry point for lesson publication.
///
/// Cloning is cheap; clones share the registry and collaborators.
#[derive(Clone)]
pub struct UploadPipeline {
    registry: UploadRegistry,
    compressor: Arc<dyn Compress>,
    store: Arc<dyn ContentStore>,
    catalog: Arc<dyn LessonCatalog>,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
}

/// What a successful run produced, before the outcome is reported.
struct PublishedLesson {
    media_url: String,
    companion_url: Option<String>,
    on_complete: Option<CompletionFn>,
}

impl UploadPipeline {
    pub fn new(
        registry: UploadRegistry,
        compressor: Arc<dyn Compress>,
        store: Arc<dyn ContentStore>,
        catalog: Arc<dyn LessonCatalog>,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            compressor,
            store,
            catalog,
            notifier,
            settings,
        }
    }

    /// The registry tracking this pipeline's tasks, for progress display.
    pub fn registry(&self) -> &UploadRegistry {
        &self.registry
    }

    /// Validate and launch one lesson publication.
    ///
    /// Returns as soon as the task is registered; the run proceeds in the
    /// background. On return the task is already visible in the registry.
    pub async fn submit(&self, request: UploadRequest) -> Result<UploadHandle, SubmitError> {
        if request.title.trim().is_empty() {
            return Err(SubmitError::BlankTitle);
        }
        if request.file.is_empty() {
            return Err(SubmitError::EmptyFile);
        }

        let kind = request.file.kind();
        let id = self.registry.register(&request.title, kind).await;

        tracing::info!(
            task_id = %id,
            file = %request.file.name,
            size_bytes = request.file.len(),
            kind = %kind,
            has_companion = request.companion_file.is_some(),
            "Upload accepted"
        );

        let pipeline = self.clone();
        let join = tokio::spawn(async move { pipeline.run(id, request).await });

        Ok(UploadHandle::new(id, join))
    }

    /// Drive one registered task to a terminal state.
    async fn run(self, id: Uuid, request: UploadRequest) -> UploadOutcome {
        let title = request.title.clone();

        match self.execute(id, request).await {
            Ok(published) => {
                self.registry
                    .update_progress(id, 100, UploadStatus::Completed)
                    .await;
                self.notifier.notify_published(&title).await;
                if let Some(on_complete) = published.on_complete {
                    on_complete();
                }

                tracing::info!(task_id = %id, media_url = %published.media_url, "Upload completed");
                UploadOutcome::Completed {
                    media_url: published.media_url,
                    companion_url: published.companion_url,
                }
            }
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::error!(task_id = %id, error = %reason, "Upload failed");

                // Keep the last recorded progress so the overlay shows where
                // the run stopped. Failed tasks are not auto-evicted.
                let progress = self
                    .registry
                    .get(id)
                    .await
                    .map(|task| task.progress)
                    .unwrap_or(0);
                self.registry
                    .update_progress(id, progress, UploadStatus::Error)
                    .await;
                self.notifier.notify_failed(&title, &reason).await;

                UploadOutcome::Failed { reason }
            }
        }
    }

    async fn execute(&self, id: Uuid, request: UploadRequest) -> Result<PublishedLesson> {
        let UploadRequest {
            file,
            companion_file,
            title,
            module,
            instructor,
            duration_minutes,
            user_id,
            on_complete,
        } = request;
        let kind = file.kind();

        // 1. Compress the media payload, streaming codec progress into the
        //    registry.
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<u8>();
        let forwarder = tokio::spawn({
            let registry = self.registry.clone();
            async move {
                while let Some(pct) = progress_rx.recv().await {
                    registry
                        .update_progress(id, pct, UploadStatus::Compressing)
                        .await;
                }
            }
        });
        let on_progress: ProgressFn = Arc::new(move |pct| {
            let _ = progress_tx.send(pct);
        });

        let original_bytes = file.len();
        let compressed = self.compressor.compress(file, kind, Some(on_progress)).await;

        // The callback is gone once compression returns, so the forwarder
        // drains and exits; waiting here keeps late compression updates from
        // racing the upload stage.
        let _ = forwarder.await;

        tracing::info!(
            task_id = %id,
            original_bytes,
            compressed_bytes = compressed.file.len(),
            "Media compression finished"
        );

        // 2. Store the primary media blob.
        self.registry
            .update_progress(id, 0, UploadStatus::Uploading)
            .await;
        let media_key = keys::media_key(
            &self.settings.media_key_prefix,
            id,
            compressed.file.extension().as_deref(),
        );
        let media_url = self
            .store
            .put(
                &media_key,
                compressed.file.data.clone(),
                &compressed.file.content_type,
            )
            .await
            .context("Failed to store media")?;

        // 3. Store the companion document, when present.
        let companion_url = match companion_file {
            Some(doc) => {
                self.registry
                    .update_progress(id, 50, UploadStatus::UploadingCompanion)
                    .await;
                let key = keys::companion_key(
                    &self.settings.companion_key_prefix,
                    id,
                    doc.extension().as_deref(),
                );
                let url = self
                    .store
                    .put(&key, doc.data.clone(), &doc.content_type)
                    .await
                    .context("Failed to store companion document")?;
                Some(url)
            }
            None => None,
        };

        // 4. Record the lesson. Duration prefers the explicit value, then
        //    whatever the probe derived.
        let instructor = if instructor.trim().is_empty() {
            self.settings.default_instructor.clone()
        } else {
            instructor
        };
        let lesson = NewLesson {
            title,
            module,
            duration_minutes: duration_minutes.or(compressed.duration_minutes),
            media_url: media_url.clone(),
            companion_doc_url: companion_url.clone(),
            instructor,
            created_by: user_id,
        };
        self.catalog
            .insert(lesson)
            .await
            .context("Failed to record lesson")?;

        Ok(PublishedLesson {
            media_url,
            companion_url,
            on_complete,
        })
    }
}

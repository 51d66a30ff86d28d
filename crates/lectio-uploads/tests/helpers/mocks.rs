//! In-memory collaborator doubles for pipeline tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use lectio_core::{MediaFile, MediaKind, NewLesson};
use lectio_media::{Compress, CompressedMedia, ProgressFn};
use lectio_storage::{ContentStore, StoreError, StoreResult};
use lectio_uploads::catalog::{CatalogError, LessonCatalog};
use lectio_uploads::notify::Notifier;

/// Content store backed by a HashMap. `failing()` simulates an outage.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<HashMap<String, (Bytes, String)>>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn object(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<String> {
        if self.fail {
            return Err(StoreError::UploadFailed(
                "simulated storage outage".to_string(),
            ));
        }
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(key) {
            return Err(StoreError::KeyExists(key.to_string()));
        }
        objects.insert(key.to_string(), (data, content_type.to_string()));
        Ok(format!("memory://{key}"))
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }
}

/// Lesson catalog backed by a Vec. `failing()` simulates a database failure.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    lessons: Arc<Mutex<Vec<NewLesson>>>,
    fail: bool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn lessons(&self) -> Vec<NewLesson> {
        self.lessons.lock().unwrap().clone()
    }
}

#[async_trait]
impl LessonCatalog for MemoryCatalog {
    async fn insert(&self, lesson: NewLesson) -> Result<(), CatalogError> {
        if self.fail {
            return Err(CatalogError::InsertFailed(
                "simulated database failure".to_string(),
            ));
        }
        self.lessons.lock().unwrap().push(lesson);
        Ok(())
    }
}

/// Notifier that appends every announcement to an ordered event log.
///
/// Tests can interleave their own markers via [`RecordingNotifier::push_marker`]
/// to assert ordering against notifications.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn push_marker(&self, marker: &str) {
        self.events.lock().unwrap().push(marker.to_string());
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_published(&self, title: &str) {
        self.push_marker(&format!("published:{title}"));
    }

    async fn notify_failed(&self, title: &str, reason: &str) {
        self.push_marker(&format!("failed:{title}:{reason}"));
    }
}

/// Compressor that passes bytes through, optionally reporting progress and a
/// derived duration the way the video path does.
#[derive(Clone, Default)]
pub struct StubCompressor {
    pub duration_minutes: Option<u32>,
    pub progress_steps: Vec<u8>,
}

#[async_trait]
impl Compress for StubCompressor {
    async fn compress(
        &self,
        file: MediaFile,
        _kind: MediaKind,
        on_progress: Option<ProgressFn>,
    ) -> CompressedMedia {
        if let Some(callback) = on_progress.as_ref() {
            for pct in &self.progress_steps {
                callback(*pct);
            }
        }
        CompressedMedia {
            file,
            duration_minutes: self.duration_minutes,
        }
    }
}

/// Compressor that blocks until the test releases it, holding tasks in the
/// compressing stage so mid-flight registry state can be observed.
#[derive(Clone)]
pub struct GatedCompressor {
    gate: Arc<tokio::sync::Semaphore>,
    pub progress_steps: Vec<u8>,
}

impl GatedCompressor {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(tokio::sync::Semaphore::new(0)),
            progress_steps: Vec::new(),
        }
    }

    pub fn with_progress(progress_steps: Vec<u8>) -> Self {
        Self {
            gate: Arc::new(tokio::sync::Semaphore::new(0)),
            progress_steps,
        }
    }

    /// Allow `n` gated compressions to finish.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl Compress for GatedCompressor {
    async fn compress(
        &self,
        file: MediaFile,
        _kind: MediaKind,
        on_progress: Option<ProgressFn>,
    ) -> CompressedMedia {
        if let Some(callback) = on_progress.as_ref() {
            for pct in &self.progress_steps {
                callback(*pct);
            }
        }
        self.gate.acquire().await.unwrap().forget();
        CompressedMedia {
            file,
            duration_minutes: None,
        }
    }
}

//! Lectio Storage Library
//!
//! This crate provides the blob storage abstraction the upload pipeline
//! writes through, plus a local filesystem implementation.
//!
//! # Storage key format
//!
//! Media blobs live under `{media_prefix}/{timestamp_ms}-{task_id}.{ext}`,
//! companion documents under `{companion_prefix}/{timestamp_ms}-doc-{task_id}.{ext}`.
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module, and `put` never overwrites an existing key.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use local::LocalStore;
pub use traits::{ContentStore, StoreError, StoreResult};

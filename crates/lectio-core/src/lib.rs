//! Lectio Core Library
//!
//! This crate provides the domain models, configuration, and telemetry setup
//! shared across the lectio upload pipeline crates.

pub mod config;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use models::{MediaFile, MediaKind, NewLesson, UploadStatus, UploadTask};
pub use telemetry::init_telemetry;

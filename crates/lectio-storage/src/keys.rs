//! Shared key generation for storage backends.
//!
//! Key format: media blobs are stored under `{prefix}/{timestamp_ms}-{task_id}.{ext}`,
//! companion documents under `{prefix}/{timestamp_ms}-doc-{task_id}.{ext}`. The
//! millisecond timestamp plus the task id make collisions practically impossible,
//! and a colliding `put` fails rather than overwrites (see [`crate::ContentStore`]).

use chrono::Utc;
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 8;
const FALLBACK_EXTENSION: &str = "bin";

/// Generate a storage key for a task's primary media blob.
pub fn media_key(prefix: &str, task_id: Uuid, extension: Option<&str>) -> String {
    format!(
        "{}/{}-{}.{}",
        prefix,
        Utc::now().timestamp_millis(),
        task_id,
        sanitize_extension(extension)
    )
}

/// Generate a storage key for a task's companion document.
pub fn companion_key(prefix: &str, task_id: Uuid, extension: Option<&str>) -> String {
    format!(
        "{}/{}-doc-{}.{}",
        prefix,
        Utc::now().timestamp_millis(),
        task_id,
        sanitize_extension(extension)
    )
}

/// Reduce a caller-supplied extension to a safe, lowercase token.
///
/// Anything other than ASCII alphanumerics is dropped; empty or oversized
/// results fall back to `bin`.
pub fn sanitize_extension(extension: Option<&str>) -> String {
    let cleaned: String = extension
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect();

    if cleaned.is_empty() || cleaned.len() > MAX_EXTENSION_LEN {
        FALLBACK_EXTENSION.to_string()
    } else {
        cleaned
    }
}

//! Terminal upload announcements.

use async_trait::async_trait;

/// Receives the end-of-upload announcement for display to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A lesson was published.
    async fn notify_published(&self, title: &str);

    /// An upload failed before publication.
    async fn notify_failed(&self, title: &str, reason: &str);
}

/// Standard wording for a successful publication.
pub fn published_message(title: &str) -> String {
    format!("Lesson \"{title}\" published")
}

/// Standard wording for a failed upload.
pub fn failed_message(title: &str, reason: &str) -> String {
    format!("Upload of \"{title}\" failed: {reason}")
}

/// Notifier that writes announcements to the log.
///
/// Default for hosts without a user-facing toast channel.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_published(&self, title: &str) {
        tracing::info!(message = %published_message(title), "Upload notification");
    }

    async fn notify_failed(&self, title: &str, reason: &str) {
        tracing::warn!(message = %failed_message(title, reason), "Upload notification");
    }
}

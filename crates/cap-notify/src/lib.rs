//! Operator notification sink.
//!
//! Delivery is fire-and-forget from the worker's point of view: a failed
//! send is returned to the caller, which logs it and carries on. Nothing
//! here retries.

mod blocks;
mod icons;
mod slack;

pub use blocks::render_blocks;
pub use icons::{ProfileIcons, DEFAULT_PROFILE_ICONS};
pub use slack::SlackNotifier;

use cap_reconcile::Notification;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The channel could not be reached.
    Transport(String),
    /// The channel answered but refused the message.
    Rejected(String),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Transport(msg) => write!(f, "notification transport error: {msg}"),
            NotifyError::Rejected(msg) => write!(f, "notification rejected: {msg}"),
        }
    }
}

impl std::error::Error for NotifyError {}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Used when no chat channel is configured: the notification is only logged.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    icons: ProfileIcons,
}

impl LogNotifier {
    pub fn new(icons: ProfileIcons) -> Self {
        Self { icons }
    }
}

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = log_payload(notification)?;
        tracing::info!(
            title = notification.title(),
            subject = notification.subject(),
            profile = notification.profile(),
            icon = self.icons.icon_for(notification.profile()),
            payload = %payload,
            "notification (log only)"
        );
        Ok(())
    }
}

fn log_payload(notification: &Notification) -> Result<String, NotifyError> {
    serde_json::to_string(notification)
        .map_err(|e| NotifyError::Transport(format!("notification not encodable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_payload_is_the_full_notification_as_json() {
        let n = Notification::ServerIdChanged {
            hostname: "esx-03.dal09".to_string(),
            server_id: "3003".to_string(),
            previous_server_id: "1001".to_string(),
            profile: "3x".to_string(),
        };
        let payload = log_payload(&n).unwrap();
        let v: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(v["kind"], "server_id_changed");
        assert_eq!(v["hostname"], "esx-03.dal09");
        assert_eq!(v["previous_server_id"], "1001");
    }
}

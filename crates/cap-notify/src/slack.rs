use std::fmt;
use std::time::Duration;

use cap_reconcile::Notification;
use serde::Deserialize;
use serde_json::json;

use crate::blocks::render_blocks;
use crate::icons::ProfileIcons;
use crate::{Notifier, NotifyError};

const SLACK_API: &str = "https://slack.com/api";

/// Posts block messages via `chat.postMessage`.
#[derive(Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    base_url: String,
    token: String,
    channel: String,
    icons: ProfileIcons,
}

impl fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackNotifier")
            .field("base_url", &self.base_url)
            .field("channel", &self.channel)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(
        token: String,
        channel: String,
        icons: ProfileIcons,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        Self::new_with_base_url(token, channel, icons, timeout, SLACK_API.to_string())
    }

    pub fn new_with_base_url(
        token: String,
        channel: String,
        icons: ProfileIcons,
        timeout: Duration,
        base_url: String,
    ) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            token,
            channel,
            icons,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = json!({
            "channel": self.channel,
            "text": notification.title(),
            "blocks": render_blocks(notification, &self.icons),
        });
        let url = format!("{}/chat.postMessage", self.base_url.trim_end_matches('/'));

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(format!("http status {}", status.as_u16())));
        }

        // Slack reports most failures as 200 with ok=false.
        let parsed: PostMessageResponse = resp
            .json()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        if !parsed.ok {
            return Err(NotifyError::Rejected(
                parsed.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        tracing::debug!(
            title = notification.title(),
            subject = notification.subject(),
            "notification posted"
        );
        Ok(())
    }
}

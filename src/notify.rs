//! Fire-and-forget publisher for ntfy topics.
//!
//! One POST per notification: body is the message, metadata travels in the
//! `Title`/`Priority`/`Tags`/`Click` headers. Delivery failures are logged
//! at warn and swallowed; nothing in the wiki ever waits on or retries a
//! notification.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub click_url: Option<String>,
    /// ntfy priority, 1 (min) to 5 (max).
    pub priority: u8,
    /// Comma-separated ntfy tags; empty means none.
    pub tags: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Notification {
        Notification {
            title: title.into(),
            message: message.into(),
            click_url: None,
            priority: 3,
            tags: String::new(),
        }
    }

    pub fn click_url(mut self, url: impl Into<String>) -> Notification {
        self.click_url = Some(url.into());
        self
    }

    pub fn priority(mut self, priority: u8) -> Notification {
        self.priority = priority;
        self
    }

    pub fn tags(mut self, tags: impl Into<String>) -> Notification {
        self.tags = tags.into();
        self
    }
}

pub struct Notifier {
    base_url: String,
    topic: String,
    client: Client,
}

impl Notifier {
    pub fn new(base_url: &str, topic: &str) -> Result<Notifier, reqwest::Error> {
        let client = Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Notifier {
            base_url: base_url.trim_end_matches('/').to_string(),
            topic: topic.to_string(),
            client,
        })
    }

    /// Posts the notification; failures are logged and swallowed.
    pub fn send(&self, notification: &Notification) {
        let url = format!("{}/{}", self.base_url, self.topic);
        let mut request = self
            .client
            .post(&url)
            .body(notification.message.clone())
            .header("Title", &notification.title)
            .header("Priority", notification.priority.to_string());
        if !notification.tags.is_empty() {
            request = request.header("Tags", &notification.tags);
        }
        if let Some(click) = &notification.click_url {
            request = request.header("Click", click);
        }

        match request.send() {
            Ok(resp) if resp.status().is_success() => {
                debug!(%url, title = %notification.title, "notification delivered");
            }
            Ok(resp) => {
                warn!(%url, status = %resp.status(), "notification rejected");
            }
            Err(err) => {
                warn!(%url, error = %err, "notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_defaults() {
        let n = Notification::new("Page edited", "Home was updated");
        assert_eq!(n.priority, 3);
        assert!(n.tags.is_empty());
        assert!(n.click_url.is_none());
    }

    #[test]
    fn builder_chain() {
        let n = Notification::new("t", "m")
            .click_url("https://wiki.example/wiki/home/")
            .priority(5)
            .tags("warning,page");
        assert_eq!(n.click_url.as_deref(), Some("https://wiki.example/wiki/home/"));
        assert_eq!(n.priority, 5);
        assert_eq!(n.tags, "warning,page");
    }

    #[test]
    fn notifier_normalizes_base_url() {
        let notifier = Notifier::new("https://ntfy.sh/", "wiki-events").unwrap();
        assert_eq!(notifier.base_url, "https://ntfy.sh");
        assert_eq!(notifier.topic, "wiki-events");
    }
}

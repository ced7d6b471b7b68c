//! Review-workflow notifications.
//!
//! Delivery is best effort: the service logs a failed notification and
//! carries on.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};

/// What happened to the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationKind {
    Created,
    SubmittedForReview { reviewer_id: String },
    Approved,
    Rejected { reason: String },
    Published,
    Archived,
}

impl NotificationKind {
    /// Event name as sent over the wire.
    pub fn event(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::SubmittedForReview { .. } => "submitted_for_review",
            Self::Approved => "approved",
            Self::Rejected { .. } => "rejected",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

/// A notification about one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub policy_id: Uuid,
    pub policy_title: String,
    pub author_id: String,
    #[serde(flatten)]
    pub kind: NotificationKind,
}

/// Trait for notification channels, enabling mocking in tests.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            policy_id = %notification.policy_id,
            author_id = %notification.author_id,
            event = notification.kind.event(),
            "policy notification"
        );
        Ok(())
    }
}

/// Posts notifications as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    http: reqwest::Client,
    webhook_url: String,
}

impl HttpNotifier {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            webhook_url: webhook_url.into(),
        })
    }

    /// Build from configuration. Returns `None` when no webhook is configured.
    pub fn from_config(config: &ServiceConfig) -> Result<Option<Self>> {
        config
            .notify_webhook_url
            .as_deref()
            .map(|url| Self::new(url, config.notify_timeout))
            .transpose()
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(notification)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Notification(format!(
                "webhook returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        tracing::debug!(event = notification.kind.event(), "notification delivered");
        Ok(())
    }
}

/// Test notifiers.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every notification it receives.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }

        pub fn events(&self) -> Vec<&'static str> {
            self.sent().iter().map(|n| n.kind.event()).collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &Notification) -> Result<()> {
            self.sent
                .lock()
                .map_err(|e| ServiceError::Notification(format!("recorder lock poisoned: {e}")))?
                .push(notification.clone());
            Ok(())
        }
    }

    /// Fails every delivery.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _notification: &Notification) -> Result<()> {
            Err(ServiceError::Notification("channel unavailable".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(kind: NotificationKind) -> Notification {
        Notification {
            policy_id: Uuid::nil(),
            policy_title: "Backup Policy".to_string(),
            author_id: "author-1".to_string(),
            kind,
        }
    }

    #[test]
    fn test_rejected_payload() {
        let value = serde_json::to_value(notification(NotificationKind::Rejected {
            reason: "Missing scope".to_string(),
        }))
        .unwrap();

        assert_eq!(
            value,
            json!({
                "policy_id": "00000000-0000-0000-0000-000000000000",
                "policy_title": "Backup Policy",
                "author_id": "author-1",
                "event": "rejected",
                "reason": "Missing scope"
            })
        );
    }

    #[test]
    fn test_event_names_match_payload() {
        for kind in [
            NotificationKind::Created,
            NotificationKind::SubmittedForReview {
                reviewer_id: "r".to_string(),
            },
            NotificationKind::Approved,
            NotificationKind::Published,
            NotificationKind::Archived,
        ] {
            let value = serde_json::to_value(notification(kind.clone())).unwrap();
            assert_eq!(value["event"], kind.event());
        }
    }

    #[test]
    fn test_from_config_without_webhook() {
        let config = ServiceConfig::new("postgres://localhost/policyhub");
        assert!(HttpNotifier::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = test_support::RecordingNotifier::new();
        notifier
            .notify(&notification(NotificationKind::Approved))
            .await
            .unwrap();
        assert_eq!(notifier.events(), vec!["approved"]);
    }
}

use std::time::Duration;

use crate::error::{Result, ServiceError};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub notify_webhook_url: Option<String>,
    pub notify_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ServiceError::Config("DATABASE_URL not set".into()))?;

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let notify_webhook_url = std::env::var("NOTIFY_WEBHOOK_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let notify_timeout_secs: u64 = std::env::var("NOTIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            max_connections,
            notify_webhook_url,
            notify_timeout: Duration::from_secs(notify_timeout_secs),
        })
    }

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
            notify_webhook_url: None,
            notify_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_notify_webhook(mut self, url: impl Into<String>) -> Self {
        self.notify_webhook_url = Some(url.into());
        self
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }
}

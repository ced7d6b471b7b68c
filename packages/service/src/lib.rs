//! PolicyHub service - storage, versioning, review workflow and notifications
//! around the `policyhub-core` rules.

pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod service;
pub mod store;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use notify::{HttpNotifier, LogNotifier, Notification, NotificationKind, Notifier};
pub use service::{PolicyService, ResplitReport};
pub use store::{MemoryStore, PgPolicyStore, PolicyStore};

use async_trait::async_trait;
use thiserror::Error;

use crate::metrics::{TimeInterval, TimeSeries};
use crate::model::{Subscription, Topic};

/// Failures surfaced by the remote directory and metrics services.
///
/// `NotFound` is the only variant callers branch on: a picked or
/// history-resolved name that no longer exists is treated like
/// "nothing selected". Everything else is transient and leaves the
/// session state unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("resource not found: {name}")]
    NotFound { name: String },
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },
    #[error("service unavailable: {message}")]
    Unavailable { message: String },
}

/// The Topic side of the remote Pub/Sub directory.
///
/// Concrete API clients are external collaborators; this crate ships
/// only the seam plus [`crate::fake::FakeCloud`] for demo mode and
/// tests.
#[async_trait]
pub trait TopicDirectory: Send + Sync {
    async fn get_topic(&self, name: &str) -> Result<Topic, DirectoryError>;

    /// Fully-qualified topic names in the given project, in service
    /// order.
    async fn list_topics(&self, project_id: &str) -> Result<Vec<String>, DirectoryError>;
}

/// The Subscription side of the remote Pub/Sub directory.
#[async_trait]
pub trait SubscriptionDirectory: Send + Sync {
    async fn get_subscription(&self, name: &str) -> Result<Subscription, DirectoryError>;

    async fn list_subscriptions(&self, project_id: &str) -> Result<Vec<String>, DirectoryError>;
}

/// The remote project directory.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Every project id visible to the caller, including
    /// system-reserved ones; filtering is the caller's job.
    async fn search_projects(&self) -> Result<Vec<String>, DirectoryError>;
}

/// The remote metrics time-series service.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn list_time_series(
        &self,
        project_id: &str,
        filter: &str,
        interval: TimeInterval,
    ) -> Result<Vec<TimeSeries>, DirectoryError>;
}

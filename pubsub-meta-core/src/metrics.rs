//! Windowed metric sampling for subscriptions.
//!
//! One query shape serves every metric: a trailing fixed-width window
//! ending at the session's captured instant, scoped to a single
//! subscription by filter expression.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::directory::{DirectoryError, MetricsBackend};
use crate::model::SubscriptionKey;

/// Trailing window width for every metric sample.
pub const SAMPLE_WINDOW_SECS: i64 = 3_600;

/// The metrics the dashboard plots. Both go through the same windowed
/// query, differing only in the metric type substituted into the
/// filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    SentMessageCount,
    NumUndeliveredMessages,
}

impl MetricKind {
    pub fn metric_type(self) -> &'static str {
        match self {
            Self::SentMessageCount => "pubsub.googleapis.com/subscription/sent_message_count",
            Self::NumUndeliveredMessages => {
                "pubsub.googleapis.com/subscription/num_undelivered_messages"
            }
        }
    }

    /// Short name used for chart titles and log fields.
    pub fn title(self) -> &'static str {
        match self {
            Self::SentMessageCount => "sent_message_count",
            Self::NumUndeliveredMessages => "num_undelivered_messages",
        }
    }
}

/// Closed query interval, `start..=end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub at: DateTime<Utc>,
    pub value: i64,
}

/// One time series as returned by the remote service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeSeries {
    pub points: Vec<Point>,
}

/// Parallel timestamp/value sequences, one pair per reported data
/// point, in the order the service returned them. The sampler does
/// not re-sort.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricSeries {
    pub stamps: Vec<DateTime<Utc>>,
    pub values: Vec<i64>,
}

impl MetricSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builds the remote filter expression for one metric on one
/// subscription.
pub fn metric_filter(kind: MetricKind, subscription_id: &str) -> String {
    format!(
        "metric.type = \"{}\" AND resource.labels.subscription_id = \"{}\"",
        kind.metric_type(),
        subscription_id
    )
}

/// Queries the metrics backend one metric at a time.
pub struct Sampler {
    backend: Arc<dyn MetricsBackend>,
}

impl Sampler {
    pub fn new(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    /// One windowed query for `kind` scoped to the subscription. A
    /// failure is not fatal to the session; the caller may render an
    /// empty chart instead.
    pub async fn sample(
        &self,
        key: &SubscriptionKey,
        now: DateTime<Utc>,
        kind: MetricKind,
    ) -> Result<MetricSeries, DirectoryError> {
        let interval = TimeInterval {
            start: now - Duration::seconds(SAMPLE_WINDOW_SECS),
            end: now,
        };
        let filter = metric_filter(kind, &key.subscription_id);

        let series = self
            .backend
            .list_time_series(&key.project_id, &filter, interval)
            .await?;

        let mut out = MetricSeries::default();
        for ts in series {
            for point in ts.points {
                out.stamps.push(point.at);
                out.values.push(point.value);
            }
        }
        Ok(out)
    }
}

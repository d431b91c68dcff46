//! In-memory stand-in for the remote services.
//!
//! Serves two jobs: demo mode when no real backend is wired up, and a
//! deterministic double for tests. Every remote call is recorded so
//! tests can assert on exactly what went over the seam, and a switch
//! can turn the whole backend into an outage.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Duration;

use crate::directory::{
    DirectoryError, MetricsBackend, ProjectDirectory, SubscriptionDirectory, TopicDirectory,
};
use crate::metrics::{Point, TimeInterval, TimeSeries};
use crate::model::{
    DeadLetterPolicy, ExpirationPolicy, RetryPolicy, SchemaEncoding, SchemaSettings, Subscription,
    SubscriptionState, Topic,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    GetTopic {
        name: String,
    },
    ListTopics {
        project_id: String,
    },
    GetSubscription {
        name: String,
    },
    ListSubscriptions {
        project_id: String,
    },
    SearchProjects,
    ListTimeSeries {
        project_id: String,
        filter: String,
        interval: TimeInterval,
    },
}

pub struct FakeCloud {
    topics: BTreeMap<String, Topic>,
    subscriptions: BTreeMap<String, Subscription>,
    projects: Vec<String>,
    unavailable: AtomicBool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeCloud {
    pub fn empty() -> Self {
        Self {
            topics: BTreeMap::new(),
            subscriptions: BTreeMap::new(),
            projects: Vec::new(),
            unavailable: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A small fleet with enough variety to exercise every pane:
    /// labeled and schema-bound topics, subscriptions with and without
    /// policies, and a system-reserved project that should never make
    /// it into the roster.
    pub fn demo() -> Self {
        let mut cloud = Self::empty().with_projects(vec![
            "acme-prod".into(),
            "acme-staging".into(),
            "sys-acme-ghost".into(),
        ]);

        cloud = cloud.with_topic(Topic {
            name: "projects/acme-prod/topics/orders".into(),
            labels: BTreeMap::from([
                ("team".to_string(), "checkout".to_string()),
                ("tier".to_string(), "critical".to_string()),
            ]),
            schema_settings: Some(SchemaSettings {
                schema: "projects/acme-prod/schemas/order-event".into(),
                encoding: SchemaEncoding::Json,
            }),
        });
        cloud = cloud.with_topic(Topic {
            name: "projects/acme-prod/topics/audit".into(),
            ..Topic::default()
        });
        cloud = cloud.with_topic(Topic {
            name: "projects/acme-staging/topics/orders".into(),
            ..Topic::default()
        });

        cloud = cloud.with_subscription(Subscription {
            name: "projects/acme-prod/subscriptions/orders-push".into(),
            topic: "projects/acme-prod/topics/orders".into(),
            ack_deadline_seconds: 30,
            message_retention_secs: 604_800,
            enable_message_ordering: true,
            enable_exactly_once_delivery: false,
            filter: "attributes.region = \"eu\"".into(),
            state: SubscriptionState::Active,
            dead_letter_policy: Some(DeadLetterPolicy {
                dead_letter_topic: "projects/acme-prod/topics/orders-dlq".into(),
                max_delivery_attempts: 5,
            }),
            retry_policy: Some(RetryPolicy {
                minimum_backoff_secs: 10,
                maximum_backoff_secs: 600,
            }),
            expiration_policy: Some(ExpirationPolicy { ttl_secs: 2_678_400 }),
        });
        cloud = cloud.with_subscription(Subscription {
            name: "projects/acme-prod/subscriptions/audit-archiver".into(),
            topic: "projects/acme-prod/topics/audit".into(),
            ack_deadline_seconds: 10,
            message_retention_secs: 86_400,
            state: SubscriptionState::Active,
            ..Subscription::default()
        });
        cloud = cloud.with_subscription(Subscription {
            name: "projects/acme-staging/subscriptions/orders-shadow".into(),
            topic: "projects/acme-staging/topics/orders".into(),
            ack_deadline_seconds: 10,
            state: SubscriptionState::ResourceError,
            ..Subscription::default()
        });

        cloud
    }

    pub fn with_projects(mut self, projects: Vec<String>) -> Self {
        self.projects = projects;
        self
    }

    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topics.insert(topic.name.clone(), topic);
        self
    }

    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions
            .insert(subscription.name.clone(), subscription);
        self
    }

    /// While set, every remote call fails with `Unavailable`.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) -> Result<(), DirectoryError> {
        self.calls.lock().unwrap().push(call);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable {
                message: "injected outage".into(),
            });
        }
        Ok(())
    }

    fn names_under<T>(items: &BTreeMap<String, T>, project_id: &str) -> Vec<String> {
        let prefix = format!("projects/{project_id}/");
        items
            .keys()
            .filter(|name| name.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TopicDirectory for FakeCloud {
    async fn get_topic(&self, name: &str) -> Result<Topic, DirectoryError> {
        self.record(RecordedCall::GetTopic { name: name.into() })?;
        self.topics
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound { name: name.into() })
    }

    async fn list_topics(&self, project_id: &str) -> Result<Vec<String>, DirectoryError> {
        self.record(RecordedCall::ListTopics {
            project_id: project_id.into(),
        })?;
        Ok(Self::names_under(&self.topics, project_id))
    }
}

#[async_trait]
impl SubscriptionDirectory for FakeCloud {
    async fn get_subscription(&self, name: &str) -> Result<Subscription, DirectoryError> {
        self.record(RecordedCall::GetSubscription { name: name.into() })?;
        self.subscriptions
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound { name: name.into() })
    }

    async fn list_subscriptions(&self, project_id: &str) -> Result<Vec<String>, DirectoryError> {
        self.record(RecordedCall::ListSubscriptions {
            project_id: project_id.into(),
        })?;
        Ok(Self::names_under(&self.subscriptions, project_id))
    }
}

#[async_trait]
impl ProjectDirectory for FakeCloud {
    async fn search_projects(&self) -> Result<Vec<String>, DirectoryError> {
        self.record(RecordedCall::SearchProjects)?;
        Ok(self.projects.clone())
    }
}

#[async_trait]
impl MetricsBackend for FakeCloud {
    /// Deterministic synthetic series: one point every five minutes
    /// across the interval, shaped by which metric the filter names so
    /// the two demo charts do not look identical.
    async fn list_time_series(
        &self,
        project_id: &str,
        filter: &str,
        interval: TimeInterval,
    ) -> Result<Vec<TimeSeries>, DirectoryError> {
        self.record(RecordedCall::ListTimeSeries {
            project_id: project_id.into(),
            filter: filter.into(),
            interval,
        })?;

        let backlog = filter.contains("num_undelivered");
        let step = Duration::minutes(5);
        let mut points = Vec::new();
        let mut at = interval.start;
        let mut tick: i64 = 0;
        while at <= interval.end {
            let value = if backlog {
                (tick * 7 % 40) + 3
            } else {
                (tick * 13 % 90) + 20
            };
            points.push(Point { at, value });
            at += step;
            tick += 1;
        }
        Ok(vec![TimeSeries { points }])
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema binding on a topic, if one is configured.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchemaSettings {
    pub schema: String,
    #[serde(default)]
    pub encoding: SchemaEncoding,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaEncoding {
    #[default]
    EncodingUnspecified,
    Json,
    Binary,
}

/// Immutable topic snapshot fetched on demand from the directory
/// service. Identified by a fully-qualified
/// `projects/{project}/topics/{topic}` name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub schema_settings: Option<SchemaSettings>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionState {
    #[default]
    StateUnspecified,
    Active,
    ResourceError,
}

impl SubscriptionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::StateUnspecified => "unspecified",
            Self::Active => "active",
            Self::ResourceError => "resource error",
        }
    }
}

/// Where messages go after exhausting delivery attempts.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeadLetterPolicy {
    pub dead_letter_topic: String,
    pub max_delivery_attempts: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryPolicy {
    pub minimum_backoff_secs: u64,
    pub maximum_backoff_secs: u64,
}

/// Subscriptions idle longer than the TTL are garbage-collected
/// server-side.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExpirationPolicy {
    pub ttl_secs: u64,
}

/// Immutable subscription snapshot fetched on demand from the
/// directory service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subscription {
    pub name: String,
    pub topic: String,
    #[serde(default)]
    pub ack_deadline_seconds: u32,
    #[serde(default)]
    pub message_retention_secs: u64,
    #[serde(default)]
    pub enable_message_ordering: bool,
    #[serde(default)]
    pub enable_exactly_once_delivery: bool,
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub state: SubscriptionState,
    #[serde(default)]
    pub dead_letter_policy: Option<DeadLetterPolicy>,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(default)]
    pub expiration_policy: Option<ExpirationPolicy>,
}

/// A subscription name that does not decompose into the expected
/// `projects/{project}/subscriptions/{subscription}` shape. Upstream
/// data defect; operations on the name fail loudly instead of
/// guessing.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("malformed subscription name: {name:?}")]
pub struct MalformedName {
    pub name: String,
}

/// Identity pair derived from a subscription's fully-qualified name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionKey {
    pub project_id: String,
    pub subscription_id: String,
}

impl SubscriptionKey {
    /// Exactly four `/`-delimited segments with the literal `projects`
    /// and `subscriptions` markers, or no key at all.
    pub fn parse(name: &str) -> Result<Self, MalformedName> {
        let parts: Vec<&str> = name.split('/').collect();
        match parts.as_slice() {
            ["projects", project_id, "subscriptions", subscription_id]
                if !project_id.is_empty() && !subscription_id.is_empty() =>
            {
                Ok(Self {
                    project_id: (*project_id).to_string(),
                    subscription_id: (*subscription_id).to_string(),
                })
            }
            _ => Err(MalformedName {
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/subscriptions/{}",
            self.project_id, self.subscription_id
        )
    }
}

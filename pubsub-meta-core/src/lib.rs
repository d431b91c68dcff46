//! Core building blocks for the pubsub-meta dashboard.
//!
//! Everything in this crate is UI-free: resource models, the async
//! seams to the remote directory/metrics services, the local history
//! and project-roster files, configuration, and the metric sampler.
//! The `pubsub-meta-cli` crate owns the terminal.

pub mod config;
pub mod directory;
pub mod fake;
pub mod history;
pub mod metrics;
pub mod model;
pub mod projects;

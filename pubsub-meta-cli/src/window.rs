//! The dashboard window: session state plus the keystroke loop.
//!
//! Input handling is split in two. `transition` is pure: it maps one
//! keystroke onto the session state and names the side effect to run,
//! which keeps the whole key map testable without a terminal. The
//! async effect runners (`open`, `refresh`, `history_pick`) then do
//! the remote and file work.

use std::io;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{Terminal, backend::Backend};
use tracing::{info, warn};

use pubsub_meta_core::config::Config;
use pubsub_meta_core::directory::{
    DirectoryError, MetricsBackend, ProjectDirectory, SubscriptionDirectory, TopicDirectory,
};
use pubsub_meta_core::history::{HistoryStore, ResourceKind};
use pubsub_meta_core::metrics::{MetricKind, MetricSeries, Sampler};
use pubsub_meta_core::model::{Subscription, SubscriptionKey, Topic};
use pubsub_meta_core::projects::ProjectRoster;

use crate::picker;
use crate::theme::Theme;
use crate::view;

/// Vertical navigation rail, top to bottom. Arrow movement clamps at
/// the ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nav {
    Topic,
    Subscription,
    Snapshots,
    Schemas,
}

impl Nav {
    pub const ALL: [Nav; 4] = [Nav::Topic, Nav::Subscription, Nav::Snapshots, Nav::Schemas];

    pub fn label(self) -> &'static str {
        match self {
            Self::Topic => "Topic",
            Self::Subscription => "Subscription",
            Self::Snapshots => "Snapshots",
            Self::Schemas => "Schemas",
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Topic => Self::Topic,
            Self::Subscription => Self::Topic,
            Self::Snapshots => Self::Subscription,
            Self::Schemas => Self::Snapshots,
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Topic => Self::Subscription,
            Self::Subscription => Self::Snapshots,
            Self::Snapshots => Self::Schemas,
            Self::Schemas => Self::Schemas,
        }
    }
}

/// Horizontal tabs for the content pane, left to right, clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Detail,
    Metrics,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Detail, Tab::Metrics];

    pub fn label(self) -> &'static str {
        match self {
            Self::Detail => "Detail",
            Self::Metrics => "Metrics",
        }
    }

    fn prev(self) -> Self {
        Self::Detail
    }

    fn next(self) -> Self {
        Self::Metrics
    }
}

/// What the content pane shows this frame.
#[derive(Clone, Debug, Default)]
pub enum Content {
    #[default]
    Empty,
    Topic(Topic),
    Subscription(Subscription),
    Metrics {
        sent: MetricSeries,
        undelivered: MetricSeries,
    },
}

/// Handles to the remote services, fixed at construction.
pub struct Remotes {
    pub topics: Arc<dyn TopicDirectory>,
    pub subscriptions: Arc<dyn SubscriptionDirectory>,
    pub projects: Arc<dyn ProjectDirectory>,
    pub metrics: Arc<dyn MetricsBackend>,
}

/// Side effect a keystroke asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    Open,
    Refresh,
    History,
    Quit,
}

pub struct Window {
    pub config: Config,
    pub theme: Theme,
    remotes: Remotes,
    history: HistoryStore,
    roster: ProjectRoster,
    sampler: Sampler,
    pub nav: Nav,
    pub tab: Tab,
    topic: Option<Topic>,
    sub: Option<Subscription>,
    sub_key: Option<SubscriptionKey>,
    pub now: DateTime<Local>,
    pub content: Content,
    pub status: Option<String>,
    pub flash: bool,
    should_quit: bool,
}

impl Window {
    pub fn new(config: Config, remotes: Remotes) -> Self {
        let theme = Theme::for_skin(config.skin);
        let history = HistoryStore::new(config.history_dir());
        let roster = ProjectRoster::new(config.projects_file());
        let sampler = Sampler::new(remotes.metrics.clone());
        Self {
            config,
            theme,
            remotes,
            history,
            roster,
            sampler,
            nav: Nav::Topic,
            tab: Tab::Detail,
            topic: None,
            sub: None,
            sub_key: None,
            now: Local::now(),
            content: Content::Empty,
            status: None,
            flash: false,
            should_quit: false,
        }
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.restore_recent().await;
        self.update_content().await;
        loop {
            self.now = Local::now();
            terminal.draw(|frame| view::render(frame, self))?;

            let Some(code) = next_key()? else {
                continue;
            };
            self.status = None;
            let effect = self.transition(code);
            match effect {
                Effect::None => {}
                Effect::Open => self.open(terminal).await?,
                Effect::Refresh => {
                    self.flash_border(terminal).await?;
                    self.refresh_resources().await;
                }
                Effect::History => self.history_pick(terminal).await?,
                Effect::Quit => {}
            }
            if self.should_quit {
                break;
            }
            self.update_content().await;
        }
        Ok(())
    }

    /// The whole key map. State changes happen here; anything that
    /// needs a terminal or a remote call is returned as an [`Effect`].
    pub fn transition(&mut self, code: KeyCode) -> Effect {
        match code {
            KeyCode::Up => {
                self.nav = self.nav.prev();
                Effect::None
            }
            KeyCode::Down => {
                self.nav = self.nav.next();
                Effect::None
            }
            KeyCode::Left => {
                self.tab = self.tab.prev();
                Effect::None
            }
            KeyCode::Right => {
                self.tab = self.tab.next();
                Effect::None
            }
            KeyCode::Char('1') => {
                self.nav = Nav::Topic;
                Effect::None
            }
            KeyCode::Char('2') => {
                self.nav = Nav::Subscription;
                Effect::None
            }
            KeyCode::Char('3') => {
                self.nav = Nav::Snapshots;
                Effect::None
            }
            KeyCode::Char('4') => {
                self.nav = Nav::Schemas;
                Effect::None
            }
            KeyCode::F(1) => {
                self.tab = Tab::Detail;
                Effect::None
            }
            KeyCode::F(2) => {
                self.tab = Tab::Metrics;
                Effect::None
            }
            // Open and history only apply where something is openable.
            KeyCode::Char('o') => match self.nav {
                Nav::Topic | Nav::Subscription => Effect::Open,
                Nav::Snapshots | Nav::Schemas => Effect::None,
            },
            KeyCode::Char('h') => match self.nav {
                Nav::Topic | Nav::Subscription => Effect::History,
                Nav::Snapshots | Nav::Schemas => Effect::None,
            },
            KeyCode::Char('r') => Effect::Refresh,
            KeyCode::Char('q') => {
                self.should_quit = true;
                Effect::Quit
            }
            _ => Effect::None,
        }
    }

    /// Decision table for the content pane. Every (rail, tab) pair is
    /// spelled out; placeholders stay `Empty`.
    pub async fn update_content(&mut self) {
        self.content = match (self.nav, self.tab) {
            (Nav::Topic, Tab::Detail) => match &self.topic {
                Some(topic) => Content::Topic(topic.clone()),
                None => Content::Empty,
            },
            (Nav::Topic, Tab::Metrics) => Content::Empty,
            (Nav::Subscription, Tab::Detail) => match &self.sub {
                Some(sub) => Content::Subscription(sub.clone()),
                None => Content::Empty,
            },
            (Nav::Subscription, Tab::Metrics) => match self.sub_key.clone() {
                Some(key) => {
                    let now = self.now.with_timezone(&Utc);
                    let sent = self
                        .sample_or_empty(&key, now, MetricKind::SentMessageCount)
                        .await;
                    let undelivered = self
                        .sample_or_empty(&key, now, MetricKind::NumUndeliveredMessages)
                        .await;
                    Content::Metrics { sent, undelivered }
                }
                None => Content::Empty,
            },
            (Nav::Snapshots, Tab::Detail | Tab::Metrics) => Content::Empty,
            (Nav::Schemas, Tab::Detail | Tab::Metrics) => Content::Empty,
        };
    }

    async fn sample_or_empty(
        &mut self,
        key: &SubscriptionKey,
        now: DateTime<Utc>,
        kind: MetricKind,
    ) -> MetricSeries {
        match self.sampler.sample(key, now, kind).await {
            Ok(series) => series,
            Err(err) => {
                warn!(metric = kind.title(), error = %err, "metric sample failed");
                self.status = Some(format!("metrics unavailable: {err}"));
                MetricSeries::default()
            }
        }
    }

    /// Loads the most recently viewed topic and subscription, if the
    /// history files name any. Best effort on startup.
    pub async fn restore_recent(&mut self) {
        if let Ok(Some(name)) = self.history.last(ResourceKind::Topic) {
            self.adopt_topic(&name, false).await;
        }
        if let Ok(Some(name)) = self.history.last(ResourceKind::Subscription) {
            self.adopt_subscription(&name, false).await;
        }
        self.status = None;
    }

    pub async fn adopt_topic(&mut self, name: &str, save: bool) {
        match self.remotes.topics.get_topic(name).await {
            Ok(topic) => {
                info!(name, "topic loaded");
                self.topic = Some(topic);
                if save {
                    if let Err(err) = self.history.save(ResourceKind::Topic, name) {
                        warn!(error = %err, "history write failed");
                    }
                }
            }
            // A vanished name is no different from picking nothing.
            Err(DirectoryError::NotFound { name }) => {
                info!(name, "topic no longer exists");
                self.status = Some(format!("no such topic: {name}"));
            }
            Err(err) => self.note_remote_failure("get topic", &err),
        }
    }

    pub async fn adopt_subscription(&mut self, name: &str, save: bool) {
        let sub = match self.remotes.subscriptions.get_subscription(name).await {
            Ok(sub) => sub,
            Err(DirectoryError::NotFound { name }) => {
                info!(name, "subscription no longer exists");
                self.status = Some(format!("no such subscription: {name}"));
                return;
            }
            Err(err) => {
                self.note_remote_failure("get subscription", &err);
                return;
            }
        };
        let key = match SubscriptionKey::parse(&sub.name) {
            Ok(key) => key,
            Err(err) => {
                warn!(error = %err, "subscription rejected");
                self.status = Some(err.to_string());
                return;
            }
        };
        info!(name, "subscription loaded");
        self.sub = Some(sub);
        self.sub_key = Some(key);
        if save {
            if let Err(err) = self.history.save(ResourceKind::Subscription, name) {
                warn!(error = %err, "history write failed");
            }
        }
    }

    /// Two-stage pick: a project from the local roster, then a live
    /// resource listing for that project. Cancelling either stage
    /// leaves the session untouched.
    pub async fn open<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let projects = match self.roster.list() {
            Ok(projects) => projects,
            Err(err) => {
                warn!(error = %err, "project roster unreadable");
                self.status =
                    Some("no project roster, run: pubsub-meta fetch-projects".to_string());
                return Ok(());
            }
        };
        let Some(project) = picker::pick_one(terminal, &self.theme, "Project", &projects)? else {
            return Ok(());
        };

        match self.nav {
            Nav::Topic => {
                let names = match self.remotes.topics.list_topics(&project).await {
                    Ok(names) => names,
                    Err(err) => {
                        self.note_remote_failure("list topics", &err);
                        return Ok(());
                    }
                };
                if let Some(name) = picker::pick_one(terminal, &self.theme, "Topic", &names)? {
                    self.adopt_topic(&name, true).await;
                }
            }
            Nav::Subscription => {
                let names = match self.remotes.subscriptions.list_subscriptions(&project).await {
                    Ok(names) => names,
                    Err(err) => {
                        self.note_remote_failure("list subscriptions", &err);
                        return Ok(());
                    }
                };
                if let Some(name) =
                    picker::pick_one(terminal, &self.theme, "Subscription", &names)?
                {
                    self.adopt_subscription(&name, true).await;
                }
            }
            Nav::Snapshots | Nav::Schemas => {}
        }
        Ok(())
    }

    /// Pick from the recents file for the active rail entry. Picking
    /// re-saves, so the choice becomes the newest entry.
    pub async fn history_pick<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> io::Result<()> {
        let kind = match self.nav {
            Nav::Topic => ResourceKind::Topic,
            Nav::Subscription => ResourceKind::Subscription,
            Nav::Snapshots | Nav::Schemas => return Ok(()),
        };
        let entries = match self.history.list(kind) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "history unreadable");
                self.status = Some("history unavailable".to_string());
                return Ok(());
            }
        };
        let title = format!("Recent {}s", kind.label());
        let Some(name) = picker::pick_one(terminal, &self.theme, &title, &entries)? else {
            return Ok(());
        };
        match kind {
            ResourceKind::Topic => self.adopt_topic(&name, true).await,
            ResourceKind::Subscription => self.adopt_subscription(&name, true).await,
        }
        Ok(())
    }

    /// Brief border flash acknowledging the refresh keystroke.
    async fn flash_border<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.flash = true;
        terminal.draw(|frame| view::render(frame, self))?;
        tokio::time::sleep(std::time::Duration::from_millis(120)).await;
        self.flash = false;
        Ok(())
    }

    /// Re-fetches whatever is currently loaded. A failed fetch keeps
    /// the previous snapshot and reports via the status line.
    pub async fn refresh_resources(&mut self) {
        if let Some(name) = self.topic.as_ref().map(|t| t.name.clone()) {
            match self.remotes.topics.get_topic(&name).await {
                Ok(topic) => self.topic = Some(topic),
                Err(err) => self.note_remote_failure("refresh topic", &err),
            }
        }
        if let Some(name) = self.sub.as_ref().map(|s| s.name.clone()) {
            match self.remotes.subscriptions.get_subscription(&name).await {
                Ok(sub) => self.sub = Some(sub),
                Err(err) => self.note_remote_failure("refresh subscription", &err),
            }
        }
    }

    fn note_remote_failure(&mut self, op: &str, err: &DirectoryError) {
        warn!(op, error = %err, "remote call failed");
        self.status = Some(format!("{op} failed: {err}"));
    }
}

fn next_key() -> io::Result<Option<KeyCode>> {
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key.code)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pubsub_meta_core::fake::{FakeCloud, RecordedCall};
    use pubsub_meta_core::metrics::SAMPLE_WINDOW_SECS;
    use ratatui::backend::TestBackend;
    use std::fs;
    use tempfile::TempDir;

    fn remotes(cloud: &Arc<FakeCloud>) -> Remotes {
        Remotes {
            topics: cloud.clone(),
            subscriptions: cloud.clone(),
            projects: cloud.clone(),
            metrics: cloud.clone(),
        }
    }

    fn fixture() -> (TempDir, Arc<FakeCloud>, Window) {
        let dir = TempDir::new().unwrap();
        let home = dir.path().to_path_buf();
        fs::create_dir_all(home.join("history")).unwrap();
        fs::write(home.join("history/topic"), "").unwrap();
        fs::write(home.join("history/subscription"), "").unwrap();
        fs::write(home.join("projects"), "").unwrap();

        let config = Config::load(home).unwrap();
        let cloud = Arc::new(FakeCloud::demo());
        let window = Window::new(config, remotes(&cloud));
        (dir, cloud, window)
    }

    #[test]
    fn test_nav_clamps_at_both_ends() {
        let (_dir, _cloud, mut win) = fixture();
        for _ in 0..10 {
            win.transition(KeyCode::Down);
        }
        assert_eq!(win.nav, Nav::Schemas);
        for _ in 0..10 {
            win.transition(KeyCode::Up);
        }
        assert_eq!(win.nav, Nav::Topic);
    }

    #[test]
    fn test_tab_clamps_at_both_ends() {
        let (_dir, _cloud, mut win) = fixture();
        for _ in 0..5 {
            win.transition(KeyCode::Right);
        }
        assert_eq!(win.tab, Tab::Metrics);
        for _ in 0..5 {
            win.transition(KeyCode::Left);
        }
        assert_eq!(win.tab, Tab::Detail);
    }

    #[test]
    fn test_digit_and_function_key_jumps() {
        let (_dir, _cloud, mut win) = fixture();
        win.transition(KeyCode::Char('3'));
        assert_eq!(win.nav, Nav::Snapshots);
        win.transition(KeyCode::Char('2'));
        assert_eq!(win.nav, Nav::Subscription);
        win.transition(KeyCode::F(2));
        assert_eq!(win.tab, Tab::Metrics);
        win.transition(KeyCode::F(1));
        assert_eq!(win.tab, Tab::Detail);
    }

    #[test]
    fn test_open_and_history_are_gated_by_rail() {
        let (_dir, _cloud, mut win) = fixture();
        assert_eq!(win.transition(KeyCode::Char('o')), Effect::Open);
        assert_eq!(win.transition(KeyCode::Char('h')), Effect::History);
        win.transition(KeyCode::Char('4'));
        assert_eq!(win.transition(KeyCode::Char('o')), Effect::None);
        assert_eq!(win.transition(KeyCode::Char('h')), Effect::None);
        // Refresh works everywhere.
        assert_eq!(win.transition(KeyCode::Char('r')), Effect::Refresh);
    }

    #[test]
    fn test_quit_sets_the_flag() {
        let (_dir, _cloud, mut win) = fixture();
        assert_eq!(win.transition(KeyCode::Char('q')), Effect::Quit);
        assert!(win.should_quit);
    }

    #[test]
    fn test_unknown_keys_change_nothing() {
        let (_dir, _cloud, mut win) = fixture();
        assert_eq!(win.transition(KeyCode::Char('x')), Effect::None);
        assert_eq!(win.transition(KeyCode::Tab), Effect::None);
        assert_eq!(win.nav, Nav::Topic);
        assert_eq!(win.tab, Tab::Detail);
    }

    #[tokio::test]
    async fn test_metrics_content_samples_both_metrics_over_one_hour() {
        let (_dir, cloud, mut win) = fixture();
        win.adopt_subscription("projects/acme-prod/subscriptions/orders-push", false)
            .await;
        win.nav = Nav::Subscription;
        win.tab = Tab::Metrics;
        let now = win.now.with_timezone(&Utc);

        win.update_content().await;

        let Content::Metrics { sent, undelivered } = &win.content else {
            panic!("expected metrics content");
        };
        assert!(!sent.is_empty());
        assert!(!undelivered.is_empty());

        let series_calls: Vec<_> = cloud
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::ListTimeSeries {
                    project_id,
                    filter,
                    interval,
                } => Some((project_id, filter, interval)),
                _ => None,
            })
            .collect();
        assert_eq!(series_calls.len(), 2);
        assert!(series_calls[0].1.contains("sent_message_count"));
        assert!(series_calls[1].1.contains("num_undelivered_messages"));
        for (project_id, filter, interval) in &series_calls {
            assert_eq!(project_id, "acme-prod");
            assert!(filter.contains("subscription_id = \"orders-push\""));
            assert_eq!(interval.end, now);
            assert_eq!(
                interval.end - interval.start,
                Duration::seconds(SAMPLE_WINDOW_SECS)
            );
        }
    }

    #[tokio::test]
    async fn test_detail_content_follows_the_rail() {
        let (_dir, _cloud, mut win) = fixture();
        win.adopt_topic("projects/acme-prod/topics/orders", false).await;
        win.adopt_subscription("projects/acme-prod/subscriptions/orders-push", false)
            .await;

        win.update_content().await;
        assert!(matches!(win.content, Content::Topic(_)));

        win.transition(KeyCode::Down);
        win.update_content().await;
        assert!(matches!(win.content, Content::Subscription(_)));

        win.transition(KeyCode::Char('4'));
        win.update_content().await;
        assert!(matches!(win.content, Content::Empty));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_snapshot() {
        let (_dir, cloud, mut win) = fixture();
        win.adopt_subscription("projects/acme-prod/subscriptions/orders-push", false)
            .await;

        cloud.set_unavailable(true);
        win.refresh_resources().await;

        let sub = win.sub.as_ref().unwrap();
        assert_eq!(sub.name, "projects/acme-prod/subscriptions/orders-push");
        assert!(win.status.is_some());
        // Controller keeps working after the failure.
        win.transition(KeyCode::Down);
        assert_eq!(win.nav, Nav::Subscription);
    }

    #[tokio::test]
    async fn test_adopt_saves_history_and_restore_loads_it() {
        let (_dir, cloud, mut win) = fixture();
        win.adopt_topic("projects/acme-prod/topics/orders", true).await;
        win.adopt_subscription("projects/acme-prod/subscriptions/orders-push", true)
            .await;

        let config = win.config.clone();
        let mut fresh = Window::new(config, remotes(&cloud));
        fresh.restore_recent().await;
        assert_eq!(
            fresh.topic.as_ref().map(|t| t.name.as_str()),
            Some("projects/acme-prod/topics/orders")
        );
        assert_eq!(
            fresh.sub_key.as_ref().map(|k| k.subscription_id.as_str()),
            Some("orders-push")
        );
    }

    #[tokio::test]
    async fn test_adopt_rejects_malformed_subscription_name() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("history")).unwrap();
        fs::write(dir.path().join("history/subscription"), "").unwrap();
        let config = Config::load(dir.path().to_path_buf()).unwrap();

        let cloud = Arc::new(FakeCloud::empty().with_subscription(Subscription {
            name: "weird/name".into(),
            topic: "projects/p/topics/t".into(),
            ..Subscription::default()
        }));
        let mut win = Window::new(config, remotes(&cloud));

        win.adopt_subscription("weird/name", true).await;
        assert!(win.sub.is_none());
        assert!(win.sub_key.is_none());
        assert!(win.status.as_deref().unwrap().contains("malformed"));
        assert_eq!(
            win.history.list(ResourceKind::Subscription).unwrap(),
            Vec::<String>::new()
        );
    }

    #[tokio::test]
    async fn test_open_with_empty_roster_changes_nothing() {
        let (_dir, _cloud, mut win) = fixture();
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();

        // Empty roster means the project prompt declines immediately.
        win.open(&mut terminal).await.unwrap();
        assert!(win.topic.is_none());
        assert!(win.sub.is_none());
    }

    #[tokio::test]
    async fn test_open_without_roster_file_sets_status() {
        let (dir, cloud, _unused) = fixture();
        fs::remove_file(dir.path().join("projects")).unwrap();
        let config = Config::load(dir.path().to_path_buf()).unwrap();
        let mut win = Window::new(config, remotes(&cloud));
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();

        win.open(&mut terminal).await.unwrap();
        assert!(win.status.as_deref().unwrap().contains("fetch-projects"));
    }

    #[tokio::test]
    async fn test_history_pick_with_empty_history_changes_nothing() {
        let (_dir, _cloud, mut win) = fixture();
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();

        win.history_pick(&mut terminal).await.unwrap();
        assert!(win.topic.is_none());
        assert_eq!(
            win.history.list(ResourceKind::Topic).unwrap(),
            Vec::<String>::new()
        );
    }
}

//! Layout renderer.
//!
//! Draws one frame from the window state: header with account and
//! clock, navigation rail on the left, tab strip and content pane on
//! the right, key hints in the footer. Pure line builders are split
//! out so the pane content is testable without a backend.

use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph},
};

use pubsub_meta_core::metrics::MetricSeries;
use pubsub_meta_core::model::{Subscription, Topic};

use crate::theme::Theme;
use crate::window::{Content, Nav, Tab, Window};

pub fn render(frame: &mut Frame<'_>, win: &Window) {
    let border = if win.flash {
        win.theme.border_flash_style()
    } else {
        win.theme.border_style()
    };
    let outer = Block::default().borders(Borders::ALL).border_style(border);
    let inner = outer.inner(frame.area());
    frame.render_widget(outer, frame.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    render_header(frame, win, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(18), Constraint::Min(1)])
        .split(rows[1]);
    render_nav(frame, win, body[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(body[1]);
    render_tabs(frame, win, right[0]);
    render_content(frame, win, right[1]);

    render_footer(frame, win, rows[2]);
}

fn render_header(frame: &mut Frame<'_>, win: &Window, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(32),
            Constraint::Percentage(34),
        ])
        .split(area);

    let account = win.config.account.as_deref().unwrap_or("(no account)");
    frame.render_widget(
        Paragraph::new(account.to_string()).style(win.theme.text_dim_style()),
        cols[0],
    );
    frame.render_widget(
        Paragraph::new("PUBSUB META")
            .style(win.theme.accent_style())
            .alignment(Alignment::Center),
        cols[1],
    );
    frame.render_widget(
        Paragraph::new(win.now.format("%Y-%m-%d %H:%M:%S").to_string())
            .style(win.theme.text_dim_style())
            .alignment(Alignment::Right),
        cols[2],
    );
}

fn render_nav(frame: &mut Frame<'_>, win: &Window, area: Rect) {
    let items: Vec<ListItem> = Nav::ALL
        .iter()
        .map(|entry| {
            let marker = if *entry == win.nav { "▸ " } else { "  " };
            ListItem::new(format!("{marker}{}", entry.label()))
                .style(win.theme.nav_style(*entry == win.nav))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::RIGHT)
            .border_style(win.theme.border_style()),
    );
    frame.render_widget(list, area);
}

fn render_tabs(frame: &mut Frame<'_>, win: &Window, area: Rect) {
    let mut spans = Vec::new();
    for tab in Tab::ALL {
        spans.push(Span::styled(
            format!(" {} ", tab.label()),
            win.theme.tab_style(tab == win.tab),
        ));
        spans.push(Span::styled("│", win.theme.text_muted_style()));
    }
    spans.pop();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_content(frame: &mut Frame<'_>, win: &Window, area: Rect) {
    match &win.content {
        Content::Empty => {
            frame.render_widget(
                Paragraph::new("nothing to show - open (o) a resource")
                    .style(win.theme.text_muted_style())
                    .alignment(Alignment::Center),
                area,
            );
        }
        Content::Topic(topic) => {
            frame.render_widget(
                Paragraph::new(topic_lines(&win.theme, topic)),
                area,
            );
        }
        Content::Subscription(sub) => {
            frame.render_widget(
                Paragraph::new(subscription_lines(&win.theme, sub)),
                area,
            );
        }
        Content::Metrics { sent, undelivered } => {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area);
            render_metric_chart(frame, win, halves[0], "sent_message_count", sent);
            render_metric_chart(
                frame,
                win,
                halves[1],
                "num_undelivered_messages",
                undelivered,
            );
        }
    }
}

fn render_metric_chart(
    frame: &mut Frame<'_>,
    win: &Window,
    area: Rect,
    title: &str,
    series: &MetricSeries,
) {
    if series.is_empty() {
        frame.render_widget(
            Paragraph::new("no data")
                .style(win.theme.text_muted_style())
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .title(format!(" {title} "))
                        .borders(Borders::ALL)
                        .border_style(win.theme.border_style()),
                ),
            area,
        );
        return;
    }

    let data = chart_points(series);
    let t_min = data.first().map(|(t, _)| *t).unwrap_or(0.0);
    let t_max = data.last().map(|(t, _)| *t).unwrap_or(1.0);
    let v_max = data.iter().map(|(_, v)| *v).fold(1.0_f64, f64::max);

    let dataset = Dataset::default()
        .name(title.to_string())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(win.theme.accent_style())
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .title(format!(" {title} "))
                .borders(Borders::ALL)
                .border_style(win.theme.border_style()),
        )
        .x_axis(Axis::default().bounds([t_min, t_max]).labels(vec![
            Span::raw(axis_stamp(series.stamps.first())),
            Span::raw(axis_stamp(series.stamps.last())),
        ]))
        .y_axis(Axis::default().bounds([0.0, v_max]).labels(vec![
            Span::raw("0"),
            Span::raw(format!("{v_max:.0}")),
        ]));
    frame.render_widget(chart, area);
}

fn render_footer(frame: &mut Frame<'_>, win: &Window, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Percentage(40)])
        .split(area);
    frame.render_widget(
        Paragraph::new("open (o) | refresh (r) | history (h) | quit (q)")
            .style(win.theme.key_hint_style()),
        cols[0],
    );
    if let Some(status) = &win.status {
        frame.render_widget(
            Paragraph::new(status.clone())
                .style(win.theme.warn_style())
                .alignment(Alignment::Right),
            cols[1],
        );
    }
}

fn axis_stamp(at: Option<&DateTime<Utc>>) -> String {
    at.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
}

fn field_line(theme: &Theme, name: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{name:<28}"), theme.field_style()),
        Span::styled(value, theme.text_style()),
    ])
}

pub fn topic_lines(theme: &Theme, topic: &Topic) -> Vec<Line<'static>> {
    let mut lines = vec![field_line(theme, "name", topic.name.clone())];
    let labels = if topic.labels.is_empty() {
        "(none)".to_string()
    } else {
        topic
            .labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    lines.push(field_line(theme, "labels", labels));
    match &topic.schema_settings {
        Some(schema) => {
            lines.push(field_line(theme, "schema", schema.schema.clone()));
            lines.push(field_line(
                theme,
                "schema encoding",
                format!("{:?}", schema.encoding),
            ));
        }
        None => lines.push(field_line(theme, "schema", "(none)".to_string())),
    }
    lines
}

pub fn subscription_lines(theme: &Theme, sub: &Subscription) -> Vec<Line<'static>> {
    let mut lines = vec![
        field_line(theme, "name", sub.name.clone()),
        field_line(theme, "topic", sub.topic.clone()),
        field_line(theme, "state", sub.state.label().to_string()),
        field_line(
            theme,
            "ack deadline",
            format!("{}s", sub.ack_deadline_seconds),
        ),
        field_line(
            theme,
            "message retention",
            format!("{}s", sub.message_retention_secs),
        ),
        field_line(
            theme,
            "message ordering",
            sub.enable_message_ordering.to_string(),
        ),
        field_line(
            theme,
            "exactly once delivery",
            sub.enable_exactly_once_delivery.to_string(),
        ),
    ];
    if !sub.filter.is_empty() {
        lines.push(field_line(theme, "filter", sub.filter.clone()));
    }
    if let Some(dlq) = &sub.dead_letter_policy {
        lines.push(field_line(
            theme,
            "dead letter topic",
            dlq.dead_letter_topic.clone(),
        ));
        lines.push(field_line(
            theme,
            "max delivery attempts",
            dlq.max_delivery_attempts.to_string(),
        ));
    }
    if let Some(retry) = &sub.retry_policy {
        lines.push(field_line(
            theme,
            "retry backoff",
            format!(
                "{}s .. {}s",
                retry.minimum_backoff_secs, retry.maximum_backoff_secs
            ),
        ));
    }
    if let Some(expiration) = &sub.expiration_policy {
        lines.push(field_line(
            theme,
            "expiration ttl",
            format!("{}s", expiration.ttl_secs),
        ));
    }
    lines
}

/// Timestamp/value pairs as chart coordinates, seconds on the x axis.
pub fn chart_points(series: &MetricSeries) -> Vec<(f64, f64)> {
    series
        .stamps
        .iter()
        .zip(&series.values)
        .map(|(at, value)| (at.timestamp() as f64, *value as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pubsub_meta_core::config::Skin;
    use pubsub_meta_core::model::{DeadLetterPolicy, SubscriptionState};

    fn theme() -> Theme {
        Theme::for_skin(Skin::Dark)
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_chart_points_pair_up_in_order() {
        let series = MetricSeries {
            stamps: vec![
                Utc.timestamp_opt(1_000, 0).unwrap(),
                Utc.timestamp_opt(1_300, 0).unwrap(),
            ],
            values: vec![5, 9],
        };
        assert_eq!(chart_points(&series), vec![(1_000.0, 5.0), (1_300.0, 9.0)]);
    }

    #[test]
    fn test_topic_lines_cover_labels_and_schema() {
        let t = theme();
        let topic = Topic {
            name: "projects/p/topics/orders".into(),
            labels: [("team".to_string(), "checkout".to_string())].into(),
            schema_settings: None,
        };
        let lines = topic_lines(&t, &topic);
        assert!(line_text(&lines[0]).contains("projects/p/topics/orders"));
        assert!(line_text(&lines[1]).contains("team=checkout"));
        assert!(line_text(&lines[2]).contains("(none)"));
    }

    #[test]
    fn test_subscription_lines_skip_absent_policies() {
        let t = theme();
        let sub = Subscription {
            name: "projects/p/subscriptions/s".into(),
            topic: "projects/p/topics/t".into(),
            ack_deadline_seconds: 10,
            state: SubscriptionState::Active,
            ..Subscription::default()
        };
        let lines = subscription_lines(&t, &sub);
        let all: String = lines.iter().map(line_text).collect();
        assert!(all.contains("active"));
        assert!(!all.contains("dead letter"));
        assert!(!all.contains("retry backoff"));
    }

    #[test]
    fn test_subscription_lines_show_dead_letter_policy() {
        let t = theme();
        let sub = Subscription {
            name: "projects/p/subscriptions/s".into(),
            topic: "projects/p/topics/t".into(),
            dead_letter_policy: Some(DeadLetterPolicy {
                dead_letter_topic: "projects/p/topics/dlq".into(),
                max_delivery_attempts: 5,
            }),
            ..Subscription::default()
        };
        let all: String = subscription_lines(&t, &sub).iter().map(line_text).collect();
        assert!(all.contains("projects/p/topics/dlq"));
        assert!(all.contains('5'));
    }
}

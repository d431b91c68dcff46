//! Modal pick-one prompt.
//!
//! Blocks the dashboard loop with its own little event loop: a query
//! line plus a scrolling list of candidates, fuzzy-filtered as the
//! user types. Enter confirms, Esc cancels. With no candidates at all
//! the prompt declines immediately instead of trapping the user in an
//! unfillable modal.

use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::theme::Theme;

fn fuzzy_matches(candidate: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    let candidate_lower = candidate.to_lowercase();
    let pattern_lower = pattern.to_lowercase();

    let mut pattern_chars = pattern_lower.chars().peekable();
    for c in candidate_lower.chars() {
        if pattern_chars.peek() == Some(&c) {
            pattern_chars.next();
        }
    }
    pattern_chars.peek().is_none()
}

fn fuzzy_score(candidate: &str, pattern: &str) -> i32 {
    if pattern.is_empty() {
        return 0;
    }
    let candidate_lower = candidate.to_lowercase();
    let pattern_lower = pattern.to_lowercase();

    // Exact prefix match: highest score
    if candidate_lower.starts_with(&pattern_lower) {
        return 1000 - candidate.len() as i32;
    }
    // Contains match
    if candidate_lower.contains(&pattern_lower) {
        return 500 - candidate.len() as i32;
    }
    // Fuzzy match score
    if fuzzy_matches(candidate, pattern) {
        return 100 - candidate.len() as i32;
    }
    -1000
}

/// Candidates surviving the query, best score first. An empty query
/// keeps the original order.
pub fn filter_candidates(candidates: &[String], query: &str) -> Vec<String> {
    if query.is_empty() {
        return candidates.to_vec();
    }
    let mut scored: Vec<(String, i32)> = candidates
        .iter()
        .filter(|c| fuzzy_matches(c, query))
        .map(|c| (c.clone(), fuzzy_score(c, query)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(c, _)| c).collect()
}

/// Runs the modal prompt until the user confirms or cancels. Returns
/// `None` on cancel, on Enter with nothing matching, or right away
/// when `candidates` is empty.
pub fn pick_one<B: Backend>(
    terminal: &mut Terminal<B>,
    theme: &Theme,
    title: &str,
    candidates: &[String],
) -> io::Result<Option<String>> {
    if candidates.is_empty() {
        return Ok(None);
    }

    let mut query = String::new();
    let mut pick: usize = 0;
    let mut offset: usize = 0;

    loop {
        let filtered = filter_candidates(candidates, &query);
        if pick >= filtered.len() {
            pick = filtered.len().saturating_sub(1);
        }

        terminal.draw(|frame| {
            draw_modal(frame, theme, title, &query, &filtered, pick, &mut offset);
        })?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Esc => return Ok(None),
            KeyCode::Enter => {
                return Ok(filtered.get(pick).cloned());
            }
            KeyCode::Up => pick = pick.saturating_sub(1),
            KeyCode::Down => {
                if pick + 1 < filtered.len() {
                    pick += 1;
                }
            }
            KeyCode::PageUp => pick = pick.saturating_sub(10),
            KeyCode::PageDown => {
                pick = (pick + 10).min(filtered.len().saturating_sub(1));
            }
            KeyCode::Home => pick = 0,
            KeyCode::End => pick = filtered.len().saturating_sub(1),
            KeyCode::Backspace => {
                query.pop();
                pick = 0;
                offset = 0;
            }
            KeyCode::Char(c) => {
                query.push(c);
                pick = 0;
                offset = 0;
            }
            _ => {}
        }
    }
}

fn draw_modal(
    frame: &mut ratatui::Frame<'_>,
    theme: &Theme,
    title: &str,
    query: &str,
    filtered: &[String],
    pick: usize,
    offset: &mut usize,
) {
    let area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {title} "))
        .title_style(theme.title_style())
        .borders(Borders::ALL)
        .border_style(theme.border_style());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", theme.accent_style()),
        Span::styled(query.to_string(), theme.text_style()),
    ]));
    frame.render_widget(input, rows[0]);
    frame.set_cursor_position(Position::new(
        rows[0].x + 2 + query.len() as u16,
        rows[0].y,
    ));

    let visible = rows[1].height as usize;
    if visible > 0 {
        if pick < *offset {
            *offset = pick;
        } else if pick >= *offset + visible {
            *offset = pick + 1 - visible;
        }
    }

    let items: Vec<ListItem> = filtered
        .iter()
        .enumerate()
        .skip(*offset)
        .take(visible.max(1))
        .map(|(i, candidate)| {
            if i == pick {
                ListItem::new(format!("▸ {candidate}")).style(theme.selection_style())
            } else {
                ListItem::new(format!("  {candidate}")).style(theme.text_style())
            }
        })
        .collect();
    frame.render_widget(List::new(items), rows[1]);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn candidates() -> Vec<String> {
        vec![
            "orders".to_string(),
            "orders-dlq".to_string(),
            "audit-archiver".to_string(),
            "billing".to_string(),
        ]
    }

    #[test]
    fn test_empty_query_keeps_everything_in_order() {
        assert_eq!(filter_candidates(&candidates(), ""), candidates());
    }

    #[test]
    fn test_prefix_beats_contains_beats_fuzzy() {
        let list = vec![
            "billing-orders".to_string(),
            "ord-billing-ers".to_string(),
            "orders".to_string(),
        ];
        let filtered = filter_candidates(&list, "orders");
        assert_eq!(filtered[0], "orders");
        assert_eq!(filtered[1], "billing-orders");
        assert_eq!(filtered[2], "ord-billing-ers");
    }

    #[test]
    fn test_non_matching_candidates_are_dropped() {
        let filtered = filter_candidates(&candidates(), "audit");
        assert_eq!(filtered, vec!["audit-archiver"]);
    }

    #[test]
    fn test_fuzzy_is_case_insensitive_subsequence() {
        assert!(fuzzy_matches("Audit-Archiver", "adtrchr"));
        assert!(!fuzzy_matches("orders", "zz"));
    }

    #[test]
    fn test_pick_one_declines_without_candidates() {
        let backend = TestBackend::new(40, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::for_skin(pubsub_meta_core::config::Skin::Dark);

        // Returns before drawing or reading any event.
        let picked = pick_one(&mut terminal, &theme, "Project", &[]).unwrap();
        assert_eq!(picked, None);
    }
}

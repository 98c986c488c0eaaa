//! Evidence locker: consolidated timeline, encryption-at-rest proof, and
//! the full audit report.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::api::models::{EncryptionDemo, EvidenceTimeline};
use crate::ui::format::{short_time, truncate};
use crate::ui::Action;

pub struct EvidenceView {
    pub timeline: Option<EvidenceTimeline>,
    pub demo: Option<EncryptionDemo>,
    pub show_decrypted: bool,
    pub error: Option<String>,
    pub in_flight: bool,
}

impl EvidenceView {
    pub fn new() -> Self {
        Self {
            timeline: None,
            demo: None,
            show_decrypted: false,
            error: None,
            in_flight: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('e') => {
                self.show_decrypted = !self.show_decrypted;
                Action::None
            }
            KeyCode::Char('a') if !self.in_flight => {
                self.in_flight = true;
                Action::GenerateAuditReport
            }
            KeyCode::Char('r') => Action::RefreshTab,
            _ => Action::None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        self.render_timeline(frame, cols[0]);
        self.render_encryption(frame, cols[1]);
    }

    fn render_timeline(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        match &self.timeline {
            Some(evidence) => {
                let items: Vec<ListItem> = evidence
                    .timeline
                    .iter()
                    .rev()
                    .map(|event| {
                        ListItem::new(Line::from(vec![
                            Span::styled(
                                short_time(&event.time).to_string(),
                                Style::default().fg(Color::DarkGray),
                            ),
                            Span::raw(format!("  [{}] {}", event.kind, event.event)),
                        ]))
                    })
                    .collect();
                frame.render_widget(
                    List::new(items).block(Block::default().borders(Borders::ALL).title(format!(
                        " Evidence Timeline ({} reports) ",
                        evidence.reports_count
                    ))),
                    rows[0],
                );
            }
            None => {
                let text = match &self.error {
                    Some(error) => format!("[!!] {}", error),
                    None => "Loading evidence...".to_string(),
                };
                frame.render_widget(
                    Paragraph::new(text)
                        .block(Block::default().borders(Borders::ALL).title(" Evidence Timeline ")),
                    rows[0],
                );
            }
        }

        let help = if self.in_flight {
            Line::styled("Generating audit report...", Style::default().fg(Color::Yellow))
        } else {
            Line::styled("a audit report pdf  r refresh", Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(Paragraph::new(help), rows[1]);
    }

    fn render_encryption(&self, frame: &mut Frame, area: Rect) {
        let (title, lines) = match &self.demo {
            Some(demo) => {
                let rows = if self.show_decrypted { &demo.decrypted } else { &demo.raw };
                let mut lines: Vec<Line> = rows
                    .iter()
                    .take(10)
                    .map(|c| {
                        Line::raw(format!(
                            "{:<12} {:<20} {}",
                            c.customer_id,
                            truncate(&c.name, 20),
                            truncate(&c.email, 30)
                        ))
                    })
                    .collect();
                lines.push(Line::raw(""));
                lines.push(Line::styled(
                    "e toggle raw/decrypted",
                    Style::default().fg(Color::DarkGray),
                ));
                (
                    if self.show_decrypted {
                        " Encryption Proof [decrypted view] "
                    } else {
                        " Encryption Proof [at rest] "
                    },
                    lines,
                )
            }
            None => (" Encryption Proof ", vec![Line::raw("Loading...")]),
        };
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
            ),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_encryption_toggle() {
        let mut view = EvidenceView::new();
        assert!(!view.show_decrypted);
        view.handle_key(key(KeyCode::Char('e')));
        assert!(view.show_decrypted);
        view.handle_key(key(KeyCode::Char('e')));
        assert!(!view.show_decrypted);
    }

    #[test]
    fn test_audit_report_single_flight() {
        let mut view = EvidenceView::new();
        assert!(matches!(
            view.handle_key(key(KeyCode::Char('a'))),
            Action::GenerateAuditReport
        ));
        assert!(matches!(view.handle_key(key(KeyCode::Char('a'))), Action::None));
    }
}

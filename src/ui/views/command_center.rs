//! Command Center: live stats cards, system status, and the breach trigger.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::api::models::{BreachState, BreachTriggerRequest, DashboardStats};
use crate::ui::format::dpb_countdown;
use crate::ui::widgets::{centered_rect, render_dialog_frame, render_form, Form, TextField};
use crate::ui::Action;

pub struct CommandCenterView {
    pub stats: DashboardStats,
    pub error: Option<String>,
    pub trigger_dialog: Option<Form>,
    pub in_flight: bool,
}

impl CommandCenterView {
    pub fn new() -> Self {
        Self {
            stats: DashboardStats::default(),
            error: None,
            trigger_dialog: None,
            in_flight: false,
        }
    }

    fn open_trigger_dialog(&mut self) {
        let defaults = BreachTriggerRequest::default();
        self.trigger_dialog = Some(Form::new(vec![
            TextField::with_value("Nature", &defaults.nature),
            TextField::with_value("Systems", &defaults.systems),
            TextField::with_value("Categories", &defaults.categories),
            TextField::with_value("Affected", &defaults.affected_count.to_string()),
            TextField::with_value("Description", &defaults.description),
        ]));
    }

    /// Build the trigger payload from the dialog; blank or non-numeric
    /// fields fall back to the standard scenario.
    fn trigger_request(form: &Form) -> BreachTriggerRequest {
        let defaults = BreachTriggerRequest::default();
        BreachTriggerRequest {
            nature: form.optional_value(0).unwrap_or(defaults.nature),
            systems: form.optional_value(1).unwrap_or(defaults.systems),
            categories: form.optional_value(2).unwrap_or(defaults.categories),
            affected_count: form
                .value(3)
                .trim()
                .parse()
                .unwrap_or(defaults.affected_count),
            description: form.optional_value(4).unwrap_or(defaults.description),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, breach: &BreachState) -> Action {
        if let Some(form) = &mut self.trigger_dialog {
            match key.code {
                KeyCode::Esc => self.trigger_dialog = None,
                KeyCode::Tab | KeyCode::Down => form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.push(c),
                KeyCode::Enter => {
                    let req = Self::trigger_request(form);
                    self.trigger_dialog = None;
                    self.in_flight = true;
                    return Action::TriggerBreach(req);
                }
                _ => {}
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Char('t') if !breach.active && !self.in_flight => {
                self.open_trigger_dialog();
            }
            KeyCode::Char('r') => return Action::RefreshTab,
            _ => {}
        }
        Action::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, breach: &BreachState) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(5),
                Constraint::Min(0),
            ])
            .split(area);

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
            ])
            .split(rows[0]);

        render_card(frame, cards[0], "Customers", &self.stats.total_customers.to_string());
        render_card(frame, cards[1], "Active", &self.stats.active_customers.to_string());
        render_card(frame, cards[2], "Reports Sent", &self.stats.total_reports.to_string());
        render_card(frame, cards[3], "DPDP Requests", &self.stats.total_requests.to_string());

        self.render_breach_banner(frame, rows[1], breach);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("[OK] ", Style::default().fg(Color::Green)),
                Span::raw("Encryption at rest active"),
            ]),
            Line::from(vec![
                Span::styled("[OK] ", Style::default().fg(Color::Green)),
                Span::raw("Audit logging active"),
            ]),
        ];
        if let Some(error) = &self.error {
            lines.push(Line::styled(
                format!("[!!] {}", error),
                Style::default().fg(Color::Red),
            ));
        }
        lines.push(Line::raw(""));
        if !breach.active {
            lines.push(Line::styled(
                "t  trigger breach protocol",
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::styled("r  refresh stats", Style::default().fg(Color::DarkGray)));
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" System ")),
            rows[2],
        );

        if let Some(form) = &self.trigger_dialog {
            let dialog = centered_rect(70, 9, area);
            let inner = render_dialog_frame(frame, dialog, "Trigger Breach Protocol");
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(5), Constraint::Length(1)])
                .split(inner);
            render_form(frame, parts[0], form);
            frame.render_widget(
                Paragraph::new(Line::styled(
                    "Enter to trigger, Esc to cancel",
                    Style::default().fg(Color::DarkGray),
                )),
                parts[1],
            );
        }
    }

    fn render_breach_banner(&self, frame: &mut Frame, area: Rect, breach: &BreachState) {
        let (title, lines, color) = if breach.active && !breach.closed {
            (
                " ACTIVE BREACH ",
                vec![
                    Line::from(vec![
                        Span::styled(
                            breach.incident_id.as_deref().unwrap_or("-").to_string(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(format!("  step {}/5  {} affected", breach.step, breach.affected_count)),
                    ]),
                    Line::raw(format!(
                        "DPB window: {} remaining",
                        dpb_countdown(breach.discovery_time.as_deref())
                    )),
                ],
                Color::Red,
            )
        } else if breach.closed {
            (
                " Incident Closed ",
                vec![Line::raw(format!(
                    "{} closed at {}",
                    breach.incident_id.as_deref().unwrap_or("-"),
                    breach.closed_at.as_deref().unwrap_or("-")
                ))],
                Color::Green,
            )
        } else {
            (
                " All Clear ",
                vec![Line::raw("No active breach incident")],
                Color::Green,
            )
        };

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(color)),
            ),
            area,
        );
    }
}

fn render_card(frame: &mut Frame, area: Rect, label: &str, value: &str) {
    let lines = vec![
        Line::styled(
            value.to_string(),
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan),
        ),
        Line::styled(label.to_string(), Style::default().fg(Color::DarkGray)),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_trigger_only_available_when_idle() {
        let mut view = CommandCenterView::new();
        let active = BreachState {
            active: true,
            ..BreachState::default()
        };
        view.handle_key(key(KeyCode::Char('t')), &active);
        assert!(view.trigger_dialog.is_none());

        view.handle_key(key(KeyCode::Char('t')), &BreachState::default());
        assert!(view.trigger_dialog.is_some());
    }

    #[test]
    fn test_trigger_request_falls_back_to_defaults() {
        let mut form = Form::new(vec![
            TextField::new("Nature"),
            TextField::new("Systems"),
            TextField::new("Categories"),
            TextField::with_value("Affected", "not a number"),
            TextField::new("Description"),
        ]);
        form.fields[0].value = "Ransomware".to_string();
        let req = CommandCenterView::trigger_request(&form);
        assert_eq!(req.nature, "Ransomware");
        assert_eq!(req.affected_count, 30);
        assert_eq!(req.systems, BreachTriggerRequest::default().systems);
    }

    #[test]
    fn test_dialog_enter_emits_trigger() {
        let mut view = CommandCenterView::new();
        view.open_trigger_dialog();
        match view.handle_key(key(KeyCode::Enter), &BreachState::default()) {
            Action::TriggerBreach(req) => assert_eq!(req.affected_count, 30),
            other => panic!("unexpected action: {:?}", other),
        }
        assert!(view.trigger_dialog.is_none());
        assert!(view.in_flight);
    }
}

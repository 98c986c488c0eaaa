//! Breach War Room: the five-step response workflow, the 72-hour DPB
//! countdown, and the incident timeline.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::api::models::BreachState;
use crate::ui::format::{dpb_countdown, short_time};
use crate::ui::Action;

pub const STEPS: [&str; 5] = ["Intake", "Containment", "Notify DPB", "Notify Users", "Close"];
pub const CHANNELS: [&str; 3] = ["EMAIL", "SMS", "WHATSAPP"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Done,
    Active,
    Pending,
}

/// Stepper state for 1-based step `num` given the server's current step.
pub fn step_state(current: i64, num: i64) -> StepState {
    if current > num {
        StepState::Done
    } else if current == num {
        StepState::Active
    } else {
        StepState::Pending
    }
}

/// Broadcast button label; the count comes from the incident record.
pub fn broadcast_label(count: i64) -> String {
    format!("Broadcast to {} Users", count)
}

pub struct WarRoomView {
    pub channel_idx: usize,
    pub in_flight: bool,
}

impl WarRoomView {
    pub fn new() -> Self {
        Self {
            channel_idx: 0,
            in_flight: false,
        }
    }

    pub fn channel(&self) -> &'static str {
        CHANNELS[self.channel_idx]
    }

    pub fn handle_key(&mut self, key: KeyEvent, breach: &BreachState) -> Action {
        if self.in_flight || !breach.active {
            return Action::None;
        }
        match key.code {
            KeyCode::Left => {
                self.channel_idx = (self.channel_idx + CHANNELS.len() - 1) % CHANNELS.len();
            }
            KeyCode::Right => {
                self.channel_idx = (self.channel_idx + 1) % CHANNELS.len();
            }
            KeyCode::Char('c') if !breach.containment_confirmed => {
                self.in_flight = true;
                return Action::Contain;
            }
            KeyCode::Char('d') if breach.containment_confirmed && !breach.dpb_sent => {
                self.in_flight = true;
                return Action::DpbNotice;
            }
            KeyCode::Char('n') if breach.dpb_sent && !breach.users_notified => {
                self.in_flight = true;
                return Action::NotifyUsers {
                    channel: self.channel().to_string(),
                };
            }
            KeyCode::Char('z') if breach.users_notified && !breach.closed => {
                self.in_flight = true;
                return Action::CloseBreach;
            }
            _ => {}
        }
        Action::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, breach: &BreachState) {
        if !breach.active {
            frame.render_widget(
                Paragraph::new("No active breach. Trigger one from the Command Center.")
                    .block(Block::default().borders(Borders::ALL).title(" War Room ")),
                area,
            );
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(7),
                Constraint::Min(0),
            ])
            .split(area);

        self.render_stepper(frame, rows[0], breach);
        self.render_countdown(frame, rows[1], breach);
        self.render_actions(frame, rows[2], breach);
        self.render_timeline(frame, rows[3], breach);
    }

    fn render_stepper(&self, frame: &mut Frame, area: Rect, breach: &BreachState) {
        let mut spans = Vec::new();
        for (i, label) in STEPS.iter().enumerate() {
            let num = (i + 1) as i64;
            let (marker, style) = match step_state(breach.step, num) {
                StepState::Done => ("[x]", Style::default().fg(Color::Green)),
                StepState::Active => (
                    "[>]",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                StepState::Pending => ("[ ]", Style::default().fg(Color::DarkGray)),
            };
            spans.push(Span::styled(format!("{} {}", marker, label), style));
            if i + 1 < STEPS.len() {
                spans.push(Span::styled("  --  ", Style::default().fg(Color::DarkGray)));
            }
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans))
                .block(Block::default().borders(Borders::ALL).title(" Response Steps ")),
            area,
        );
    }

    fn render_countdown(&self, frame: &mut Frame, area: Rect, breach: &BreachState) {
        let countdown = dpb_countdown(breach.discovery_time.as_deref());
        let expired = countdown == "00:00:00";
        let line = if breach.closed {
            Line::styled("Incident closed", Style::default().fg(Color::Green))
        } else {
            Line::from(vec![
                Span::raw("DPB notification window: "),
                Span::styled(
                    countdown,
                    Style::default()
                        .fg(if expired { Color::Red } else { Color::Yellow })
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" remaining"),
            ])
        };
        frame.render_widget(
            Paragraph::new(line).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", breach.incident_id.as_deref().unwrap_or("-"))),
            ),
            area,
        );
    }

    fn render_actions(&self, frame: &mut Frame, area: Rect, breach: &BreachState) {
        let action_line = |key: &str, label: String, enabled: bool, done: bool| {
            let style = if done {
                Style::default().fg(Color::Green)
            } else if enabled && !self.in_flight {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let marker = if done { "[x]" } else { "   " };
            Line::styled(format!("{} {}  {}", marker, key, label), style)
        };

        let lines = vec![
            action_line(
                "c",
                "Confirm Containment".to_string(),
                !breach.containment_confirmed,
                breach.containment_confirmed,
            ),
            action_line(
                "d",
                "Generate & Send DPB Notice".to_string(),
                breach.containment_confirmed && !breach.dpb_sent,
                breach.dpb_sent,
            ),
            action_line(
                "n",
                format!(
                    "{}  (channel: {}, arrows to change)",
                    broadcast_label(breach.affected_count),
                    self.channel()
                ),
                breach.dpb_sent && !breach.users_notified,
                breach.users_notified,
            ),
            action_line(
                "z",
                "Close Incident & Generate Report".to_string(),
                breach.users_notified && !breach.closed,
                breach.closed,
            ),
            Line::styled(
                if self.in_flight {
                    "Working..."
                } else {
                    "Steps unlock in order"
                },
                Style::default().fg(Color::DarkGray),
            ),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Actions ")),
            area,
        );
    }

    fn render_timeline(&self, frame: &mut Frame, area: Rect, breach: &BreachState) {
        let items: Vec<ListItem> = breach
            .timeline
            .iter()
            .rev()
            .map(|event| {
                let color = match event.kind.as_str() {
                    "trigger" | "alert" => Color::Red,
                    "action" => Color::Cyan,
                    "report" => Color::Green,
                    _ => Color::White,
                };
                ListItem::new(Line::from(vec![
                    Span::styled(short_time(&event.time).to_string(), Style::default().fg(Color::DarkGray)),
                    Span::raw("  "),
                    Span::styled(event.event.clone(), Style::default().fg(color)),
                ]))
            })
            .collect();
        frame.render_widget(
            List::new(items).block(Block::default().borders(Borders::ALL).title(" Timeline ")),
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

    fn active_breach() -> BreachState {
        BreachState {
            active: true,
            affected_count: 30,
            step: 2,
            ..BreachState::default()
        }
    }

    #[test]
    fn test_step_state_done_active_pending() {
        assert_eq!(step_state(3, 1), StepState::Done);
        assert_eq!(step_state(3, 2), StepState::Done);
        assert_eq!(step_state(3, 3), StepState::Active);
        assert_eq!(step_state(3, 4), StepState::Pending);
        assert_eq!(step_state(3, 5), StepState::Pending);
    }

    #[test]
    fn test_broadcast_label_uses_incident_count() {
        assert_eq!(broadcast_label(30), "Broadcast to 30 Users");
        assert_eq!(broadcast_label(0), "Broadcast to 0 Users");
    }

    #[test]
    fn test_actions_unlock_in_order() {
        let mut view = WarRoomView::new();
        let mut breach = active_breach();

        // DPB notice requires containment first.
        assert!(matches!(view.handle_key(key(KeyCode::Char('d')), &breach), Action::None));
        assert!(matches!(view.handle_key(key(KeyCode::Char('c')), &breach), Action::Contain));

        view.in_flight = false;
        breach.containment_confirmed = true;
        assert!(matches!(view.handle_key(key(KeyCode::Char('d')), &breach), Action::DpbNotice));

        view.in_flight = false;
        breach.dpb_sent = true;
        match view.handle_key(key(KeyCode::Char('n')), &breach) {
            Action::NotifyUsers { channel } => assert_eq!(channel, "EMAIL"),
            other => panic!("unexpected action: {:?}", other),
        }

        view.in_flight = false;
        breach.users_notified = true;
        assert!(matches!(view.handle_key(key(KeyCode::Char('z')), &breach), Action::CloseBreach));
    }

    #[test]
    fn test_completed_actions_do_not_refire() {
        let mut view = WarRoomView::new();
        let breach = BreachState {
            containment_confirmed: true,
            ..active_breach()
        };
        assert!(matches!(view.handle_key(key(KeyCode::Char('c')), &breach), Action::None));
    }

    #[test]
    fn test_channel_cycles_both_ways() {
        let mut view = WarRoomView::new();
        let breach = active_breach();
        view.handle_key(key(KeyCode::Right), &breach);
        assert_eq!(view.channel(), "SMS");
        view.handle_key(key(KeyCode::Right), &breach);
        assert_eq!(view.channel(), "WHATSAPP");
        view.handle_key(key(KeyCode::Right), &breach);
        assert_eq!(view.channel(), "EMAIL");
        view.handle_key(key(KeyCode::Left), &breach);
        assert_eq!(view.channel(), "WHATSAPP");
    }

    #[test]
    fn test_no_actions_while_in_flight() {
        let mut view = WarRoomView::new();
        view.in_flight = true;
        let breach = active_breach();
        assert!(matches!(view.handle_key(key(KeyCode::Char('c')), &breach), Action::None));
    }
}

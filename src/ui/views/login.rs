//! Login gate shown until a session token exists.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::ui::widgets::{centered_rect, render_dialog_frame, render_form, Form, TextField};
use crate::ui::Action;

pub struct LoginView {
    pub form: Form,
    pub error: Option<String>,
    pub in_flight: bool,
}

impl LoginView {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![TextField::new("Email"), TextField::masked("Password")]),
            error: None,
            in_flight: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.in_flight {
            return Action::None;
        }
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(c) => self.form.push(c),
            KeyCode::Enter => {
                let email = self.form.value(0).trim().to_string();
                let password = self.form.value(1).to_string();
                if email.is_empty() || password.is_empty() {
                    self.error = Some("Email and password are required".to_string());
                    return Action::None;
                }
                self.error = None;
                self.in_flight = true;
                return Action::Login { email, password };
            }
            _ => {}
        }
        Action::None
    }

    /// Called when the login attempt resolves.
    pub fn on_result(&mut self, error: Option<String>) {
        self.in_flight = false;
        self.error = error;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let dialog = centered_rect(52, 9, area);
        let inner = render_dialog_frame(frame, dialog, "DPDP Shield");

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new("Incident Response Console").style(Style::default().fg(Color::DarkGray)),
            rows[0],
        );
        render_form(frame, rows[1], &self.form);

        let status = if self.in_flight {
            Line::styled("Signing in...", Style::default().fg(Color::Yellow))
        } else if let Some(error) = &self.error {
            Line::styled(error.clone(), Style::default().fg(Color::Red))
        } else {
            Line::styled(
                "Enter to sign in, Tab to switch fields",
                Style::default().fg(Color::DarkGray),
            )
        };
        frame.render_widget(Paragraph::new(status), rows[2]);
        frame.render_widget(
            Paragraph::new(Line::styled(
                "Esc to quit",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
            )),
            rows[3],
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
    fn test_empty_submit_is_rejected_locally() {
        let mut view = LoginView::new();
        let action = view.handle_key(key(KeyCode::Enter));
        assert!(matches!(action, Action::None));
        assert!(view.error.is_some());
        assert!(!view.in_flight);
    }

    #[test]
    fn test_filled_submit_emits_login() {
        let mut view = LoginView::new();
        for c in "admin@dpdp.local".chars() {
            view.handle_key(key(KeyCode::Char(c)));
        }
        view.handle_key(key(KeyCode::Tab));
        for c in "secret".chars() {
            view.handle_key(key(KeyCode::Char(c)));
        }
        match view.handle_key(key(KeyCode::Enter)) {
            Action::Login { email, password } => {
                assert_eq!(email, "admin@dpdp.local");
                assert_eq!(password, "secret");
            }
            other => panic!("unexpected action: {:?}", other),
        }
        assert!(view.in_flight);
    }

    #[test]
    fn test_keys_ignored_while_in_flight() {
        let mut view = LoginView::new();
        view.in_flight = true;
        view.handle_key(key(KeyCode::Char('x')));
        assert_eq!(view.form.value(0), "");
    }
}

//! Settings: theme, attack simulation flags, integrations, and the Gmail
//! app password. The whole settings object is written back on each change.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::api::models::{AppSettings, ConnectionStatus};
use crate::ui::widgets::{centered_rect, render_dialog_frame, TextField};
use crate::ui::Action;

pub struct SettingsView {
    pub settings: Option<AppSettings>,
    pub mail_status: Option<ConnectionStatus>,
    pub selected: usize,
    pub gmail_dialog: Option<TextField>,
    pub error: Option<String>,
    pub in_flight: bool,
}

impl SettingsView {
    pub fn new() -> Self {
        Self {
            settings: None,
            mail_status: None,
            selected: 0,
            gmail_dialog: None,
            error: None,
            in_flight: false,
        }
    }

    /// Toggle keys in display order: the three simulation flags, then
    /// integrations alphabetically.
    pub fn toggle_keys(settings: &AppSettings) -> Vec<String> {
        let mut keys = vec![
            "sim_leaked_api_key".to_string(),
            "sim_mailbox_forwarding".to_string(),
            "sim_mass_download".to_string(),
        ];
        keys.extend(settings.integrations.keys().cloned());
        keys
    }

    fn toggle_value(settings: &AppSettings, key: &str) -> bool {
        match key {
            "sim_leaked_api_key" => settings.sim_leaked_api_key,
            "sim_mailbox_forwarding" => settings.sim_mailbox_forwarding,
            "sim_mass_download" => settings.sim_mass_download,
            other => settings.integrations.get(other).copied().unwrap_or(false),
        }
    }

    /// Flip one key and return the full object for a whole-document PUT.
    pub fn toggled(settings: &AppSettings, key: &str) -> AppSettings {
        let mut next = settings.clone();
        match key {
            "sim_leaked_api_key" => next.sim_leaked_api_key = !next.sim_leaked_api_key,
            "sim_mailbox_forwarding" => {
                next.sim_mailbox_forwarding = !next.sim_mailbox_forwarding
            }
            "sim_mass_download" => next.sim_mass_download = !next.sim_mass_download,
            other => {
                let current = next.integrations.get(other).copied().unwrap_or(false);
                next.integrations.insert(other.to_string(), !current);
            }
        }
        next
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if let Some(field) = &mut self.gmail_dialog {
            match key.code {
                KeyCode::Esc => self.gmail_dialog = None,
                KeyCode::Backspace => field.backspace(),
                KeyCode::Char(c) => field.push(c),
                KeyCode::Enter if !field.value.is_empty() => {
                    let password = field.value.clone();
                    self.gmail_dialog = None;
                    return Action::SetGmailPassword(password);
                }
                _ => {}
            }
            return Action::None;
        }

        let Some(settings) = &self.settings else {
            if key.code == KeyCode::Char('r') {
                return Action::RefreshTab;
            }
            return Action::None;
        };
        let keys = Self::toggle_keys(settings);

        match key.code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < keys.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter if !self.in_flight => {
                if let Some(toggle_key) = keys.get(self.selected) {
                    self.in_flight = true;
                    return Action::UpdateSettings(Self::toggled(settings, toggle_key));
                }
            }
            KeyCode::Char('g') => {
                self.gmail_dialog = Some(TextField::masked("App password"));
            }
            KeyCode::Char('r') => return Action::RefreshTab,
            _ => {}
        }
        Action::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &str) {
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Theme: ", Style::default().fg(Color::DarkGray)),
                Span::raw(theme.to_string()),
                Span::styled("  (T to toggle)", Style::default().fg(Color::DarkGray)),
            ]),
            match &self.mail_status {
                Some(status) if status.connected => Line::from(vec![
                    Span::styled("Mailbox: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("connected as {}", status.email),
                        Style::default().fg(Color::Green),
                    ),
                ]),
                Some(status) => Line::from(vec![
                    Span::styled("Mailbox: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("offline ({})", status.error.as_deref().unwrap_or("not connected")),
                        Style::default().fg(Color::Red),
                    ),
                ]),
                None => Line::styled("Mailbox: checking...", Style::default().fg(Color::DarkGray)),
            },
            Line::raw(""),
        ];

        match &self.settings {
            Some(settings) => {
                for (i, key) in Self::toggle_keys(settings).iter().enumerate() {
                    let value = Self::toggle_value(settings, key);
                    let marker = if value { "[on] " } else { "[off]" };
                    let mut style = if value {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    if i == self.selected {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    lines.push(Line::styled(format!("{} {}", marker, key), style));
                }
                lines.push(Line::raw(""));
                lines.push(Line::styled(
                    "space toggle  g gmail app password  r refresh",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            None => {
                let text = match &self.error {
                    Some(error) => format!("[!!] {}", error),
                    None => "Loading settings...".to_string(),
                };
                lines.push(Line::raw(text));
            }
        }
        if self.in_flight {
            lines.push(Line::styled("Saving...", Style::default().fg(Color::Yellow)));
        }

        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Settings ")),
            area,
        );

        if let Some(field) = &self.gmail_dialog {
            let rect = centered_rect(48, 5, area);
            let inner = render_dialog_frame(frame, rect, "Gmail App Password");
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Length(1)])
                .split(inner);
            frame.render_widget(Paragraph::new(field.display_value()), rows[0]);
            frame.render_widget(
                Paragraph::new(Line::styled(
                    "Enter to save, Esc to cancel",
                    Style::default().fg(Color::DarkGray),
                )),
                rows[1],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample_settings() -> AppSettings {
        let mut settings = AppSettings {
            sim_mass_download: true,
            ..AppSettings::default()
        };
        settings.integrations.insert("zoho".to_string(), false);
        settings
            .extra
            .insert("audit_retention_days".to_string(), serde_json::json!(90));
        settings
    }

    #[test]
    fn test_toggled_flips_only_target_and_keeps_extras() {
        let settings = sample_settings();
        let next = SettingsView::toggled(&settings, "zoho");
        assert_eq!(next.integrations.get("zoho"), Some(&true));
        assert!(next.sim_mass_download);
        assert_eq!(next.extra.get("audit_retention_days"), Some(&serde_json::json!(90)));

        let next = SettingsView::toggled(&settings, "sim_mass_download");
        assert!(!next.sim_mass_download);
    }

    #[test]
    fn test_space_emits_whole_settings_update() {
        let mut view = SettingsView::new();
        view.settings = Some(sample_settings());
        match view.handle_key(key(KeyCode::Char(' '))) {
            Action::UpdateSettings(next) => assert!(next.sim_leaked_api_key),
            other => panic!("unexpected action: {:?}", other),
        }
        assert!(view.in_flight);
    }

    #[test]
    fn test_gmail_dialog_requires_non_empty() {
        let mut view = SettingsView::new();
        view.settings = Some(sample_settings());
        view.handle_key(key(KeyCode::Char('g')));
        assert!(view.gmail_dialog.is_some());
        assert!(matches!(view.handle_key(key(KeyCode::Enter)), Action::None));
        view.handle_key(key(KeyCode::Char('s')));
        match view.handle_key(key(KeyCode::Enter)) {
            Action::SetGmailPassword(pw) => assert_eq!(pw, "s"),
            other => panic!("unexpected action: {:?}", other),
        }
        assert!(view.gmail_dialog.is_none());
    }
}

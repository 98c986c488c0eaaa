//! DPDP request mailbox: inbox listing, intent processing, OTP
//! verification, and correction entry.
//!
//! Processed requests are joined back to inbox entries through the
//! `request_id` the backend returns from a process call, recorded in a
//! client-side map. Subject-line matching is never used.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use std::collections::HashMap;

use crate::api::models::{
    CorrectionRequest, InboxResponse, MailReply, ProcessOutcome, VerifyOutcome,
};
use crate::ui::format::truncate;
use crate::ui::widgets::{centered_rect, render_dialog_frame, render_form, Form, TextField};
use crate::ui::Action;

pub struct OtpDialog {
    pub request_id: String,
    pub otp: String,
    pub sent_to: String,
    /// Simulation-mode OTP echoed back by the backend, shown so the flow
    /// can be completed without a real mailbox.
    pub demo_hint: Option<String>,
    pub error: Option<String>,
    pub in_flight: bool,
}

impl OtpDialog {
    /// The verify control unlocks at exactly six characters; the backend
    /// owns all further validation.
    pub fn can_submit(&self) -> bool {
        self.otp.chars().count() == 6
    }
}

pub struct CorrectionDialog {
    pub request_id: String,
    pub customer_id: String,
    pub form: Form,
    pub in_flight: bool,
}

pub struct MailboxView {
    pub inbox: InboxResponse,
    pub replies: Vec<MailReply>,
    pub selected: usize,
    pub error: Option<String>,
    pub processing: bool,
    pub otp_dialog: Option<OtpDialog>,
    pub correction_dialog: Option<CorrectionDialog>,
    /// email_id -> request_id, recorded when a process call returns.
    request_ids: HashMap<String, String>,
}

impl MailboxView {
    pub fn new() -> Self {
        Self {
            inbox: InboxResponse::default(),
            replies: Vec::new(),
            selected: 0,
            error: None,
            processing: false,
            otp_dialog: None,
            correction_dialog: None,
            request_ids: HashMap::new(),
        }
    }

    /// The processed record for an inbox email, if one exists.
    pub fn reply_for(&self, email_id: &str) -> Option<&MailReply> {
        let request_id = self.request_ids.get(email_id)?;
        self.replies.iter().find(|r| &r.request_id == request_id)
    }

    pub fn on_processed(&mut self, email_id: &str, outcome: &ProcessOutcome) {
        self.processing = false;
        if !outcome.request_id.is_empty() {
            self.request_ids
                .insert(email_id.to_string(), outcome.request_id.clone());
        }
        if outcome.status == "OTP_SENT" {
            self.otp_dialog = Some(OtpDialog {
                request_id: outcome.request_id.clone(),
                otp: String::new(),
                sent_to: outcome.otp_sent_to.clone().unwrap_or_default(),
                demo_hint: outcome.otp_for_demo.clone(),
                error: None,
                in_flight: false,
            });
        }
    }

    pub fn on_verified(&mut self, outcome: &VerifyOutcome) {
        if let Some(dialog) = &mut self.otp_dialog {
            dialog.in_flight = false;
            if !outcome.verified {
                dialog.error = Some("Invalid or expired OTP".to_string());
                dialog.otp.clear();
                return;
            }
        }
        let request_id = self
            .otp_dialog
            .take()
            .map(|d| d.request_id)
            .unwrap_or_default();
        if outcome.needs_correction_data {
            self.correction_dialog = Some(CorrectionDialog {
                request_id,
                customer_id: outcome.customer_id.clone(),
                form: Form::new(vec![
                    TextField::new("New name"),
                    TextField::new("New email"),
                    TextField::new("New phone"),
                ]),
                in_flight: false,
            });
        }
    }

    pub fn on_verify_failed(&mut self, message: String) {
        if let Some(dialog) = &mut self.otp_dialog {
            dialog.in_flight = false;
            dialog.error = Some(message);
            dialog.otp.clear();
        }
    }

    pub fn on_correction_done(&mut self) {
        self.correction_dialog = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if let Some(dialog) = &mut self.otp_dialog {
            match key.code {
                KeyCode::Esc => self.otp_dialog = None,
                KeyCode::Backspace => {
                    dialog.otp.pop();
                }
                KeyCode::Char(c) if dialog.otp.chars().count() < 6 => {
                    dialog.otp.push(c);
                }
                KeyCode::Enter if dialog.can_submit() && !dialog.in_flight => {
                    dialog.in_flight = true;
                    dialog.error = None;
                    return Action::VerifyOtp {
                        request_id: dialog.request_id.clone(),
                        otp: dialog.otp.clone(),
                    };
                }
                _ => {}
            }
            return Action::None;
        }

        if let Some(dialog) = &mut self.correction_dialog {
            match key.code {
                KeyCode::Esc => self.correction_dialog = None,
                KeyCode::Tab | KeyCode::Down => dialog.form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => dialog.form.focus_prev(),
                KeyCode::Backspace => dialog.form.backspace(),
                KeyCode::Char(c) => dialog.form.push(c),
                KeyCode::Enter if !dialog.in_flight => {
                    let req = CorrectionRequest {
                        request_id: dialog.request_id.clone(),
                        customer_id: dialog.customer_id.clone(),
                        new_name: dialog.form.optional_value(0),
                        new_email: dialog.form.optional_value(1),
                        new_phone: dialog.form.optional_value(2),
                    };
                    if req.new_name.is_none() && req.new_email.is_none() && req.new_phone.is_none()
                    {
                        return Action::None;
                    }
                    dialog.in_flight = true;
                    return Action::ApplyCorrection(req);
                }
                _ => {}
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.inbox.emails.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('r') => return Action::RefreshTab,
            KeyCode::Enter | KeyCode::Char('p') if !self.processing => {
                if let Some(email) = self.inbox.emails.get(self.selected) {
                    if self.reply_for(&email.id).is_none() {
                        self.processing = true;
                        return Action::ProcessEmail(email.clone());
                    }
                }
            }
            _ => {}
        }
        Action::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        self.render_inbox(frame, cols[0]);
        self.render_detail(frame, cols[1]);

        if let Some(dialog) = &self.otp_dialog {
            self.render_otp_dialog(frame, area, dialog);
        }
        if let Some(dialog) = &self.correction_dialog {
            let rect = centered_rect(60, 8, area);
            let inner = render_dialog_frame(
                frame,
                rect,
                &format!("Correction for {}", dialog.customer_id),
            );
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Length(1)])
                .split(inner);
            render_form(frame, parts[0], &dialog.form);
            frame.render_widget(
                Paragraph::new(Line::styled(
                    "Only filled fields are changed. Enter to apply, Esc to cancel",
                    Style::default().fg(Color::DarkGray),
                )),
                parts[1],
            );
        }
    }

    fn render_inbox(&self, frame: &mut Frame, area: Rect) {
        let title = if self.inbox.connected {
            " Inbox [connected] ".to_string()
        } else {
            format!(
                " Inbox [offline: {}] ",
                self.inbox.error.as_deref().unwrap_or("not connected")
            )
        };

        let items: Vec<ListItem> = self
            .inbox
            .emails
            .iter()
            .map(|email| {
                let status = match self.reply_for(&email.id) {
                    Some(reply) => format!("[{}]", reply.intent),
                    None => "[new]".to_string(),
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<12}", status), Style::default().fg(Color::Cyan)),
                    Span::raw(format!(
                        "{}  {}",
                        truncate(&email.from_email, 24),
                        truncate(&email.subject, 30)
                    )),
                ]))
            })
            .collect();

        let mut state = ListState::default();
        if !self.inbox.emails.is_empty() {
            state.select(Some(self.selected.min(self.inbox.emails.len() - 1)));
        }
        frame.render_stateful_widget(
            List::new(items)
                .block(Block::default().borders(Borders::ALL).title(title))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            area,
            &mut state,
        );
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        if let Some(email) = self.inbox.emails.get(self.selected) {
            lines.push(Line::from(vec![
                Span::styled("From:    ", Style::default().fg(Color::DarkGray)),
                Span::raw(email.from_email.clone()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Subject: ", Style::default().fg(Color::DarkGray)),
                Span::raw(email.subject.clone()),
            ]));
            lines.push(Line::raw(""));
            for body_line in email.body.lines().take(8) {
                lines.push(Line::raw(body_line.to_string()));
            }
            lines.push(Line::raw(""));
            match self.reply_for(&email.id) {
                Some(reply) => {
                    lines.push(Line::styled(
                        format!(
                            "Request {}  intent {}  otp {}  action {}",
                            reply.request_id, reply.intent, reply.otp_status, reply.action_status
                        ),
                        Style::default().fg(Color::Green),
                    ));
                }
                None => {
                    lines.push(Line::styled(
                        if self.processing {
                            "Processing..."
                        } else {
                            "Enter to process this request"
                        },
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
        } else {
            lines.push(Line::raw("Inbox is empty."));
        }
        if let Some(error) = &self.error {
            lines.push(Line::styled(
                format!("[!!] {}", error),
                Style::default().fg(Color::Red),
            ));
        }
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Request ")),
            area,
        );
    }

    fn render_otp_dialog(&self, frame: &mut Frame, area: Rect, dialog: &OtpDialog) {
        let rect = centered_rect(48, 8, area);
        let inner = render_dialog_frame(frame, rect, "Verify Identity");
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new(format!("OTP sent to {}", dialog.sent_to)),
            rows[0],
        );
        let digits: String = (0..6)
            .map(|i| dialog.otp.chars().nth(i).unwrap_or('_'))
            .flat_map(|c| [c, ' '])
            .collect();
        frame.render_widget(
            Paragraph::new(Line::styled(
                digits,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            rows[1],
        );
        if let Some(hint) = &dialog.demo_hint {
            frame.render_widget(
                Paragraph::new(Line::styled(
                    format!("Simulation OTP: {}", hint),
                    Style::default().fg(Color::Yellow),
                )),
                rows[2],
            );
        }
        let status = if dialog.in_flight {
            Line::styled("Verifying...", Style::default().fg(Color::Yellow))
        } else if let Some(error) = &dialog.error {
            Line::styled(error.clone(), Style::default().fg(Color::Red))
        } else if dialog.can_submit() {
            Line::styled("Enter to verify", Style::default().fg(Color::Green))
        } else {
            Line::styled("Enter the 6-digit code", Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(Paragraph::new(status), rows[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Email;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn outcome(request_id: &str, status: &str) -> ProcessOutcome {
        ProcessOutcome {
            request_id: request_id.to_string(),
            status: status.to_string(),
            otp_sent_to: Some("user@example.com".to_string()),
            ..ProcessOutcome::default()
        }
    }

    #[test]
    fn test_otp_gate_requires_exactly_six_chars() {
        let dialog = |otp: &str| OtpDialog {
            request_id: "REQ-1".to_string(),
            otp: otp.to_string(),
            sent_to: String::new(),
            demo_hint: None,
            error: None,
            in_flight: false,
        };
        assert!(!dialog("12345").can_submit());
        assert!(dialog("123456").can_submit());
        // Length is the only client-side check.
        assert!(dialog("12345a").can_submit());
        assert!(!dialog("1234567").can_submit());
        assert!(!dialog("").can_submit());
    }

    #[test]
    fn test_otp_input_caps_at_six_chars() {
        let mut view = MailboxView::new();
        view.on_processed("em-1", &outcome("REQ-1", "OTP_SENT"));
        assert!(view.otp_dialog.is_some());

        for c in "12345678".chars() {
            view.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(view.otp_dialog.as_ref().unwrap().otp, "123456");
    }

    #[test]
    fn test_simulation_otp_shown_in_dialog() {
        let mut view = MailboxView::new();
        view.on_processed(
            "em-1",
            &ProcessOutcome {
                otp_for_demo: Some("481516".to_string()),
                ..outcome("REQ-1", "OTP_SENT")
            },
        );
        assert_eq!(
            view.otp_dialog.as_ref().unwrap().demo_hint.as_deref(),
            Some("481516")
        );
    }

    #[test]
    fn test_correlation_joins_by_request_id() {
        let mut view = MailboxView::new();
        view.inbox.emails = vec![
            Email {
                id: "em-1".to_string(),
                subject: "Please delete my data".to_string(),
                ..Email::default()
            },
            Email {
                id: "em-2".to_string(),
                subject: "Please delete my data".to_string(),
                ..Email::default()
            },
        ];
        view.replies = vec![MailReply {
            request_id: "REQ-7".to_string(),
            intent: "DELETE".to_string(),
            ..MailReply::default()
        }];
        view.on_processed("em-2", &outcome("REQ-7", "OTP_SENT"));

        // Identical subjects; only em-2 was processed.
        assert!(view.reply_for("em-1").is_none());
        assert_eq!(view.reply_for("em-2").unwrap().intent, "DELETE");
    }

    #[test]
    fn test_failed_verify_clears_otp_and_keeps_dialog() {
        let mut view = MailboxView::new();
        view.on_processed("em-1", &outcome("REQ-1", "OTP_SENT"));
        if let Some(d) = &mut view.otp_dialog {
            d.otp = "123456".to_string();
        }
        view.on_verified(&VerifyOutcome {
            verified: false,
            ..VerifyOutcome::default()
        });
        let dialog = view.otp_dialog.as_ref().unwrap();
        assert!(dialog.error.is_some());
        assert!(dialog.otp.is_empty());
    }

    #[test]
    fn test_correction_needed_opens_dialog() {
        let mut view = MailboxView::new();
        view.on_processed("em-1", &outcome("REQ-1", "OTP_SENT"));
        view.on_verified(&VerifyOutcome {
            verified: true,
            intent: "CORRECT".to_string(),
            customer_id: "CUST-0007".to_string(),
            needs_correction_data: true,
            ..VerifyOutcome::default()
        });
        assert!(view.otp_dialog.is_none());
        let dialog = view.correction_dialog.as_ref().unwrap();
        assert_eq!(dialog.customer_id, "CUST-0007");
        assert_eq!(dialog.request_id, "REQ-1");
    }

    #[test]
    fn test_empty_correction_not_submitted() {
        let mut view = MailboxView::new();
        view.correction_dialog = Some(CorrectionDialog {
            request_id: "REQ-1".to_string(),
            customer_id: "CUST-0007".to_string(),
            form: Form::new(vec![
                TextField::new("New name"),
                TextField::new("New email"),
                TextField::new("New phone"),
            ]),
            in_flight: false,
        });
        assert!(matches!(view.handle_key(key(KeyCode::Enter)), Action::None));

        view.handle_key(key(KeyCode::Char('J')));
        match view.handle_key(key(KeyCode::Enter)) {
            Action::ApplyCorrection(req) => {
                assert_eq!(req.new_name.as_deref(), Some("J"));
                assert!(req.new_email.is_none());
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_already_processed_email_not_reprocessed() {
        let mut view = MailboxView::new();
        view.inbox.emails = vec![Email {
            id: "em-1".to_string(),
            ..Email::default()
        }];
        view.replies = vec![MailReply {
            request_id: "REQ-1".to_string(),
            ..MailReply::default()
        }];
        view.on_processed("em-1", &outcome("REQ-1", "OTP_VERIFIED"));
        assert!(matches!(view.handle_key(key(KeyCode::Enter)), Action::None));
    }
}

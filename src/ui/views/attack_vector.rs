//! Attack vector analysis: intrusion signals for the API and email
//! surfaces, the inferred source, and PDF generation.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::api::models::{Signal, VectorAnalysis};
use crate::ui::Action;

pub struct AttackVectorView {
    pub analysis: Option<VectorAnalysis>,
    pub error: Option<String>,
    pub in_flight: bool,
}

impl AttackVectorView {
    pub fn new() -> Self {
        Self {
            analysis: None,
            error: None,
            in_flight: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('r') => Action::RefreshTab,
            KeyCode::Char('p') if !self.in_flight && self.analysis.is_some() => {
                self.in_flight = true;
                Action::GenerateVectorPdf
            }
            _ => Action::None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let analysis = match &self.analysis {
            Some(a) => a,
            None => {
                let text = match &self.error {
                    Some(error) => format!("[!!] {}", error),
                    None => "Loading analysis...".to_string(),
                };
                frame.render_widget(
                    Paragraph::new(text)
                        .block(Block::default().borders(Borders::ALL).title(" Attack Vector ")),
                    area,
                );
                return;
            }
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let verdict = vec![
            Line::from(vec![
                Span::raw("Likely source: "),
                Span::styled(
                    analysis.likely_source.clone(),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  ({} confidence)", analysis.confidence)),
            ]),
            Line::raw(format!(
                "API score {}  Email score {}",
                analysis.api_score, analysis.email_score
            )),
        ];
        frame.render_widget(
            Paragraph::new(verdict).block(Block::default().borders(Borders::ALL).title(" Verdict ")),
            rows[0],
        );

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        render_signals(frame, cols[0], "API Surface", &analysis.api_status, &analysis.api_signals);
        render_signals(
            frame,
            cols[1],
            "Email Surface",
            &analysis.email_status,
            &analysis.email_signals,
        );

        let help = if self.in_flight {
            Line::styled("Generating PDF...", Style::default().fg(Color::Yellow))
        } else {
            Line::styled("p generate pdf  r refresh", Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(Paragraph::new(help), rows[2]);
    }
}

fn render_signals(frame: &mut Frame, area: Rect, title: &str, status: &str, signals: &[Signal]) {
    let mut lines = Vec::new();
    for signal in signals {
        let (icon, color) = if signal.ok {
            ("[OK]", Color::Green)
        } else {
            ("[!!]", Color::Red)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", icon), Style::default().fg(color)),
            Span::raw(signal.label.clone()),
            Span::styled(
                format!("  {}", signal.severity),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} [{}] ", title, status)),
        ),
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
    fn test_pdf_requires_loaded_analysis() {
        let mut view = AttackVectorView::new();
        assert!(matches!(view.handle_key(key(KeyCode::Char('p'))), Action::None));

        view.analysis = Some(VectorAnalysis::default());
        assert!(matches!(
            view.handle_key(key(KeyCode::Char('p'))),
            Action::GenerateVectorPdf
        ));
        // Second press while in flight is ignored.
        assert!(matches!(view.handle_key(key(KeyCode::Char('p'))), Action::None));
    }
}

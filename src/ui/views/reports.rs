//! Dispatch log: every generated report with type, status, and free-text
//! filters. Refreshed on a slow poll while the tab is open.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::api::models::Report;
use crate::ui::format::truncate;
use crate::ui::Action;

const TYPE_FILTERS: [&str; 8] = [
    "",
    "DPB_NOTICE",
    "CUSTOMER_BREACH_NOTICE",
    "DATA_EXPORT",
    "DELETION_CERTIFICATE",
    "CORRECTION_CONFIRMATION",
    "VECTOR_ANALYSIS",
    "AUDIT_REPORT",
];

const STATUS_FILTERS: [&str; 4] = ["", "SENT", "GENERATED", "FAILED"];

pub struct ReportsView {
    pub reports: Vec<Report>,
    pub selected: usize,
    pub type_idx: usize,
    pub status_idx: usize,
    pub query: String,
    pub searching: bool,
    pub error: Option<String>,
}

impl ReportsView {
    pub fn new() -> Self {
        Self {
            reports: Vec::new(),
            selected: 0,
            type_idx: 0,
            status_idx: 0,
            query: String::new(),
            searching: false,
            error: None,
        }
    }

    pub fn type_filter(&self) -> &'static str {
        TYPE_FILTERS[self.type_idx]
    }

    pub fn status_filter(&self) -> &'static str {
        STATUS_FILTERS[self.status_idx]
    }

    pub fn filtered(&self) -> Vec<&Report> {
        self.reports
            .iter()
            .filter(|r| r.matches(self.type_filter(), self.status_filter(), &self.query))
            .collect()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.searching {
            match key.code {
                KeyCode::Esc => {
                    self.searching = false;
                    self.query.clear();
                }
                KeyCode::Enter => self.searching = false,
                KeyCode::Backspace => {
                    self.query.pop();
                }
                KeyCode::Char(c) => {
                    self.query.push(c);
                    self.selected = 0;
                }
                _ => {}
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.filtered().len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('t') => {
                self.type_idx = (self.type_idx + 1) % TYPE_FILTERS.len();
                self.selected = 0;
            }
            KeyCode::Char('s') => {
                self.status_idx = (self.status_idx + 1) % STATUS_FILTERS.len();
                self.selected = 0;
            }
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('r') => return Action::RefreshTab,
            KeyCode::Char('x') => return Action::ExportReports,
            KeyCode::Char('p') => {
                let filtered = self.filtered();
                if let Some(report) = filtered.get(self.selected.min(filtered.len().saturating_sub(1))) {
                    if !report.pdf_filename.is_empty() {
                        return Action::DownloadReportPdf {
                            filename: report.pdf_filename.clone(),
                        };
                    }
                }
            }
            _ => {}
        }
        Action::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let rows_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let filter_line = if self.searching {
            format!("Search: {}_", self.query)
        } else {
            format!(
                "type: {}  status: {}  query: {}",
                display_filter(self.type_filter()),
                display_filter(self.status_filter()),
                if self.query.is_empty() { "-" } else { &self.query }
            )
        };
        frame.render_widget(
            Paragraph::new(Line::styled(filter_line, Style::default().fg(Color::Cyan))),
            rows_layout[0],
        );

        let filtered = self.filtered();
        let table_rows: Vec<Row> = filtered
            .iter()
            .map(|r| {
                let status_style = match r.delivery_status.as_str() {
                    "SENT" => Style::default().fg(Color::Green),
                    "FAILED" => Style::default().fg(Color::Red),
                    _ => Style::default(),
                };
                Row::new(vec![
                    r.report_id.clone(),
                    truncate(&r.report_type, 24),
                    truncate(&r.recipient, 26),
                    r.delivery_status.clone(),
                    truncate(&r.generated_at, 19),
                ])
                .style(status_style)
            })
            .collect();

        let mut state = TableState::default();
        if !filtered.is_empty() {
            state.select(Some(self.selected.min(filtered.len() - 1)));
        }

        let table = Table::new(
            table_rows,
            [
                Constraint::Length(12),
                Constraint::Length(26),
                Constraint::Length(28),
                Constraint::Length(10),
                Constraint::Length(21),
            ],
        )
        .header(
            Row::new(vec!["ID", "TYPE", "RECIPIENT", "STATUS", "GENERATED"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Reports Sent ({}/{}) ",
            filtered.len(),
            self.reports.len()
        )));
        frame.render_stateful_widget(table, rows_layout[1], &mut state);

        let help = match &self.error {
            Some(error) => Line::styled(format!("[!!] {}", error), Style::default().fg(Color::Red)),
            None => Line::styled(
                "t cycle type  s cycle status  / search  p download pdf  x export csv  r refresh",
                Style::default().fg(Color::DarkGray),
            ),
        };
        frame.render_widget(Paragraph::new(help), rows_layout[2]);
    }
}

fn display_filter(f: &str) -> &str {
    if f.is_empty() {
        "ALL"
    } else {
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample_reports() -> Vec<Report> {
        vec![
            Report {
                report_id: "RPT-0001".to_string(),
                report_type: "DPB_NOTICE".to_string(),
                delivery_status: "SENT".to_string(),
                recipient: "dpb@gov.in".to_string(),
                ..Report::default()
            },
            Report {
                report_id: "RPT-0002".to_string(),
                report_type: "DATA_EXPORT".to_string(),
                delivery_status: "GENERATED".to_string(),
                recipient: "alice@example.com".to_string(),
                ..Report::default()
            },
        ]
    }

    #[test]
    fn test_type_filter_cycles_through_all() {
        let mut view = ReportsView::new();
        assert_eq!(view.type_filter(), "");
        view.handle_key(key(KeyCode::Char('t')));
        assert_eq!(view.type_filter(), "DPB_NOTICE");
        for _ in 0..TYPE_FILTERS.len() - 1 {
            view.handle_key(key(KeyCode::Char('t')));
        }
        assert_eq!(view.type_filter(), "");
    }

    #[test]
    fn test_filters_and_query_compose() {
        let mut view = ReportsView::new();
        view.reports = sample_reports();
        assert_eq!(view.filtered().len(), 2);

        view.handle_key(key(KeyCode::Char('t')));
        assert_eq!(view.filtered().len(), 1);
        assert_eq!(view.filtered()[0].report_id, "RPT-0001");

        view.handle_key(key(KeyCode::Char('/')));
        for c in "alice".chars() {
            view.handle_key(key(KeyCode::Char(c)));
        }
        // DPB_NOTICE type AND alice query match nothing.
        assert!(view.filtered().is_empty());
    }

    #[test]
    fn test_pdf_download_uses_selected_row() {
        let mut view = ReportsView::new();
        view.reports = sample_reports();
        view.reports[1].pdf_filename = "data_export_CUST-0002.pdf".to_string();
        view.handle_key(key(KeyCode::Down));
        match view.handle_key(key(KeyCode::Char('p'))) {
            Action::DownloadReportPdf { filename } => {
                assert_eq!(filename, "data_export_CUST-0002.pdf");
            }
            other => panic!("unexpected action: {:?}", other),
        }

        // Rows without a stored PDF are a no-op.
        view.handle_key(key(KeyCode::Up));
        assert!(matches!(view.handle_key(key(KeyCode::Char('p'))), Action::None));
    }
}

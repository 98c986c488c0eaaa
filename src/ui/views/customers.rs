//! Customer registry: searchable table with add, edit, delete, and CSV
//! export.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::api::models::{Customer, CustomerCreate, CustomerUpdate};
use crate::ui::format::truncate;
use crate::ui::widgets::{centered_rect, render_dialog_frame, render_form, Form, TextField};
use crate::ui::Action;

pub enum CustomerDialog {
    Add(Form),
    Edit { id: String, form: Form },
}

pub struct CustomersView {
    pub customers: Vec<Customer>,
    pub selected: usize,
    pub query: String,
    pub searching: bool,
    pub dialog: Option<CustomerDialog>,
    /// Pending redaction awaiting confirmation: (customer_id, name).
    pub confirm_delete: Option<(String, String)>,
    pub error: Option<String>,
    pub in_flight: bool,
}

impl CustomersView {
    pub fn new() -> Self {
        Self {
            customers: Vec::new(),
            selected: 0,
            query: String::new(),
            searching: false,
            dialog: None,
            confirm_delete: None,
            error: None,
            in_flight: false,
        }
    }

    pub fn filtered(&self) -> Vec<&Customer> {
        self.customers.iter().filter(|c| c.matches(&self.query)).collect()
    }

    fn selected_customer(&self) -> Option<&Customer> {
        let filtered = self.filtered();
        filtered.get(self.selected.min(filtered.len().saturating_sub(1))).copied()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if let Some((id, _)) = &self.confirm_delete {
            match key.code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    let id = id.clone();
                    self.confirm_delete = None;
                    self.in_flight = true;
                    return Action::DeleteCustomer { id };
                }
                KeyCode::Esc | KeyCode::Char('n') => self.confirm_delete = None,
                _ => {}
            }
            return Action::None;
        }

        if let Some(dialog) = &mut self.dialog {
            let form = match dialog {
                CustomerDialog::Add(form) => form,
                CustomerDialog::Edit { form, .. } => form,
            };
            match key.code {
                KeyCode::Esc => self.dialog = None,
                KeyCode::Tab | KeyCode::Down => form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.push(c),
                KeyCode::Enter if !self.in_flight => {
                    let action = match dialog {
                        CustomerDialog::Add(form) => {
                            if form.value(0).trim().is_empty() || form.value(1).trim().is_empty() {
                                return Action::None;
                            }
                            Action::CreateCustomer(CustomerCreate {
                                name: form.value(0).trim().to_string(),
                                email: form.value(1).trim().to_string(),
                                phone: form.value(2).trim().to_string(),
                            })
                        }
                        CustomerDialog::Edit { id, form } => Action::UpdateCustomer {
                            id: id.clone(),
                            update: CustomerUpdate {
                                name: form.optional_value(0),
                                email: form.optional_value(1),
                                phone: form.optional_value(2),
                                status: form.optional_value(3),
                            },
                        },
                    };
                    self.dialog = None;
                    self.in_flight = true;
                    return action;
                }
                _ => {}
            }
            return Action::None;
        }

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
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('r') => return Action::RefreshTab,
            KeyCode::Char('a') if !self.in_flight => {
                self.dialog = Some(CustomerDialog::Add(Form::new(vec![
                    TextField::new("Name"),
                    TextField::new("Email"),
                    TextField::new("Phone"),
                ])));
            }
            KeyCode::Char('e') if !self.in_flight => {
                if let Some(customer) = self.selected_customer() {
                    self.dialog = Some(CustomerDialog::Edit {
                        id: customer.customer_id.clone(),
                        form: Form::new(vec![
                            TextField::with_value("Name", &customer.name),
                            TextField::with_value("Email", &customer.email),
                            TextField::with_value("Phone", &customer.phone),
                            TextField::with_value("Status", &customer.status),
                        ]),
                    });
                }
            }
            KeyCode::Char('d') if !self.in_flight => {
                if let Some(customer) = self.selected_customer() {
                    self.confirm_delete =
                        Some((customer.customer_id.clone(), customer.name.clone()));
                }
            }
            KeyCode::Char('x') => return Action::ExportCustomers,
            _ => {}
        }
        Action::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let rows_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let search_line = if self.searching {
            Line::styled(
                format!("Search: {}_", self.query),
                Style::default().fg(Color::Cyan),
            )
        } else if !self.query.is_empty() {
            Line::styled(
                format!("Filter: {} (/ to edit)", self.query),
                Style::default().fg(Color::Cyan),
            )
        } else {
            Line::styled("/ search", Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(Paragraph::new(search_line), rows_layout[0]);

        let filtered = self.filtered();
        let table_rows: Vec<Row> = filtered
            .iter()
            .map(|c| {
                let status_style = if c.is_active() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Row::new(vec![
                    c.customer_id.clone(),
                    truncate(&c.name, 24),
                    truncate(&c.email, 32),
                    truncate(&c.phone, 16),
                    c.status.clone(),
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
                Constraint::Length(34),
                Constraint::Length(18),
                Constraint::Length(10),
            ],
        )
        .header(
            Row::new(vec!["ID", "NAME", "EMAIL", "PHONE", "STATUS"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Customers ({}/{}) ",
            filtered.len(),
            self.customers.len()
        )));
        frame.render_stateful_widget(table, rows_layout[1], &mut state);

        let help = match &self.error {
            Some(error) => Line::styled(format!("[!!] {}", error), Style::default().fg(Color::Red)),
            None => Line::styled(
                "a add  e edit  d delete  x export csv  r refresh",
                Style::default().fg(Color::DarkGray),
            ),
        };
        frame.render_widget(Paragraph::new(help), rows_layout[2]);

        if let Some((id, name)) = &self.confirm_delete {
            let rect = centered_rect(56, 6, area);
            let inner = render_dialog_frame(frame, rect, "Redact Customer");
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(2), Constraint::Length(1)])
                .split(inner);
            frame.render_widget(
                Paragraph::new(format!(
                    "Delete {} ({}) and all associated data?",
                    name, id
                )),
                parts[0],
            );
            frame.render_widget(
                Paragraph::new(Line::styled(
                    "y/Enter to delete, Esc to cancel",
                    Style::default().fg(Color::DarkGray),
                )),
                parts[1],
            );
        }

        if let Some(dialog) = &self.dialog {
            let (title, form) = match dialog {
                CustomerDialog::Add(form) => ("Add Customer", form),
                CustomerDialog::Edit { form, .. } => ("Edit Customer", form),
            };
            let rect = centered_rect(56, 8, area);
            let inner = render_dialog_frame(frame, rect, title);
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(4), Constraint::Length(1)])
                .split(inner);
            render_form(frame, parts[0], form);
            frame.render_widget(
                Paragraph::new(Line::styled(
                    "Enter to save, Esc to cancel",
                    Style::default().fg(Color::DarkGray),
                )),
                parts[1],
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

    fn sample_customers() -> Vec<Customer> {
        vec![
            Customer {
                customer_id: "CUST-0001".to_string(),
                name: "Alice Sharma".to_string(),
                email: "alice@example.com".to_string(),
                phone: "+91-9876543210".to_string(),
                status: "ACTIVE".to_string(),
                ..Customer::default()
            },
            Customer {
                customer_id: "CUST-0002".to_string(),
                name: "Bob Verma".to_string(),
                email: "bob@example.com".to_string(),
                phone: "+91-9123456789".to_string(),
                status: "ACTIVE".to_string(),
                ..Customer::default()
            },
        ]
    }

    #[test]
    fn test_search_narrows_list() {
        let mut view = CustomersView::new();
        view.customers = sample_customers();
        view.handle_key(key(KeyCode::Char('/')));
        for c in "ali".chars() {
            view.handle_key(key(KeyCode::Char(c)));
        }
        let filtered = view.filtered();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Alice Sharma");
    }

    #[test]
    fn test_escape_clears_search() {
        let mut view = CustomersView::new();
        view.customers = sample_customers();
        view.handle_key(key(KeyCode::Char('/')));
        view.handle_key(key(KeyCode::Char('a')));
        view.handle_key(key(KeyCode::Esc));
        assert!(view.query.is_empty());
        assert_eq!(view.filtered().len(), 2);
    }

    #[test]
    fn test_add_requires_name_and_email() {
        let mut view = CustomersView::new();
        view.handle_key(key(KeyCode::Char('a')));
        assert!(matches!(view.handle_key(key(KeyCode::Enter)), Action::None));
        assert!(view.dialog.is_some());
    }

    #[test]
    fn test_edit_builds_sparse_update() {
        let mut view = CustomersView::new();
        view.customers = sample_customers();
        view.handle_key(key(KeyCode::Char('e')));
        // Append to the prefilled name field.
        view.handle_key(key(KeyCode::Char('!')));
        match view.handle_key(key(KeyCode::Enter)) {
            Action::UpdateCustomer { id, update } => {
                assert_eq!(id, "CUST-0001");
                assert_eq!(update.name.as_deref(), Some("Alice Sharma!"));
                assert_eq!(update.email.as_deref(), Some("alice@example.com"));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut view = CustomersView::new();
        view.customers = sample_customers();

        // 'd' alone only opens the confirmation dialog.
        assert!(matches!(view.handle_key(key(KeyCode::Char('d'))), Action::None));
        assert!(view.confirm_delete.is_some());
        assert!(!view.in_flight);

        view.handle_key(key(KeyCode::Esc));
        assert!(view.confirm_delete.is_none());

        view.handle_key(key(KeyCode::Char('d')));
        match view.handle_key(key(KeyCode::Enter)) {
            Action::DeleteCustomer { id } => assert_eq!(id, "CUST-0001"),
            other => panic!("unexpected action: {:?}", other),
        }
        assert!(view.confirm_delete.is_none());
    }

    #[test]
    fn test_delete_targets_filtered_selection() {
        let mut view = CustomersView::new();
        view.customers = sample_customers();
        view.handle_key(key(KeyCode::Char('/')));
        for c in "bob".chars() {
            view.handle_key(key(KeyCode::Char(c)));
        }
        view.handle_key(key(KeyCode::Enter));
        view.handle_key(key(KeyCode::Char('d')));
        match view.handle_key(key(KeyCode::Char('y'))) {
            Action::DeleteCustomer { id } => assert_eq!(id, "CUST-0002"),
            other => panic!("unexpected action: {:?}", other),
        }
    }
}

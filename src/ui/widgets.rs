//! Small reusable widgets for the dashboard: text fields, modal forms,
//! and layout helpers.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

/// A single-line editable text field.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub label: String,
    pub value: String,
    /// Render the value as asterisks.
    pub masked: bool,
}

impl TextField {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn masked(label: &str) -> Self {
        Self {
            label: label.to_string(),
            masked: true,
            ..Default::default()
        }
    }

    pub fn with_value(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            masked: false,
        }
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn display_value(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// A vertical stack of text fields with one focused at a time.
#[derive(Debug, Clone, Default)]
pub struct Form {
    pub fields: Vec<TextField>,
    pub focused: usize,
}

impl Form {
    pub fn new(fields: Vec<TextField>) -> Self {
        Self { fields, focused: 0 }
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            field.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            field.backspace();
        }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map(|f| f.value.as_str()).unwrap_or("")
    }

    /// `Some(value)` when the field is non-empty, for sparse payloads.
    pub fn optional_value(&self, idx: usize) -> Option<String> {
        let v = self.value(idx).trim();
        if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        }
    }
}

/// Render a form inside `area`, one line per field.
pub fn render_form(frame: &mut Frame, area: Rect, form: &Form) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); form.fields.len()])
        .split(area);

    for (i, field) in form.fields.iter().enumerate() {
        let style = if i == form.focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if i == form.focused { "_" } else { "" };
        let line = Line::from(vec![
            Span::styled(format!("{:<12}", field.label), style),
            Span::raw(field.display_value()),
            Span::styled(cursor, Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]);
        frame.render_widget(Paragraph::new(line), rows[i]);
    }
}

/// Centered rectangle for modal dialogs.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Clear the dialog region and draw its border.
pub fn render_dialog_frame(frame: &mut Frame, area: Rect, title: &str) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_focus_wraps() {
        let mut form = Form::new(vec![TextField::new("a"), TextField::new("b")]);
        assert_eq!(form.focused, 0);
        form.focus_next();
        assert_eq!(form.focused, 1);
        form.focus_next();
        assert_eq!(form.focused, 0);
        form.focus_prev();
        assert_eq!(form.focused, 1);
    }

    #[test]
    fn test_masked_field_display() {
        let mut field = TextField::masked("Password");
        field.push('a');
        field.push('b');
        assert_eq!(field.display_value(), "**");
        assert_eq!(field.value, "ab");
    }

    #[test]
    fn test_optional_value_skips_blank() {
        let mut form = Form::new(vec![TextField::new("name"), TextField::new("email")]);
        form.push('x');
        assert_eq!(form.optional_value(0).as_deref(), Some("x"));
        assert_eq!(form.optional_value(1), None);
    }
}

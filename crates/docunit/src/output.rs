//! Colored terminal output utilities.

use console::{Style, Term};
use docunit_store::ConvertedElement;

/// Terminal output formatter.
///
/// Status messages go to stderr; command results go to stdout.
pub(crate) struct Output {
    term: Term,
    out: Term,
    green: Style,
    red: Style,
    cyan_bold: Style,
    dim: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            out: Term::stdout(),
            green: Style::new().green(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Write a command result to stdout, uncolored.
    pub(crate) fn result(&self, text: &str) {
        let _ = self.out.write_line(text);
    }

    /// Print a stored element sequence, one header line and the HTML per row.
    pub(crate) fn rows(&self, rows: &[ConvertedElement]) {
        for row in rows {
            let header = format_row_header(row);
            let _ = self
                .out
                .write_line(&self.cyan_bold.apply_to(header).to_string());
            let _ = self.out.write_line(&row.content);
        }
        let _ = self
            .term
            .write_line(&self.dim.apply_to(format!("{} element(s)", rows.len())).to_string());
    }
}

fn format_row_header(row: &ConvertedElement) -> String {
    format!("#{:<4} {} {}", row.position, row.id, row.element.kind())
}

#[cfg(test)]
mod tests {
    use docunit_elements::{DocumentElement, ParagraphElement};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_row_header_names_position_id_and_kind() {
        let id = Uuid::nil();
        let row = ConvertedElement {
            id,
            position: 3,
            content: "<p></p>".to_owned(),
            element: DocumentElement::Paragraph(ParagraphElement::default()),
        };

        assert_eq!(
            format_row_header(&row),
            "#3    00000000-0000-0000-0000-000000000000 paragraph"
        );
    }
}

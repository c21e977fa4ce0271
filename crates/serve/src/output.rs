//! Terminal output for startup and error lines.

use console::{Style, Term};

/// Writes CLI lines to stderr. Write failures are ignored.
pub(crate) struct Output {
    term: Term,
    red: Style,
    bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            red: Style::new().red(),
            bold: Style::new().bold(),
        }
    }

    /// Print the listening address with the URL emphasized.
    pub(crate) fn listening(&self, url: &str) {
        let line = format!("Listening on {}", self.bold.apply_to(url));
        let _ = self.term.write_line(&line);
    }

    /// Print an error message in red.
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }
}

//! Diagnostic rendering for the terminal.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// error[E204]: unknown x-gena type "srff"
///   --> top.ctrl
///    = help: use "rmw" or leave the type unset
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
        };
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        let header = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(diag.severity, &header),
            diag.message
        ));

        if let Some(location) = &diag.location {
            out.push_str(&format!("  --> {location}\n"));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    #[test]
    fn render_error_with_location() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 201), "unsupported bus")
            .at("top");
        let output = TerminalRenderer::new(false).render(&diag);
        assert_eq!(output, "error[E201]: unsupported bus\n  --> top\n");
    }

    #[test]
    fn render_warning_with_notes() {
        let diag = Diagnostic::warning(DiagnosticCode::new(Category::Warning, 201), "no preset")
            .with_note("reads return zero")
            .with_help("add a preset");
        let output = TerminalRenderer::new(false).render(&diag);
        assert!(output.starts_with("warning[W201]: no preset\n"));
        assert!(!output.contains("-->"));
        assert!(output.contains("   = note: reads return zero\n"));
        assert!(output.contains("   = help: add a preset\n"));
    }

    #[test]
    fn color_wraps_header_only() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 101), "bad");
        let output = TerminalRenderer::new(true).render(&diag);
        assert!(output.starts_with("\x1b[1;31merror[E101]\x1b[0m: bad"));
    }
}

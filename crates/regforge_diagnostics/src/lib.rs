//! Diagnostic creation, severity management, and terminal rendering.
//!
//! A [`Diagnostic`] carries a severity, a stable code (`E201`, `W202`, ...),
//! a message and the dotted path of the register-map node it is about. The
//! [`DiagnosticSink`] accumulates diagnostics while a map is loaded and
//! generated, and the [`TerminalRenderer`] prints them rustc-style.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode, Stage};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;

//! Presentation layer seam.

use crate::transcript::ConversationMessage;

/// Marker appended to partial output while a reply is still streaming.
pub const STREAMING_CURSOR: &str = "▌";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// An inline message for the user that is not part of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives text pushed by the core.
///
/// Partial output is only ever observable through [`show_partial`](Self::show_partial).
pub trait Presenter: Send + Sync {
    /// Echoes a freshly recorded user message.
    fn show_user(&self, message: &ConversationMessage);

    /// Shows the reply accumulated so far. The text ends with [`STREAMING_CURSOR`].
    fn show_partial(&self, accumulated: &str);

    /// Shows the finished reply.
    fn show_final(&self, text: &str);

    fn show_diagnostic(&self, diagnostic: &Diagnostic);
}

/// A presenter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn show_user(&self, _message: &ConversationMessage) {}

    fn show_partial(&self, _accumulated: &str) {}

    fn show_final(&self, _text: &str) {}

    fn show_diagnostic(&self, _diagnostic: &Diagnostic) {}
}

//! Colored terminal presenter.
//!
//! Streamed text is printed incrementally: each partial update only writes the
//! suffix that was not on screen yet. When the finished text does not extend
//! what was printed (a fallback reply after a failed stream), it is rendered
//! again from the start on a fresh line.

use std::io::Write;
use std::sync::Mutex;

use colored::Colorize;
use gemchat_core::presentation::{Diagnostic, DiagnosticLevel, Presenter, STREAMING_CURSOR};
use gemchat_core::transcript::ConversationMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Delta {
    Append(String),
    Restart(String),
}

/// Text of the reply currently on screen.
#[derive(Debug, Default)]
struct StreamView {
    shown: String,
}

impl StreamView {
    fn advance(&mut self, text: &str) -> Delta {
        let delta = match text.strip_prefix(self.shown.as_str()) {
            Some(suffix) => Delta::Append(suffix.to_string()),
            None => Delta::Restart(text.to_string()),
        };
        self.shown = text.to_string();
        delta
    }

    fn is_active(&self) -> bool {
        !self.shown.is_empty()
    }

    fn reset(&mut self) {
        self.shown.clear();
    }
}

#[derive(Debug, Default)]
pub struct ConsolePresenter {
    view: Mutex<StreamView>,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_view<R>(&self, f: impl FnOnce(&mut StreamView) -> R) -> R {
        let mut view = self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut view)
    }
}

fn print_delta(delta: &Delta, restarted_mid_line: bool) {
    let mut stdout = std::io::stdout().lock();
    match delta {
        Delta::Append(suffix) => {
            let _ = write!(stdout, "{}", suffix.bright_blue());
        }
        Delta::Restart(text) => {
            if restarted_mid_line {
                let _ = writeln!(stdout);
                let _ = writeln!(stdout, "{}", "(stream interrupted, full reply below)".bright_black());
            }
            let _ = write!(stdout, "{}", text.bright_blue());
        }
    }
    let _ = stdout.flush();
}

impl Presenter for ConsolePresenter {
    fn show_user(&self, message: &ConversationMessage) {
        let mut line = format!("> {}", message.content.as_text());
        if !message.attachments.is_empty() {
            let names: Vec<&str> = message.attachments.iter().map(|a| a.name.as_str()).collect();
            line.push_str(&format!(" [attached: {}]", names.join(", ")));
        }
        println!("{}", line.green());
    }

    fn show_partial(&self, accumulated: &str) {
        let text = accumulated
            .strip_suffix(STREAMING_CURSOR)
            .unwrap_or(accumulated);
        self.with_view(|view| {
            let was_active = view.is_active();
            let delta = view.advance(text);
            print_delta(&delta, was_active);
        });
    }

    fn show_final(&self, text: &str) {
        self.with_view(|view| {
            let was_active = view.is_active();
            let delta = view.advance(text);
            print_delta(&delta, was_active);
            view.reset();
        });
        println!();
        println!();
    }

    fn show_diagnostic(&self, diagnostic: &Diagnostic) {
        // A diagnostic ends any reply that was being streamed.
        let interrupted = self.with_view(|view| {
            let active = view.is_active();
            view.reset();
            active
        });
        if interrupted {
            println!();
        }

        let message = diagnostic.message.as_str();
        match diagnostic.level {
            DiagnosticLevel::Info => println!("{}", message.bright_black()),
            DiagnosticLevel::Success => println!("{}", message.bright_green()),
            DiagnosticLevel::Warning => println!("{}", message.yellow()),
            DiagnosticLevel::Error => eprintln!("{}", message.red()),
        }
    }
}

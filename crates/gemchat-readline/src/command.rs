//! REPL input parsing.

use std::path::PathBuf;

/// Slash commands offered for completion and hints.
pub const COMMANDS: &[&str] = &[
    "/attach",
    "/pending",
    "/clear-pending",
    "/model",
    "/models",
    "/key",
    "/send-files",
    "/export",
    "/import",
    "/history",
    "/reset",
    "/forget",
    "/help",
];

/// One parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Attach(PathBuf),
    Pending,
    ClearPending,
    /// `None` shows the current model.
    Model(Option<String>),
    Models,
    Key(String),
    SendFiles(bool),
    Export(Option<PathBuf>),
    Import(Option<PathBuf>),
    History,
    /// Clears the session and the store.
    Reset,
    /// Clears the store only.
    Forget,
    Message(String),
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed == "quit" || trimmed == "exit" {
            return Some(Command::Quit);
        }
        if !trimmed.starts_with('/') {
            return Some(Command::Message(trimmed.to_string()));
        }

        let (name, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (trimmed, ""),
        };
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        let command = match (name, arg) {
            ("/help", _) => Command::Help,
            ("/attach", Some(path)) => Command::Attach(PathBuf::from(path)),
            ("/attach", None) => Command::Invalid("usage: /attach <path>".into()),
            ("/pending", _) => Command::Pending,
            ("/clear-pending", _) => Command::ClearPending,
            ("/model", model) => Command::Model(model),
            ("/models", _) => Command::Models,
            ("/key", Some(key)) => Command::Key(key),
            ("/key", None) => Command::Invalid("usage: /key <api key>".into()),
            ("/send-files", Some(flag)) => match flag.as_str() {
                "on" => Command::SendFiles(true),
                "off" => Command::SendFiles(false),
                _ => Command::Invalid("usage: /send-files on|off".into()),
            },
            ("/send-files", None) => Command::Invalid("usage: /send-files on|off".into()),
            ("/export", path) => Command::Export(path.map(PathBuf::from)),
            ("/import", path) => Command::Import(path.map(PathBuf::from)),
            ("/history", _) => Command::History,
            ("/reset", _) => Command::Reset,
            ("/forget", _) => Command::Forget,
            (other, _) => Command::Invalid(format!("unknown command {other}")),
        };
        Some(command)
    }

    /// Whether the raw line may be kept in readline history.
    pub fn is_recordable(&self) -> bool {
        !matches!(self, Command::Key(_))
    }
}

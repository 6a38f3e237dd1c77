use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use gemchat_application::{ChatUseCase, GeminiCapabilityFactory};
use gemchat_core::transcript::MessageRole;
use gemchat_infrastructure::{ChatPaths, ConfigService, DEFAULT_EXPORT_FILE, JsonFileStore};
use gemchat_interaction::{SUPPORTED_MODELS, is_supported};

mod command;
mod console_presenter;
mod helper;

use command::Command;
use console_presenter::ConsolePresenter;
use helper::CliHelper;

#[derive(Parser)]
#[command(name = "gemchat")]
#[command(about = "Chat with Gemini models from the terminal", long_about = None)]
struct Args {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the key-value store holding history and credential
    #[arg(long)]
    store: Option<PathBuf>,

    /// Model to use for this session
    #[arg(long)]
    model: Option<String>,

    /// Send attachment contents inline instead of names only
    #[arg(long)]
    send_files: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

const HELP: &str = "\
Type a message to chat. Commands:
  /attach <path>       add a file to the next message
  /pending             list pending attachments
  /clear-pending       drop pending attachments
  /model [name]        show or select the model
  /models              list supported models
  /key <api key>       set the Gemini API key
  /send-files on|off   send attachment contents inline
  /export [path]       write the transcript as JSON
  /import [path]       replace the transcript from JSON
  /history             show the transcript
  /reset               clear the session and stored data
  /forget              clear stored data, keep the session
  quit | exit          leave";

/// The gemchat REPL.
///
/// Loads configuration, restores the stored credential and history, then reads
/// lines until `quit`, `exit` or EOF. Replies stream to stdout while logs go to
/// stderr.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    // ===== Configuration =====
    let paths = ChatPaths::new();
    let config_path = match args.config {
        Some(path) => path,
        None => paths.config_file()?,
    };
    let config_service = ConfigService::new(config_path);
    let mut config = config_service
        .load()
        .with_context(|| format!("failed to load {}", config_service.path().display()))?;

    if let Some(model) = args.model {
        if is_supported(&model) {
            config.model = model;
        } else {
            warn!(model = %model, "Unsupported model requested, keeping {}", config.model);
        }
    }
    if args.send_files {
        config.send_file_contents = true;
    }

    let store_path = match args.store {
        Some(path) => path,
        None => paths.store_file()?,
    };

    // ===== Session =====
    let presenter = Arc::new(ConsolePresenter::new());
    let mut chat = ChatUseCase::new(
        config,
        Arc::new(JsonFileStore::new(store_path)),
        presenter,
        Arc::new(GeminiCapabilityFactory),
    );

    println!("{}", "=== gemchat ===".bright_magenta().bold());
    chat.restore().await;
    println!(
        "{}",
        format!(
            "Model: {} | {} messages restored | /help for commands",
            chat.config().model,
            chat.transcript().len()
        )
        .bright_black()
    );
    println!();

    // ===== REPL =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                if command.is_recordable() {
                    let _ = rl.add_history_entry(line.trim());
                }
                if command == Command::Quit {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                run_command(&mut chat, &config_service, command).await;
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}

/// Runs one command. Failures have already been reported through the
/// presenter or are printed here; none of them end the session.
async fn run_command(chat: &mut ChatUseCase, config_service: &ConfigService, command: Command) {
    match command {
        Command::Message(text) => {
            // The use case reports refusals itself.
            let _ = chat.submit(&text).await;
        }
        Command::Attach(path) => {
            let _ = chat.attach_file(&path).await;
        }
        Command::Pending => {
            let names = chat.pending().names();
            if names.is_empty() {
                println!("{}", "No pending attachments".bright_black());
            } else {
                println!("{}", format!("Pending: {}", names.join(", ")).bright_black());
            }
        }
        Command::ClearPending => {
            chat.clear_pending();
            println!("{}", "Pending attachments cleared".bright_green());
        }
        Command::Model(None) => {
            println!("{}", format!("Model: {}", chat.config().model).bright_black());
        }
        Command::Model(Some(model)) => match chat.select_model(&model) {
            Ok(()) => {
                persist_model(config_service, &model);
                println!("{}", format!("Model set to {model}").bright_green());
            }
            Err(err) => eprintln!("{}", err.to_string().red()),
        },
        Command::Models => {
            for model in SUPPORTED_MODELS {
                let marker = if *model == chat.config().model { "*" } else { " " };
                println!("{} {}", marker, model);
            }
        }
        Command::Key(key) => {
            chat.set_credential(&key).await;
            if chat.is_ready() {
                println!("{}", "API key set".bright_green());
            }
        }
        Command::SendFiles(enabled) => {
            chat.set_send_file_contents(enabled);
            let state = if enabled { "on" } else { "off" };
            println!("{}", format!("Send file contents: {state}").bright_green());
        }
        Command::Export(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
            if let Err(err) = chat.export_to_file(&path).await {
                eprintln!("{}", format!("Export failed: {err}").red());
            }
        }
        Command::Import(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
            let _ = chat.import_from_file(&path).await;
        }
        Command::History => print_history(chat),
        Command::Reset => {
            chat.clear_all().await;
            println!("{}", "Session and stored data cleared".bright_green());
        }
        Command::Forget => chat.clear_local_cache().await,
        Command::Help => println!("{}", HELP.bright_black()),
        Command::Invalid(message) => println!("{}", message.yellow()),
        Command::Quit => {}
    }
}

fn print_history(chat: &ChatUseCase) {
    if chat.transcript().is_empty() {
        println!("{}", "No messages yet".bright_black());
        return;
    }
    for message in chat.transcript() {
        let text = message.text();
        match message.role {
            MessageRole::User => println!("{}", format!("> {text}").green()),
            MessageRole::Assistant => {
                for line in text.lines() {
                    println!("{}", line.bright_blue());
                }
                println!();
            }
        }
    }
}

/// Remembers the selected model in config.toml for the next start.
fn persist_model(config_service: &ConfigService, model: &str) {
    let result = config_service.load().and_then(|mut config| {
        config.model = model.to_string();
        config_service.save(&config)
    });
    if let Err(err) = result {
        warn!(error = %err, "Failed to save selected model");
    }
}

//! Interactive REPL — one query per line, history carried across turns.
//!
//! Uses `rustyline` for readline-style editing with persistent input history.
//! The editor runs on its own thread so the runtime keeps watching for
//! interrupts while the prompt waits for input.

use std::sync::mpsc as std_mpsc;

use anyhow::{Context, Result};
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use mcpilot_agent::{ConversationLoop, TurnError};
use mcpilot_core::types::Message;
use mcpilot_core::utils::truncate_string;

use crate::helpers;

const PROMPT: &str = "Enter your prompt (or 'quit' to exit): ";

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["quit", "exit", "q"];

/// What one input line led to.
#[derive(Debug)]
pub enum Step {
    /// Blank line; prompt again.
    Skip,
    /// Exit command; end the session.
    Exit,
    /// The turn completed with this reply.
    Replied(String),
    /// The turn failed; history is unchanged.
    Failed(TurnError),
}

/// Conversation state owned by the shell.
pub struct Chat<'a> {
    conversation: &'a ConversationLoop,
    history: Vec<Message>,
    interrupted: watch::Receiver<bool>,
}

impl<'a> Chat<'a> {
    pub fn new(conversation: &'a ConversationLoop, interrupted: watch::Receiver<bool>) -> Self {
        Self {
            conversation,
            history: Vec::new(),
            interrupted,
        }
    }

    /// Handle one raw input line.
    ///
    /// An interrupt arriving mid-turn does not cancel it: the turn settles
    /// and [`Chat::interrupted`] reports that the session should end.
    pub async fn process_line(&mut self, line: &str) -> Step {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Step::Skip;
        }
        if is_exit_command(trimmed) {
            return Step::Exit;
        }

        debug!(input = %truncate_string(trimmed, 80), "processing input");
        match self.conversation.run_turn(trimmed, &self.history).await {
            Ok(outcome) => {
                self.history = outcome.history;
                Step::Replied(outcome.reply)
            }
            Err(e) => Step::Failed(e),
        }
    }

    /// Whether Ctrl-C has been received during this session.
    pub fn interrupted(&self) -> bool {
        *self.interrupted.borrow()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

// ─────────────────────────────────────────────
// Line input
// ─────────────────────────────────────────────

/// Handle to the thread that owns the line editor. Each [`LineReader::next_line`]
/// asks the thread for one line and waits for it without blocking the runtime.
pub struct LineReader {
    requests: std_mpsc::Sender<()>,
    lines: mpsc::UnboundedReceiver<rustyline::Result<String>>,
}

impl LineReader {
    pub fn spawn() -> Result<Self> {
        let (requests, request_rx) = std_mpsc::channel();
        let (line_tx, lines) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("mcpilot-input".into())
            .spawn(move || input_thread(request_rx, line_tx))
            .context("failed to start input thread")?;
        Ok(Self { requests, lines })
    }

    /// Next input line; `None` once the editor thread is gone.
    pub async fn next_line(&mut self) -> Option<rustyline::Result<String>> {
        // Pre-filled readers in tests have no thread behind them.
        let _ = self.requests.send(());
        self.lines.recv().await
    }
}

fn input_thread(
    requests: std_mpsc::Receiver<()>,
    lines: mpsc::UnboundedSender<rustyline::Result<String>>,
) {
    let mut editor = match create_editor() {
        Ok(editor) => editor,
        Err(e) => {
            let _ = lines.send(Err(e));
            return;
        }
    };

    while requests.recv().is_ok() {
        let line = editor.readline(PROMPT);
        if let Ok(input) = &line {
            let trimmed = input.trim();
            if !trimmed.is_empty() {
                let _ = editor.add_history_entry(trimmed);
                save_history(&mut editor);
            }
        }
        if lines.send(line).is_err() {
            break;
        }
    }
}

// ─────────────────────────────────────────────
// Session loop
// ─────────────────────────────────────────────

/// Run the interactive REPL loop until an exit command, EOF, or Ctrl-C.
pub async fn run(conversation: &ConversationLoop, interrupts: watch::Receiver<bool>) -> Result<()> {
    let mut reader = LineReader::spawn()?;
    let mut chat = Chat::new(conversation, interrupts.clone());
    drive(&mut chat, &mut reader, interrupts).await;
    debug!(messages = chat.history().len(), "chat session ended");
    Ok(())
}

async fn drive(chat: &mut Chat<'_>, reader: &mut LineReader, mut interrupts: watch::Receiver<bool>) {
    loop {
        if chat.interrupted() {
            println!("\nExiting...");
            break;
        }

        println!();
        let line = tokio::select! {
            line = reader.next_line() => line,
            Ok(_) = interrupts.wait_for(|interrupted| *interrupted) => {
                println!("\nExiting...");
                break;
            }
        };
        let input = match line {
            Some(Ok(line)) => line,
            Some(Err(ReadlineError::Interrupted)) | Some(Err(ReadlineError::Eof)) | None => {
                println!("\nExiting...");
                break;
            }
            Some(Err(e)) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if !trimmed.is_empty() && !is_exit_command(trimmed) {
            helpers::print_thinking();
        }

        match chat.process_line(&input).await {
            Step::Skip => continue,
            Step::Exit => break,
            Step::Replied(reply) => {
                helpers::clear_thinking();
                helpers::print_response(&reply);
            }
            Step::Failed(e) => {
                helpers::clear_thinking();
                helpers::print_turn_error(&e);
            }
        }
    }
}

/// Create a rustyline editor with history.
fn create_editor() -> rustyline::Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    mcpilot_core::utils::get_data_path().join("history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

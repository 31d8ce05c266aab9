// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `membridge shell` command implementation.
//!
//! An interactive REPL over the bridge: plain lines are ingested through the
//! gatekeeper, slash commands reach the store directly. Each invocation owns
//! one [`ShellSession`] holding its transcript.

use colored::Colorize;
use membridge_config::MembridgeConfig;
use membridge_core::MembridgeError;
use membridge_gatekeeper::Intent;
use membridge_pipeline::{ActionResult, AddMemory, IngestRequest, MemoryBridge};
use membridge_tools::{register_memory_tools, ToolRegistry};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::commands::{format_memory, format_outcome};
use crate::setup::{init_tracing, open_bridge};

const RECENT_LIMIT: usize = 10;

const HELP: &str = "\
  <text>              let the gatekeeper decide
  /save <text>        store verbatim
  /search <query>     semantic search
  /forget <id>        delete a memory
  /recent             latest memories
  /history            decisions made this session
  /tools              tool definitions
  /quit               exit";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Ingest(String),
    Save(String),
    Search(String),
    Forget(String),
    Recent,
    History,
    Tools,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return ShellCommand::Ingest(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim().to_string()),
            None => (rest, String::new()),
        };
        match (name, arg.is_empty()) {
            ("save", false) => ShellCommand::Save(arg),
            ("search", false) => ShellCommand::Search(arg),
            ("forget", false) => ShellCommand::Forget(arg),
            ("recent", _) => ShellCommand::Recent,
            ("history", _) => ShellCommand::History,
            ("tools", _) => ShellCommand::Tools,
            ("help", _) => ShellCommand::Help,
            ("quit" | "exit", _) => ShellCommand::Quit,
            _ => ShellCommand::Unknown(line.to_string()),
        }
    }
}

/// One transcript line: what happened to an input.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub input: String,
    pub intent: Intent,
    pub action: ActionResult,
}

/// Per-invocation shell state.
#[derive(Debug)]
pub struct ShellSession {
    pub id: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub transcript: Vec<TranscriptEntry>,
}

/// What the REPL should do after a command.
#[derive(Debug, PartialEq)]
pub enum ShellReply {
    Print(Vec<String>),
    Quit,
}

impl ShellSession {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now(),
            transcript: Vec::new(),
        }
    }

    /// Run one command against the bridge.
    pub async fn execute(
        &mut self,
        bridge: &MemoryBridge,
        tools: &ToolRegistry,
        command: ShellCommand,
    ) -> Result<ShellReply, MembridgeError> {
        let lines = match command {
            ShellCommand::Quit => return Ok(ShellReply::Quit),
            ShellCommand::Empty => Vec::new(),
            ShellCommand::Help => vec![HELP.to_string()],
            ShellCommand::Unknown(line) => {
                vec![format!("unknown command: {line} (try /help)")]
            }
            ShellCommand::Ingest(text) => {
                let outcome = bridge.ingest(IngestRequest::new(text.clone())).await?;
                let line = format_outcome(&outcome);
                self.transcript.push(TranscriptEntry {
                    input: text,
                    intent: outcome.decision.intent,
                    action: outcome.action_result,
                });
                vec![line]
            }
            ShellCommand::Save(text) => {
                let id = bridge.add_memory(AddMemory::new(text.clone())).await?;
                let message = format!("saved memory {id}");
                self.transcript.push(TranscriptEntry {
                    input: text,
                    intent: Intent::Save,
                    action: ActionResult::Saved {
                        id,
                        message: message.clone(),
                    },
                });
                vec![message]
            }
            ShellCommand::Search(query) => {
                let results = bridge.search_memory(&query, None, None).await?;
                if results.is_empty() {
                    vec!["no matching memories".dimmed().to_string()]
                } else {
                    results.iter().map(format_memory).collect()
                }
            }
            ShellCommand::Forget(id) => {
                bridge.delete_memory(&id).await?;
                vec![format!("deleted {id}")]
            }
            ShellCommand::Recent => bridge
                .recent(RECENT_LIMIT)
                .await?
                .into_iter()
                .map(|r| format!("{}  {}  {}", r.id, r.created_at.dimmed(), r.content))
                .collect(),
            ShellCommand::History => {
                if self.transcript.is_empty() {
                    vec!["nothing ingested yet".dimmed().to_string()]
                } else {
                    self.transcript
                        .iter()
                        .enumerate()
                        .map(|(i, e)| format!("{:>3}. {} {} -> {}", i + 1, e.intent, e.input, e.action.message()))
                        .collect()
                }
            }
            ShellCommand::Tools => tools
                .list()
                .into_iter()
                .map(|(name, description)| format!("{}  {description}", name.bold()))
                .collect(),
        };
        Ok(ShellReply::Print(lines))
    }
}

impl Default for ShellSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the interactive REPL until `/quit`, Ctrl+C, or Ctrl+D.
pub async fn run_shell(config: MembridgeConfig) -> Result<(), MembridgeError> {
    init_tracing(&config);
    let bridge = open_bridge(&config, false).await?;
    let mut tools = ToolRegistry::new();
    register_memory_tools(&mut tools, bridge.clone());

    let mut session = ShellSession::new();
    let mut rl = DefaultEditor::new()
        .map_err(|e| MembridgeError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "membridge shell".bold().green());
    println!(
        "oracle: {}, {} memories. Type {} for commands, {} to exit.\n",
        bridge.oracle_name(),
        bridge.count().await?,
        "/help".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", "membridge".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let command = ShellCommand::parse(&line);
                if command != ShellCommand::Empty {
                    let _ = rl.add_history_entry(&line);
                }
                match session.execute(&bridge, &tools, command).await {
                    Ok(ShellReply::Quit) => break,
                    Ok(ShellReply::Print(lines)) => {
                        for line in lines {
                            println!("{line}");
                        }
                    }
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    tracing::debug!(session = %session.id, entries = session.transcript.len(), "shell session closed");
    bridge.shutdown().await?;
    println!("{}", "goodbye".dimmed());
    Ok(())
}

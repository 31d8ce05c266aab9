// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! membridge - shared long-term memory for your LLM chats.
//!
//! This is the binary entry point: the HTTP gateway, the interactive shell,
//! and one-shot commands over the same memory store.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod serve;
mod setup;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use membridge_config::MembridgeConfig;

/// membridge - shared long-term memory for your LLM chats.
#[derive(Parser, Debug)]
#[command(name = "membridge", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Launch an interactive memory shell.
    Shell,
    /// Search stored memories.
    Search {
        query: String,
        /// Maximum number of results.
        #[arg(short = 'k', long)]
        k: Option<usize>,
        /// Maximum distance (exclusive).
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Store text verbatim, bypassing the gatekeeper.
    Save {
        content: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long = "url")]
        source_url: Option<String>,
    },
    /// Let the gatekeeper decide what to do with text.
    Ingest {
        text: String,
        /// Always save, keeping the text verbatim.
        #[arg(long)]
        force: bool,
        /// Use this context instead of retrieving one.
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long = "url")]
        source_url: Option<String>,
    },
    /// Replace the content of a memory.
    Update {
        id: String,
        content: String,
        /// Replace the tags too; omit to keep them.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a memory.
    Forget { id: String },
    /// Print the resolved configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => membridge_config::load_and_validate_path(path),
        None => membridge_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            membridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, config).await {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn run(
    command: Option<Commands>,
    config: MembridgeConfig,
) -> Result<(), membridge_core::MembridgeError> {
    match command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Shell) => shell::run_shell(config).await,
        Some(Commands::Search { query, k, threshold }) => {
            commands::search(&config, &query, k, threshold).await
        }
        Some(Commands::Save {
            content,
            tags,
            source,
            source_url,
        }) => commands::save(&config, content, tags, source, source_url).await,
        Some(Commands::Ingest {
            text,
            force,
            context,
            source,
            source_url,
        }) => commands::ingest(&config, text, force, context, source, source_url).await,
        Some(Commands::Update { id, content, tags }) => {
            commands::update(&config, &id, &content, tags).await
        }
        Some(Commands::Forget { id }) => commands::forget(&config, &id).await,
        Some(Commands::Config) => commands::print_config(&config),
        None => {
            println!("membridge: use --help for available commands");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_repeated_tags() {
        let cli = Cli::try_parse_from([
            "membridge", "save", "Likes oolong", "--tag", "tea", "--tag", "drinks", "--url",
            "https://chat.example/1",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Save { content, tags, source_url, .. }) => {
                assert_eq!(content, "Likes oolong");
                assert_eq!(tags, ["tea", "drinks"]);
                assert_eq!(source_url.as_deref(), Some("https://chat.example/1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parses_ingest_flags_and_global_config() {
        let cli = Cli::try_parse_from([
            "membridge", "ingest", "ok thanks", "--force", "--config", "/tmp/m.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/m.toml")));
        assert!(matches!(cli.command, Some(Commands::Ingest { force: true, .. })));
    }

    #[test]
    fn cli_parses_search_options() {
        let cli = Cli::try_parse_from(["membridge", "search", "pets", "-k", "2", "--threshold", "1.2"])
            .unwrap();
        match cli.command {
            Some(Commands::Search { k, threshold, .. }) => {
                assert_eq!(k, Some(2));
                assert_eq!(threshold, Some(1.2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = membridge_config::load_and_validate_str("").expect("empty config should be valid");
        assert_eq!(config.bridge.name, "membridge");
    }
}

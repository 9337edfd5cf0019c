//! Lexicon application binary - composition root.
//!
//! Ties together the Lexicon crates into a single executable:
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Build the catalog and LLM collaborators
//! 3. Wire the intent router into a chat orchestrator
//! 4. Answer one question (`--once`) or run an interactive prompt

mod cli;

use std::io::Write;
use std::path::Path;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use lexicon_chat::{ChatOrchestrator, ChatResponse, IntentRouter};
use lexicon_client::{build_catalog, build_llm};
use lexicon_core::config::LexiconConfig;
use lexicon_core::error::LexiconError;

use cli::CliArgs;

const HELP: &str = "Commands: /new starts a fresh session, /history shows this session, /quit exits.";

/// Read the config file before logging is up.
///
/// The load error is handed back so it can be reported once the subscriber
/// exists.
fn load_config(path: &Path) -> (LexiconConfig, Option<LexiconError>) {
    match LexiconConfig::load(path) {
        Ok(config) => (config, None),
        Err(e) => (LexiconConfig::default(), Some(e)),
    }
}

/// Print an answer and its follow-up suggestions.
fn print_response(response: &ChatResponse) {
    println!("\n{}\n", response.answer);
    if !response.suggestions.is_empty() {
        println!("Try next:");
        for suggestion in &response.suggestions {
            println!("  - {}", suggestion);
        }
        println!();
    }
}

/// Run the interactive prompt until EOF or `/quit`.
async fn repl(orchestrator: &ChatOrchestrator) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session: Option<Uuid> = None;

    println!("Lexicon v{}. Ask about a glossary term. {}", env!("CARGO_PKG_VERSION"), HELP);

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => {
                println!("{}", HELP);
                continue;
            }
            "/new" => {
                if let Some(sid) = session.take() {
                    if let Err(e) = orchestrator.delete_session(sid) {
                        tracing::debug!(error = %e, "Previous session already gone");
                    }
                }
                println!("Started a new session.");
                continue;
            }
            "/history" => {
                match session.map(|sid| orchestrator.get_history(sid)) {
                    Some(Ok(messages)) => {
                        for message in messages {
                            println!("[{}] {}", message.role, message.content);
                        }
                    }
                    Some(Err(e)) => println!("{}", e),
                    None => println!("No messages yet."),
                }
                continue;
            }
            _ => {}
        }

        match orchestrator.handle_message(input, session).await {
            Ok((response, sid)) => {
                session = Some(sid);
                print_response(&response);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Message rejected");
                println!("{}", e);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let (config, load_error) = load_config(&config_file);
    let mut config = config.with_env_overrides();
    if let Some(ref url) = args.catalog_url {
        config.catalog.base_url = url.clone();
    }

    // Tracing. RUST_LOG wins over --log-level and the config file.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Lexicon v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    // Collaborators.
    let catalog = build_catalog(&config.catalog)?;
    if config.catalog.is_configured() {
        tracing::info!(base_url = %config.catalog.base_url, "Catalog client ready");
    } else {
        tracing::warn!("Catalog not configured, answers will use sample data");
    }

    let llm = build_llm(&config.llm)?;
    if config.llm.is_configured() {
        tracing::info!(model = %config.llm.model, "LLM client ready");
    } else {
        tracing::info!("LLM not configured, classification uses patterns only");
    }

    let router = IntentRouter::new(catalog, llm, &config);
    let orchestrator = ChatOrchestrator::new(router, config.chat.clone());

    if let Some(question) = args.once.as_deref() {
        let (response, _) = orchestrator.handle_message(question, None).await?;
        print_response(&response);
        return Ok(());
    }

    repl(&orchestrator).await
}

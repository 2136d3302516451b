//! pilot - terminal client for the sales agent

mod admin;
mod commands;
mod config;
mod terminal;
mod transcript;
mod utils;

use clap::{Parser, Subcommand};
use pilot_chat::{ChatSession, ChatTurn, TurnStatus};
use pilot_client::AgentClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::admin::{ConnectionCommand, KbCommand, PlansCommand, RulesCommand, ServiceCommand};
use crate::terminal::TerminalTarget;
use crate::transcript::{Transcript, expand_home};

/// pilot - talk to the sales agent and manage its autopilot
#[derive(Parser, Debug)]
#[command(name = "pilot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend address (default: http://localhost:5000)
    #[arg(long)]
    base_url: Option<String>,

    /// Let the agent send routine replies without review
    #[arg(long)]
    hands_free: bool,

    /// Write an HTML transcript of the conversation to this file
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Send a single message and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    #[command(subcommand)]
    subcommand: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Knowledge-base collections
    #[command(subcommand)]
    Kb(KbCommand),
    /// Autopilot rules
    #[command(subcommand)]
    Rules(RulesCommand),
    /// Recent autopilot activity
    Activity,
    /// Scheduled action plans
    #[command(subcommand)]
    Plans(PlansCommand),
    /// Mailbox connection
    #[command(subcommand)]
    Connection(ConnectionCommand),
    /// Background autopilot service
    #[command(subcommand)]
    Service(ServiceCommand),
    /// Show the backend's chat history
    History,
    /// Clear the backend's chat history
    ClearHistory,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    let filter = if args.verbose {
        EnvFilter::new("pilot=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file and merge with CLI args (CLI takes precedence)
    let cfg = config::Config::load();
    let base_url = cfg.base_url(args.base_url);
    let hands_free = args.hands_free || cfg.hands_free.unwrap_or(false);
    let transcript_path = args
        .transcript
        .or_else(|| cfg.transcript_path.as_deref().map(expand_home));

    let mut client = AgentClient::new(base_url)?;
    if let Some(timeout) = cfg.request_timeout() {
        client = client.with_request_timeout(timeout);
    }
    tracing::debug!("Using backend at {}", client.base_url());

    if let Some(subcommand) = args.subcommand {
        let result = match subcommand {
            Command::Kb(cmd) => cmd.run(&client).await,
            Command::Rules(cmd) => cmd.run(&client).await,
            Command::Activity => admin::show_activity(&client).await,
            Command::Plans(cmd) => cmd.run(&client).await,
            Command::Connection(cmd) => cmd.run(&client).await,
            Command::Service(cmd) => cmd.run(&client).await,
            Command::History => admin::show_history(&client).await,
            Command::ClearHistory => admin::clear_history(&client).await,
        };
        if let Err(e) = &result {
            if let Some(client_err) = e.downcast_ref::<pilot_client::Error>() {
                eprintln!("Error: {}", admin::describe_failure(client_err, client.base_url()));
                std::process::exit(1);
            }
        }
        return result;
    }

    let mut session = ChatSession::http(client.clone());
    session.set_hands_free(hands_free);
    let mut target = TerminalTarget::stdout(transcript_path.map(Transcript::new));

    if let Some(message) = args.command {
        return run_command(&mut session, &mut target, &message).await;
    }

    run_interactive(&mut session, &mut target, &client).await
}

async fn run_command(
    session: &mut ChatSession,
    target: &mut TerminalTarget,
    message: &str,
) -> anyhow::Result<()> {
    println!("pilot> {}", message);
    println!();

    let turn = session.send(message, target).await?;
    if matches!(turn.status(), TurnStatus::Failed(_)) {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_interactive(
    session: &mut ChatSession,
    target: &mut TerminalTarget,
    client: &AgentClient,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        let mode = if session.hands_free() { ", hands-free" } else { "" };
        eprintln!("pilot ({}{})  /help for commands", client.base_url(), mode);
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if let Some(result) = commands::execute_command(input, session.hands_free()) {
            match result {
                commands::CommandResult::Clear => {
                    session.clear_history();
                    if let Some(transcript) = target.transcript_mut() {
                        if let Err(e) = transcript.clear() {
                            tracing::warn!("Failed to clear transcript: {}", e);
                        }
                    }
                    match client.clear_chat_history().await {
                        Ok(_) => println!("Cleared conversation."),
                        Err(e) => println!(
                            "Cleared local conversation; the backend kept its memory: {}",
                            admin::describe_failure(&e, client.base_url())
                        ),
                    }
                }
                commands::CommandResult::SetHandsFree(enabled) => {
                    session.set_hands_free(enabled);
                    println!("Hands-free mode {}.", if enabled { "on" } else { "off" });
                }
                commands::CommandResult::Toggle { turn, action } => {
                    toggle_action(session, target, turn, action);
                }
                commands::CommandResult::History => {
                    print!("{}", format_history(session.turns()));
                }
                commands::CommandResult::Message(msg) => {
                    println!("{}", msg);
                }
                commands::CommandResult::Exit => {
                    break;
                }
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            continue;
        }

        println!();
        match session.send(input, target).await {
            Ok(_) => println!(),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

/// Flip an action of an earlier turn and show its details when opened.
fn toggle_action(session: &mut ChatSession, target: &mut TerminalTarget, turn: usize, action: u32) {
    let Some(turn_id) = session.turns().get(turn - 1).map(ChatTurn::id) else {
        println!("No turn {} (this session has {}).", turn, session.turns().len());
        return;
    };

    match session.toggle_action(turn_id, action, target) {
        Ok(true) => {
            if let Some(turn) = session.turn(turn_id) {
                print!("{}", describe_action(turn, action));
            }
        }
        Ok(false) => println!("Action {} collapsed.", action),
        Err(e) => println!("{}", e),
    }
}

/// Full input and output of one action, for the terminal
fn describe_action(turn: &ChatTurn, sequence: u32) -> String {
    let trace = turn.trace();
    let Some(action) = trace.actions().iter().find(|a| a.sequence == sequence) else {
        return String::new();
    };

    let input = serde_json::to_string_pretty(&action.input).unwrap_or_else(|_| action.input.to_string());
    let mut out = format!("⚙️  Action {}: {}\nInput:\n{}\n", action.sequence, action.name, input);
    if let Some(observation) = trace.observation_for(sequence) {
        out.push_str(&format!("📊 Observation:\n{}\n", observation.content));
    }
    out
}

fn format_history(turns: &[ChatTurn]) -> String {
    if turns.is_empty() {
        return "No messages yet.\n".to_string();
    }

    let mut out = String::new();
    for (i, turn) in turns.iter().enumerate() {
        let status = match turn.status() {
            TurnStatus::Completed => "done",
            TurnStatus::Failed(_) => "failed",
            _ => "running",
        };
        out.push_str(&format!(
            "{:>3}. [{}] {} ({} action(s)",
            i + 1,
            status,
            utils::truncate_chars(turn.user_text(), 60),
            turn.trace().actions().len()
        ));
        if turn.dropped_records() > 0 {
            tracing::debug!(
                "Turn {} dropped {} unreadable record(s)",
                turn.id(),
                turn.dropped_records()
            );
            out.push_str(&format!(", {} unreadable record(s) skipped", turn.dropped_records()));
        }
        out.push_str(")\n");
    }
    out
}

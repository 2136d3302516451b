//! Slash commands for interactive mode

mod handsfree;
mod toggle;

pub use handsfree::HandsFreeCommand;
pub use toggle::ToggleCommand;

/// Result of executing a slash command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Forget the local conversation (and the backend's memory of it)
    Clear,
    /// Change the hands-free flag
    SetHandsFree(bool),
    /// Flip an action section of an earlier turn (1-based turn number)
    Toggle { turn: usize, action: u32 },
    /// List the turns of this session
    History,
    /// Show a message to the user (not sent to the agent)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, hands_free: bool) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "handsfree" | "hf" => HandsFreeCommand::execute(args, hands_free),

        "toggle" | "t" => ToggleCommand::execute(args),

        "history" => CommandResult::History,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?              Show this help message
  /handsfree, /hf [on|off]   Show or set hands-free mode
  /toggle, /t <turn> <n>     Expand or collapse action n of a turn
  /history                   List the turns of this session
  /clear, /c                 Clear conversation history
  /quit, /exit, /q           Exit pilot

Examples:
  /handsfree on        Let the agent send routine replies on its own
  /toggle 2 1          Show the details of the first action in turn 2"#
        .to_string()
}

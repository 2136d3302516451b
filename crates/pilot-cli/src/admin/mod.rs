//! One-shot subcommands for the request/response endpoints

mod connection;
mod knowledge;
mod plans;
mod rules;
mod service;

pub use connection::ConnectionCommand;
pub use knowledge::KbCommand;
pub use plans::PlansCommand;
pub use rules::RulesCommand;
pub use service::ServiceCommand;

use anyhow::bail;
use pilot_client::{Ack, AgentClient, Role};
use pilot_client::Error as ClientError;

use crate::utils::one_line;

/// Turn a rejected acknowledgement into an error, otherwise print `done`.
fn expect_ack(ack: Ack, done: &str) -> anyhow::Result<()> {
    if !ack.success {
        bail!(
            "{}",
            ack.message
                .unwrap_or_else(|| "the backend rejected the request".to_string())
        );
    }
    println!("{}", ack.message.as_deref().unwrap_or(done));
    Ok(())
}

/// User-facing text for a failed backend call; network trouble gets a hint
/// about which backend was tried.
pub fn describe_failure(err: &ClientError, base_url: &str) -> String {
    if err.is_transport() {
        format!("{} (is the backend at {} up?)", err.user_message(), base_url)
    } else {
        err.user_message()
    }
}

/// Print the most recent autopilot actions
pub async fn show_activity(client: &AgentClient) -> anyhow::Result<()> {
    let activity = client.rules().activity().await?;
    if activity.is_empty() {
        println!("No autopilot activity yet.");
        return Ok(());
    }

    for entry in activity {
        println!(
            "{}  {}",
            entry.time.as_deref().unwrap_or("-"),
            entry.action.as_deref().unwrap_or("(no action)")
        );
        if let Some(subject) = entry.subject.as_deref() {
            println!("    subject: {}", one_line(subject, 80));
        }
        if let Some(from) = entry.from.as_deref() {
            println!("    from:    {}", from);
        }
        if let Some(reply) = entry.outgoing_snippet.as_deref() {
            println!("    reply:   {}", one_line(reply, 80));
        }
    }
    Ok(())
}

/// Print the backend's conversation memory
pub async fn show_history(client: &AgentClient) -> anyhow::Result<()> {
    let history = client.chat_history().await?;
    if history.is_empty() {
        println!("No chat history.");
        return Ok(());
    }

    for entry in history {
        let who = match entry.role {
            Role::User => "you",
            Role::Assistant => "agent",
        };
        println!("{:>5}: {}", who, one_line(&entry.content, 200));
    }
    Ok(())
}

/// Wipe the backend's conversation memory
pub async fn clear_history(client: &AgentClient) -> anyhow::Result<()> {
    expect_ack(client.clear_chat_history().await?, "Chat history cleared.")
}

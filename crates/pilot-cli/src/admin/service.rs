//! `pilot service` - background autopilot service

use clap::Subcommand;
use pilot_client::AgentClient;
use pilot_client::api::service::{ServiceState, ServiceStatus};

use super::expect_ack;

#[derive(Subcommand, Debug)]
pub enum ServiceCommand {
    /// Show whether the service is installed and running
    Status,
    /// Start the service
    Start,
    /// Stop the service
    Stop,
    /// Run one sweep now and print its log
    Run,
    /// Set the sweep interval
    Period { minutes: u32 },
}

impl ServiceCommand {
    pub async fn run(self, client: &AgentClient) -> anyhow::Result<()> {
        let api = client.service();
        match self {
            ServiceCommand::Status => println!("{}", format_status(&api.status().await?)),
            ServiceCommand::Start => expect_ack(api.toggle(true).await?, "Service started.")?,
            ServiceCommand::Stop => expect_ack(api.toggle(false).await?, "Service stopped.")?,
            ServiceCommand::Run => {
                let run = api.run_once().await?;
                print_logs(&run.logs);
                if !run.success {
                    anyhow::bail!("manual run failed");
                }
            }
            ServiceCommand::Period { minutes } => {
                expect_ack(api.set_period(minutes).await?, "Sweep interval updated.")?
            }
        }
        Ok(())
    }
}

fn format_status(status: &ServiceStatus) -> String {
    let state = match status.status {
        ServiceState::Running => "running",
        ServiceState::Stopped => "stopped",
        ServiceState::NotInstalled => "not installed",
        ServiceState::Unknown => "unknown",
    };
    let mut out = format!("service:  {}{}", state, if status.enabled { " (enabled)" } else { "" });
    if let Some(minutes) = status.period_minutes {
        out.push_str(&format!("\ninterval: every {} min", minutes));
    }
    if let Some(last_run) = status.last_run.as_deref() {
        out.push_str(&format!("\nlast run: {}", last_run));
    }
    out
}

/// The backend returns either a list of log lines or one block of text.
fn print_logs(logs: &serde_json::Value) {
    match logs {
        serde_json::Value::Array(lines) => {
            for line in lines {
                match line.as_str() {
                    Some(text) => println!("{}", text),
                    None => println!("{}", line),
                }
            }
        }
        serde_json::Value::String(text) => println!("{}", text),
        serde_json::Value::Null => {}
        other => println!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_status() {
        let status: ServiceStatus = serde_json::from_value(serde_json::json!({
            "status": "running",
            "enabled": true,
            "period_minutes": 15
        }))
        .unwrap();
        assert_eq!(
            format_status(&status),
            "service:  running (enabled)\ninterval: every 15 min"
        );
    }
}

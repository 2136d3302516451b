//! `pilot connection` - mailbox connection settings

use anyhow::Context;
use clap::{Args, Subcommand};
use pilot_client::AgentClient;
use pilot_client::api::connection::Credentials;

use super::expect_ack;

/// Read when `--password` is not given
const PASSWORD_ENV: &str = "PILOT_MAIL_PASSWORD";

#[derive(Subcommand, Debug)]
pub enum ConnectionCommand {
    /// Show the configured mailbox
    Status,
    /// Check credentials without saving them
    Test(CredentialArgs),
    /// Store credentials on the backend
    Save(CredentialArgs),
    /// Fetch a few messages with the stored settings
    FetchTest,
}

#[derive(Args, Debug)]
pub struct CredentialArgs {
    #[arg(long)]
    email: String,
    /// Mailbox password (defaults to $PILOT_MAIL_PASSWORD)
    #[arg(long)]
    password: Option<String>,
    /// IMAP host, if it cannot be derived from the address
    #[arg(long)]
    host: Option<String>,
    /// Name the agent signs replies with
    #[arg(long)]
    agent_name: Option<String>,
}

impl CredentialArgs {
    fn into_credentials(self) -> anyhow::Result<Credentials> {
        let password = match self.password {
            Some(password) => password,
            None => std::env::var(PASSWORD_ENV)
                .with_context(|| format!("pass --password or set {}", PASSWORD_ENV))?,
        };
        Ok(Credentials {
            email: self.email,
            password,
            host: self.host,
            agent_name: self.agent_name,
        })
    }
}

impl ConnectionCommand {
    pub async fn run(self, client: &AgentClient) -> anyhow::Result<()> {
        let api = client.connection();
        match self {
            ConnectionCommand::Status => {
                let info = api.status().await?;
                if info.email.is_empty() {
                    println!("No mailbox configured.");
                    return Ok(());
                }
                println!("email:      {}", info.email);
                println!("host:       {}", info.host);
                println!("password:   {}", if info.has_password { "stored" } else { "missing" });
                println!("agent name: {}", info.agent_name);
            }
            ConnectionCommand::Test(args) => {
                let result = api.test(&args.into_credentials()?).await?;
                let mark = if result.success { "✅" } else { "❌" };
                println!("{} {}", mark, result.message);
                if !result.success {
                    anyhow::bail!("connection test failed");
                }
            }
            ConnectionCommand::Save(args) => {
                let credentials = args.into_credentials()?;
                tracing::debug!("Saving {:?}", credentials);
                expect_ack(api.save(&credentials).await?, "Connection settings saved.")?;
            }
            ConnectionCommand::FetchTest => {
                let result = api.fetch_test().await?;
                if !result.success {
                    anyhow::bail!(
                        "fetch failed: {}",
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                println!("Fetched {} message(s):", result.emails.len());
                for mail in result.emails {
                    println!("  {}  <{}>", mail.subject, mail.from);
                }
            }
        }
        Ok(())
    }
}

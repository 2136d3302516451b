//! Mailbox connection settings

use serde::{Deserialize, Serialize};

use crate::{client::AgentClient, error::Result, types::Ack};

pub struct ConnectionApi<'a> {
    pub(crate) client: &'a AgentClient,
}

/// What the backend currently has configured. The password is never echoed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionInfo {
    pub email: String,
    pub host: String,
    pub has_password: bool,
    pub agent_name: String,
}

/// Mailbox credentials to test or store
#[derive(Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("agent_name", &self.agent_name)
            .finish()
    }
}

/// Result of a login attempt against the mail server
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
}

/// Subject and sender of one unread message
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MailPreview {
    pub subject: String,
    pub from: String,
}

/// Small sample of unread mail fetched with the saved credentials
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchTest {
    pub success: bool,
    pub emails: Vec<MailPreview>,
    pub error: Option<String>,
}

impl ConnectionApi<'_> {
    pub async fn status(&self) -> Result<ConnectionInfo> {
        self.client.get_json("/api/connection/status").await
    }

    /// Try to log in without saving anything
    pub async fn test(&self, credentials: &Credentials) -> Result<ConnectionTest> {
        self.client.post_json("/api/connection/test", credentials).await
    }

    /// Persist credentials and make the backend reload them
    pub async fn save(&self, credentials: &Credentials) -> Result<Ack> {
        self.client.post_json("/api/connection/save", credentials).await
    }

    /// Fetch a few unread messages with the saved credentials
    pub async fn fetch_test(&self) -> Result<FetchTest> {
        self.client.post_empty("/api/connection/fetch-test").await
    }
}

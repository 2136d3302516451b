//! Background autopilot service control

use serde::{Deserialize, Serialize};

use crate::{
    client::AgentClient,
    error::{Error, Result},
    types::Ack,
};

pub struct ServiceApi<'a> {
    pub(crate) client: &'a AgentClient,
}

/// State of the OS-level autopilot service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Running,
    Stopped,
    NotInstalled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceStatus {
    pub status: ServiceState,
    #[serde(default)]
    pub enabled: bool,
    /// Minutes between mailbox sweeps
    #[serde(default)]
    pub period_minutes: Option<u32>,
    #[serde(default)]
    pub last_run: Option<String>,
}

/// Log lines from a manually triggered sweep
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ManualRun {
    pub success: bool,
    pub logs: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Toggle {
    enable: bool,
}

#[derive(Debug, Serialize)]
struct Period {
    period: u32,
}

impl ServiceApi<'_> {
    pub async fn status(&self) -> Result<ServiceStatus> {
        self.client.get_json("/api/autopilot/service/status").await
    }

    /// Start or stop the service
    pub async fn toggle(&self, enable: bool) -> Result<Ack> {
        self.client
            .post_json("/api/autopilot/service/toggle", &Toggle { enable })
            .await
    }

    /// Run one autopilot sweep now
    pub async fn run_once(&self) -> Result<ManualRun> {
        self.client.post_empty("/api/autopilot/run-manual").await
    }

    /// Set the minutes between sweeps
    pub async fn set_period(&self, minutes: u32) -> Result<Ack> {
        if minutes == 0 {
            return Err(Error::InvalidConfig("period must be at least one minute".to_string()));
        }
        self.client
            .post_json("/api/autopilot/period", &Period { period: minutes })
            .await
    }
}

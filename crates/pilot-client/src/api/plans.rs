//! Scheduled action plans and their execution history

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    client::{AgentClient, segment},
    error::Result,
    types::Ack,
};

pub struct PlansApi<'a> {
    pub(crate) client: &'a AgentClient,
}

/// How often a plan runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every time the autopilot sweeps the mailbox
    EverySweep,
    Hourly,
    Daily,
    /// Schedules written by newer backends are carried through untouched
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::EverySweep => write!(f, "Every Autopilot Sweep"),
            Frequency::Hourly => write!(f, "Once per Hour"),
            Frequency::Daily => write!(f, "Once per Day"),
            Frequency::Other(raw) => write!(f, "{}", raw),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().replace('-', "_").as_str() {
            "every_sweep" | "sweep" => Frequency::EverySweep,
            "hourly" => Frequency::Hourly,
            "daily" => Frequency::Daily,
            _ => Frequency::Other(s.to_string()),
        })
    }
}

/// A task the agent runs on a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub task: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub frequency: Frequency,
    #[serde(default)]
    pub last_executed: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Fields for a plan the backend has not assigned an id to yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPlan {
    pub name: String,
    pub task: String,
    pub frequency: Frequency,
    pub enabled: bool,
}

/// One recorded run of a plan
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlanExecution {
    pub plan_id: String,
    pub timestamp: Option<String>,
    pub success: bool,
    pub final_answer: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReplacePlans<'a> {
    plans: &'a [ActionPlan],
}

#[derive(Debug, Deserialize)]
struct AddedPlan {
    plan: ActionPlan,
}

fn default_enabled() -> bool {
    true
}

impl PlansApi<'_> {
    pub async fn list(&self) -> Result<Vec<ActionPlan>> {
        self.client.get_json("/api/action-plans").await
    }

    /// Create a plan and return it with its backend-assigned id
    pub async fn add(&self, plan: &NewPlan) -> Result<ActionPlan> {
        let added: AddedPlan = self.client.post_json("/api/action-plans", plan).await?;
        Ok(added.plan)
    }

    /// Replace the whole plan set
    pub async fn replace_all(&self, plans: &[ActionPlan]) -> Result<Ack> {
        self.client
            .put_json("/api/action-plans", &ReplacePlans { plans })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<Ack> {
        let path = format!("/api/action-plans/{}", segment(id));
        self.client.delete_json(&path).await
    }

    /// Most recent executions, newest first
    pub async fn history(&self) -> Result<Vec<PlanExecution>> {
        self.client.get_json("/api/action-plans/history").await
    }
}

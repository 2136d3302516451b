//! Autopilot mail-handling rules and the activity log they produce

use serde::{Deserialize, Serialize};

use crate::{
    client::{AgentClient, segment},
    error::Result,
    types::Ack,
};

/// Priority assumed for rules stored without one (sorts last)
pub const UNRANKED_PRIORITY: u32 = 999;

/// Priority the backend assigns to a new rule when none is given
pub const DEFAULT_PRIORITY: u32 = 2;

pub struct RulesApi<'a> {
    pub(crate) client: &'a AgentClient,
}

/// A prompt the autopilot applies to incoming mail.
///
/// Lower `priority` wins; 1 is the highest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub prompt: String,
    /// Shipped with the backend rather than written by a user
    #[serde(default)]
    pub builtin: bool,
    #[serde(default = "unranked")]
    pub priority: u32,
}

/// Fields for a rule the backend has not assigned an id to yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRule {
    pub name: String,
    pub prompt: String,
    pub enabled: bool,
    pub priority: u32,
}

impl NewRule {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            enabled: true,
            priority: DEFAULT_PRIORITY,
        }
    }
}

/// One entry of the autopilot activity log
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActivitySummary {
    pub time: Option<String>,
    pub subject: Option<String>,
    pub from: Option<String>,
    pub action: Option<String>,
    pub read_snippet: Option<String>,
    pub outgoing_snippet: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReplaceRules<'a> {
    rules: &'a [Rule],
}

#[derive(Debug, Deserialize)]
struct AddedRule {
    rule: Rule,
}

fn default_enabled() -> bool {
    true
}

fn unranked() -> u32 {
    UNRANKED_PRIORITY
}

/// Order rules the way the autopilot evaluates them (stable for ties).
pub fn sort_by_priority(rules: &mut [Rule]) {
    rules.sort_by_key(|r| r.priority);
}

impl RulesApi<'_> {
    pub async fn list(&self) -> Result<Vec<Rule>> {
        self.client.get_json("/api/autopilot/rules").await
    }

    /// Create a rule and return it with its backend-assigned id
    pub async fn add(&self, rule: &NewRule) -> Result<Rule> {
        let added: AddedRule = self.client.post_json("/api/autopilot/rules", rule).await?;
        Ok(added.rule)
    }

    /// Replace the whole rule set (used for enable/disable and re-prioritizing)
    pub async fn replace_all(&self, rules: &[Rule]) -> Result<Ack> {
        self.client
            .put_json("/api/autopilot/rules", &ReplaceRules { rules })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<Ack> {
        let path = format!("/api/autopilot/rules/{}", segment(id));
        self.client.delete_json(&path).await
    }

    /// Most recent autopilot actions, newest first
    pub async fn activity(&self) -> Result<Vec<ActivitySummary>> {
        self.client.get_json("/api/autopilot/activity").await
    }
}

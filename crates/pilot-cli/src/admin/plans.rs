//! `pilot plans` - scheduled action plans

use anyhow::Context;
use clap::Subcommand;
use pilot_client::AgentClient;
use pilot_client::api::plans::{ActionPlan, Frequency, NewPlan};

use super::expect_ack;
use crate::utils::one_line;

#[derive(Subcommand, Debug)]
pub enum PlansCommand {
    /// List plans
    List,
    /// Add a plan
    Add {
        name: String,
        /// What the agent should do when the plan runs
        task: String,
        /// every_sweep, hourly or daily
        #[arg(long, default_value = "every_sweep")]
        frequency: Frequency,
        /// Create the plan switched off
        #[arg(long)]
        disabled: bool,
    },
    /// Switch a plan on
    Enable { plan: String },
    /// Switch a plan off
    Disable { plan: String },
    /// Delete a plan
    Delete { plan: String },
    /// Show recent plan runs
    History {
        /// Number of runs to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

impl PlansCommand {
    pub async fn run(self, client: &AgentClient) -> anyhow::Result<()> {
        let api = client.plans();
        match self {
            PlansCommand::List => {
                let plans = api.list().await?;
                if plans.is_empty() {
                    println!("No action plans.");
                }
                for plan in &plans {
                    println!("{}", format_plan(plan));
                }
            }
            PlansCommand::Add {
                name,
                task,
                frequency,
                disabled,
            } => {
                let plan = NewPlan {
                    name,
                    task,
                    frequency,
                    enabled: !disabled,
                };
                let added = api.add(&plan).await?;
                println!("Added plan {} ({}), runs {}.", added.name, added.id, added.frequency);
            }
            PlansCommand::Enable { plan } => set_enabled(client, &plan, true).await?,
            PlansCommand::Disable { plan } => set_enabled(client, &plan, false).await?,
            PlansCommand::Delete { plan } => {
                let plans = api.list().await?;
                let index = find_plan(&plans, &plan)?;
                expect_ack(api.delete(&plans[index].id).await?, "Plan deleted.")?;
            }
            PlansCommand::History { limit } => {
                let plans = api.list().await.unwrap_or_default();
                let history = api.history().await?;
                if history.is_empty() {
                    println!("No plan runs yet.");
                }
                for run in history.iter().take(limit) {
                    let name = plans
                        .iter()
                        .find(|p| p.id == run.plan_id)
                        .map(|p| p.name.as_str())
                        .unwrap_or(run.plan_id.as_str());
                    println!(
                        "{} {}  {}",
                        if run.success { "✅" } else { "❌" },
                        run.timestamp.as_deref().unwrap_or("-"),
                        name
                    );
                    if let Some(answer) = run.final_answer.as_deref() {
                        println!("    {}", one_line(answer, 120));
                    }
                    if let Some(error) = run.error.as_deref() {
                        println!("    error: {}", one_line(error, 120));
                    }
                }
            }
        }
        Ok(())
    }
}

async fn set_enabled(client: &AgentClient, key: &str, enabled: bool) -> anyhow::Result<()> {
    let api = client.plans();
    let mut plans = api.list().await?;
    let index = find_plan(&plans, key)?;
    plans[index].enabled = enabled;
    let summary = format_plan(&plans[index]);
    expect_ack(api.replace_all(&plans).await?, "Plan updated.")?;
    println!("{}", summary);
    Ok(())
}

/// Index of the plan with id `key`, falling back to a case-insensitive name match.
fn find_plan(plans: &[ActionPlan], key: &str) -> anyhow::Result<usize> {
    plans
        .iter()
        .position(|p| p.id == key)
        .or_else(|| plans.iter().position(|p| p.name.eq_ignore_ascii_case(key)))
        .with_context(|| format!("no plan matches {:?}", key))
}

fn format_plan(plan: &ActionPlan) -> String {
    format!(
        "{} {}  [{}]\n      {} | last run: {}\n      {}",
        if plan.enabled { "on " } else { "off" },
        plan.name,
        plan.id,
        plan.frequency,
        plan.last_executed.as_deref().unwrap_or("never"),
        one_line(&plan.task, 100)
    )
}

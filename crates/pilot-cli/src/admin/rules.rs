//! `pilot rules` - autopilot mail-handling rules

use anyhow::{Context, bail};
use clap::Subcommand;
use pilot_client::AgentClient;
use pilot_client::api::rules::{DEFAULT_PRIORITY, NewRule, Rule, sort_by_priority};

use super::expect_ack;
use crate::utils::one_line;

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List rules in evaluation order
    List,
    /// Add a rule
    Add {
        name: String,
        /// Instructions the autopilot follows when the rule applies
        prompt: String,
        /// Lower runs first
        #[arg(long, default_value_t = DEFAULT_PRIORITY)]
        priority: u32,
        /// Create the rule switched off
        #[arg(long)]
        disabled: bool,
    },
    /// Switch a rule on
    Enable { rule: String },
    /// Switch a rule off
    Disable { rule: String },
    /// Change a rule's priority
    Priority { rule: String, priority: u32 },
    /// Delete a custom rule
    Delete { rule: String },
}

impl RulesCommand {
    pub async fn run(self, client: &AgentClient) -> anyhow::Result<()> {
        let api = client.rules();
        match self {
            RulesCommand::List => {
                let mut rules = api.list().await?;
                if rules.is_empty() {
                    println!("No rules.");
                }
                sort_by_priority(&mut rules);
                for rule in &rules {
                    println!("{}", format_rule(rule));
                }
            }
            RulesCommand::Add {
                name,
                prompt,
                priority,
                disabled,
            } => {
                let mut rule = NewRule::new(name, prompt);
                rule.priority = priority;
                rule.enabled = !disabled;
                let added = api.add(&rule).await?;
                println!("Added rule {} ({}).", added.name, added.id);
            }
            RulesCommand::Enable { rule } => update(client, &rule, |r| r.enabled = true).await?,
            RulesCommand::Disable { rule } => update(client, &rule, |r| r.enabled = false).await?,
            RulesCommand::Priority { rule, priority } => {
                update(client, &rule, |r| r.priority = priority).await?
            }
            RulesCommand::Delete { rule } => {
                let mut rules = api.list().await?;
                let target = find_rule(&mut rules, &rule)?;
                if target.builtin {
                    bail!("{} is a built-in rule; disable it instead", target.name);
                }
                let id = target.id.clone();
                expect_ack(api.delete(&id).await?, "Rule deleted.")?;
            }
        }
        Ok(())
    }
}

/// Fetch the rule set, change one rule and store the whole set back.
async fn update(client: &AgentClient, key: &str, change: impl FnOnce(&mut Rule)) -> anyhow::Result<()> {
    let api = client.rules();
    let mut rules = api.list().await?;
    let rule = find_rule(&mut rules, key)?;
    change(rule);
    let summary = format_rule(rule);
    expect_ack(api.replace_all(&rules).await?, "Rule updated.")?;
    println!("{}", summary);
    Ok(())
}

/// Look a rule up by id, falling back to a case-insensitive name match.
fn find_rule<'a>(rules: &'a mut [Rule], key: &str) -> anyhow::Result<&'a mut Rule> {
    let index = rules
        .iter()
        .position(|r| r.id == key)
        .or_else(|| rules.iter().position(|r| r.name.eq_ignore_ascii_case(key)))
        .with_context(|| format!("no rule matches {:?}", key))?;
    Ok(&mut rules[index])
}

fn format_rule(rule: &Rule) -> String {
    format!(
        "{} #{:<3} {}{}  [{}]\n      {}",
        if rule.enabled { "on " } else { "off" },
        rule.priority,
        rule.name,
        if rule.builtin { " (built-in)" } else { "" },
        rule.id,
        one_line(&rule.prompt, 100)
    )
}

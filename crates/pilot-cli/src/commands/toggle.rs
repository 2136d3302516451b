//! /toggle command - expand or collapse an action of an earlier turn

use super::CommandResult;

pub struct ToggleCommand;

impl ToggleCommand {
    pub fn execute(args: &str) -> CommandResult {
        let mut parts = args.split_whitespace();
        let turn = parts.next().and_then(|s| s.parse::<usize>().ok());
        let action = parts.next().and_then(|s| s.parse::<u32>().ok());

        match (turn, action, parts.next()) {
            (Some(turn), Some(action), None) if turn > 0 && action > 0 => {
                CommandResult::Toggle { turn, action }
            }
            _ => CommandResult::Message(
                "Usage: /toggle <turn> <action>\nBoth numbers start at 1; see /history".to_string(),
            ),
        }
    }
}

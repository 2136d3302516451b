//! /handsfree command - show and set hands-free mode

use super::CommandResult;
use crate::utils::parse_switch;

pub struct HandsFreeCommand;

impl HandsFreeCommand {
    pub fn execute(args: &str, current: bool) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(format!(
                "Hands-free mode is {}\nSet with: /handsfree on|off",
                if current { "on" } else { "off" }
            ));
        }

        match parse_switch(args) {
            Some(enabled) => CommandResult::SetHandsFree(enabled),
            None => CommandResult::Message(format!(
                "Unknown setting: '{}'\nUse: /handsfree on|off",
                args
            )),
        }
    }
}

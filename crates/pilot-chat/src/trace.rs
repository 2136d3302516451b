//! Reasoning trace accumulated over one chat turn

use serde::{Deserialize, Serialize};

/// A tool invocation.
///
/// `sequence` is the 1-based position of the action within its trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub input: serde_json::Value,
    pub sequence: u32,
}

/// A tool result, tied to its action by `sequence` value rather than position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub content: String,
    pub sequence: u32,
}

/// Ordered record of an agent's work for one turn.
///
/// Every mutation appends; earlier entries are never rewritten. Nothing is
/// validated: empty text and `null` inputs are kept as they arrived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    thoughts: Vec<String>,
    actions: Vec<Action>,
    observations: Vec<Observation>,
    final_answer: Option<String>,
    counter: u32,
}

impl ReasoningTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a thought
    pub fn record_thought(&mut self, text: impl Into<String>) -> &Self {
        self.thoughts.push(text.into());
        self
    }

    /// Assign the next sequence number and append the action
    pub fn record_action(&mut self, name: impl Into<String>, input: serde_json::Value) -> &Self {
        self.counter += 1;
        self.actions.push(Action {
            name: name.into(),
            input,
            sequence: self.counter,
        });
        self
    }

    /// Append an observation tagged with the current sequence number.
    ///
    /// The backend sends each observation right after the action that
    /// produced it; an observation before any action carries sequence 0 and
    /// pairs with nothing.
    pub fn record_observation(&mut self, text: impl Into<String>) -> &Self {
        self.observations.push(Observation {
            content: text.into(),
            sequence: self.counter,
        });
        self
    }

    /// Set the final answer; a later call replaces an earlier one
    pub fn set_final_answer(&mut self, text: impl Into<String>) -> &Self {
        self.final_answer = Some(text.into());
        self
    }

    pub fn thoughts(&self) -> &[String] {
        &self.thoughts
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    /// Sequence number of the most recent action (0 before any)
    pub fn current_sequence(&self) -> u32 {
        self.counter
    }

    /// Chronologically last action
    pub fn latest_action(&self) -> Option<&Action> {
        self.actions.last()
    }

    /// First observation carrying `sequence`
    pub fn observation_for(&self, sequence: u32) -> Option<&Observation> {
        self.observations.iter().find(|o| o.sequence == sequence)
    }

    pub fn is_empty(&self) -> bool {
        self.thoughts.is_empty()
            && self.actions.is_empty()
            && self.observations.is_empty()
            && self.final_answer.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_actions_get_increasing_sequence_numbers() {
        let mut trace = ReasoningTrace::new();
        trace.record_action("search_kb", json!({"q": "pricing"}));
        trace.record_action("send_email", json!({"to": "a@b.c"}));
        let sequences: Vec<u32> = trace.actions().iter().map(|a| a.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        assert_eq!(trace.current_sequence(), 2);
    }

    #[test]
    fn test_observation_takes_current_counter() {
        let mut trace = ReasoningTrace::new();
        trace.record_action("search_kb", json!({}));
        trace.record_observation("3 docs found");
        trace.record_action("summarize", json!(null));
        trace.record_observation("done");

        assert_eq!(trace.observation_for(1).unwrap().content, "3 docs found");
        assert_eq!(trace.observation_for(2).unwrap().content, "done");
    }

    #[test]
    fn test_observation_before_any_action_pairs_with_nothing() {
        let mut trace = ReasoningTrace::new();
        trace.record_observation("orphan");
        trace.record_action("search_kb", json!({}));
        assert_eq!(trace.observations()[0].sequence, 0);
        assert!(trace.observation_for(1).is_none());
    }

    #[test]
    fn test_mutations_preserve_earlier_entries() {
        let mut trace = ReasoningTrace::new();
        trace.record_thought("first");
        let before = trace.clone();
        trace.record_thought("second");
        trace.record_action("x", json!(1));

        assert_eq!(&trace.thoughts()[..1], before.thoughts());
        assert_eq!(trace.thoughts(), ["first", "second"]);
    }

    #[test]
    fn test_final_answer_last_write_wins() {
        let mut trace = ReasoningTrace::new();
        trace.set_final_answer("draft");
        let snapshot = trace.set_final_answer("Price is $20");
        assert_eq!(snapshot.final_answer(), Some("Price is $20"));
    }

    #[test]
    fn test_empty_inputs_are_kept_verbatim() {
        let mut trace = ReasoningTrace::new();
        assert!(trace.is_empty());
        trace.record_thought("");
        trace.record_action("", serde_json::Value::Null);
        assert!(!trace.is_empty());
        assert_eq!(trace.thoughts(), [""]);
        assert_eq!(trace.latest_action().unwrap().input, serde_json::Value::Null);
    }
}

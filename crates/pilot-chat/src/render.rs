//! HTML rendering of a reasoning trace
//!
//! Rendering is a pure function of the trace and the user's expansion
//! overrides: each pass rebuilds the whole bubble, so calling it twice on the
//! same inputs produces identical output. All agent text goes through maud's
//! escaping.

use std::collections::BTreeMap;

use maud::{Markup, html};

use crate::{
    trace::{Action, ReasoningTrace},
    turn::{ChatTurn, TurnStatus},
};

/// Characters of pretty-printed tool input shown in an action section
pub const INPUT_PREVIEW_CHARS: usize = 500;
/// Characters of tool output shown in an action section
pub const OBSERVATION_PREVIEW_CHARS: usize = 800;

/// Explicit expand/collapse choices, keyed by action sequence number.
///
/// An entry wins over the default policy (latest action expanded, the rest
/// collapsed). Entries are kept for as long as the turn lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionOverrides {
    states: BTreeMap<u32, bool>,
}

impl ExpansionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, sequence: u32, expanded: bool) {
        self.states.insert(sequence, expanded);
    }

    pub fn get(&self, sequence: u32) -> Option<bool> {
        self.states.get(&sequence).copied()
    }

    /// Flip the effective state of `sequence`, given the sequence of the
    /// latest action. Returns the new state.
    pub fn toggle(&mut self, sequence: u32, latest: u32) -> bool {
        let expanded = !self.effective(sequence, latest);
        self.set(sequence, expanded);
        expanded
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn effective(&self, sequence: u32, latest: u32) -> bool {
        self.get(sequence).unwrap_or(sequence == latest)
    }
}

/// Whether the section for `sequence` is open on this pass
pub fn is_expanded(trace: &ReasoningTrace, overrides: &ExpansionOverrides, sequence: u32) -> bool {
    overrides.effective(sequence, trace.current_sequence())
}

/// Render thoughts, action sections and the final answer.
pub fn render_trace(trace: &ReasoningTrace, overrides: &ExpansionOverrides) -> Markup {
    html! {
        @for (i, thought) in trace.thoughts().iter().enumerate() {
            div class="react-thought" {
                "💭 " strong { "Thought " (i + 1) ":" } " " (thought)
            }
        }
        @for action in trace.actions() {
            (render_action(trace, overrides, action))
        }
        @if let Some(answer) = trace.final_answer() {
            div class="success-message" {
                "✅ " strong { "Final Answer:" } br; (answer)
            }
        }
    }
}

fn render_action(trace: &ReasoningTrace, overrides: &ExpansionOverrides, action: &Action) -> Markup {
    let expanded = is_expanded(trace, overrides, action.sequence);
    let input = pretty_input(&action.input);
    let observation = trace.observation_for(action.sequence);

    html! {
        div class=(if expanded { "expander expanded" } else { "expander" })
            data-seq=(action.sequence) {
            div class="expander-header" aria-expanded=(if expanded { "true" } else { "false" }) {
                span {
                    "⚙️ " strong { "Action " (action.sequence) ":" } " " code { (action.name) }
                }
                span { (if expanded { "▼" } else { "▶" }) }
            }
            div class="expander-content" {
                p { strong { "Input:" } }
                pre class="code-block" { (truncate_chars(&input, INPUT_PREVIEW_CHARS)) }
                @if let Some(observation) = observation {
                    p { strong { "📊 Observation:" } }
                    pre class="code-block" {
                        (truncate_chars(&observation.content, OBSERVATION_PREVIEW_CHARS))
                    }
                }
            }
        }
    }
}

/// Inline annotation for a recoverable step error
pub fn render_step_error(message: &str) -> Markup {
    html! {
        div class="error-message" { "❌ Error: " (message) }
    }
}

/// Shown while a turn is waiting for its first event
pub fn render_placeholder() -> String {
    html! {
        div class="typing-indicator" { "●●●" }
    }
    .into_string()
}

/// Replaces the bubble when a turn fails
pub fn render_failure(reason: &str) -> String {
    render_step_error(reason).into_string()
}

/// Render the assistant bubble for a turn in its current state.
pub fn render_bubble(turn: &ChatTurn, overrides: &ExpansionOverrides) -> String {
    if let TurnStatus::Failed(reason) = turn.status() {
        return render_failure(reason);
    }
    if !turn.status().is_terminal() && turn.trace().is_empty() && turn.step_errors().is_empty() {
        return render_placeholder();
    }

    html! {
        (render_trace(turn.trace(), overrides))
        @for message in turn.step_errors() {
            (render_step_error(message))
        }
    }
    .into_string()
}

/// Tool input as 2-space indented JSON
fn pretty_input(input: &serde_json::Value) -> String {
    serde_json::to_string_pretty(input).unwrap_or_else(|_| input.to_string())
}

/// Cut `s` to at most `max` characters, without an ellipsis.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_client::ServerEvent;
    use serde_json::json;

    fn example_trace() -> ReasoningTrace {
        let mut trace = ReasoningTrace::new();
        trace.record_thought("checking inventory");
        trace.record_action("search_kb", json!({"q": "pricing"}));
        trace.record_observation("3 docs found");
        trace.set_final_answer("Price is $20");
        trace
    }

    fn position(html: &str, needle: &str) -> usize {
        html.find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not found in {html}"))
    }

    #[test]
    fn test_example_stream_renders_in_order() {
        let html = render_trace(&example_trace(), &ExpansionOverrides::new()).into_string();

        let thought = position(&html, "Thought 1:");
        let action = position(&html, "Action 1:");
        let input = position(&html, "&quot;q&quot;: &quot;pricing&quot;");
        let observation = position(&html, "3 docs found");
        let answer = position(&html, "Price is $20");
        assert!(thought < action && action < input && input < observation && observation < answer);
        assert!(html.contains(r#"class="expander expanded" data-seq="1""#));
    }

    #[test]
    fn test_every_action_gets_a_section_with_its_observation() {
        let mut trace = ReasoningTrace::new();
        for i in 1..=4 {
            trace.record_action(format!("tool_{i}"), json!({ "step": i }));
            trace.record_observation(format!("result {i}"));
        }
        let html = render_trace(&trace, &ExpansionOverrides::new()).into_string();

        assert_eq!(html.matches("data-seq=").count(), 4);
        for i in 1..=4 {
            assert!(html.contains(&format!("Action {i}:")));
            assert!(html.contains(&format!("result {i}")));
        }
        assert_eq!(html.matches("expander expanded").count(), 1);
        assert!(html.contains(r#"class="expander expanded" data-seq="4""#));
    }

    #[test]
    fn test_unmatched_observation_is_not_shown() {
        let mut trace = ReasoningTrace::new();
        trace.record_observation("orphan output");
        trace.record_action("search_kb", json!({}));
        let html = render_trace(&trace, &ExpansionOverrides::new()).into_string();

        assert!(!html.contains("orphan output"));
        assert!(!html.contains("Observation:"));
        assert!(html.contains("Action 1:"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let trace = example_trace();
        let mut overrides = ExpansionOverrides::new();
        overrides.set(1, false);
        let first = render_trace(&trace, &overrides).into_string();
        let second = render_trace(&trace, &overrides).into_string();
        assert_eq!(first, second);
    }

    #[test]
    fn test_action_without_observation_still_renders() {
        let mut trace = ReasoningTrace::new();
        trace.record_action("send_email", json!({"to": "a@b.c"}));
        let html = render_trace(&trace, &ExpansionOverrides::new()).into_string();

        assert!(html.contains("Action 1:"));
        assert!(html.contains("send_email"));
        assert!(!html.contains("Observation:"));
    }

    #[test]
    fn test_agent_text_is_escaped() {
        let hostile = r#"<script>alert("x")</script> & more"#;
        let mut trace = ReasoningTrace::new();
        trace.record_thought(hostile);
        trace.record_action(hostile, json!({ "html": hostile }));
        trace.record_observation(hostile);
        trace.set_final_answer(hostile);
        let html = render_trace(&trace, &ExpansionOverrides::new()).into_string();

        assert!(!html.contains("<script>"));
        assert!(!html.contains("alert(\"x\")"));
        assert!(!html.contains(" & more"));
        assert!(html.contains("&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; more"));
    }

    #[test]
    fn test_long_text_is_truncated() {
        let mut trace = ReasoningTrace::new();
        trace.record_action("dump", json!("a".repeat(2000)));
        trace.record_observation("é".repeat(2000));
        trace.set_final_answer("z".repeat(2000));
        let html = render_trace(&trace, &ExpansionOverrides::new()).into_string();

        // the quoted JSON string starts with `"`, which escapes to `&quot;`
        let input = format!("&quot;{}</pre>", "a".repeat(INPUT_PREVIEW_CHARS - 1));
        assert!(html.contains(&input));
        let observation = format!(">{}</pre>", "é".repeat(OBSERVATION_PREVIEW_CHARS));
        assert!(html.contains(&observation));
        assert!(html.contains(&"z".repeat(2000)));
    }

    #[test]
    fn test_override_beats_default() {
        let mut trace = ReasoningTrace::new();
        trace.record_action("first", json!({}));
        trace.record_action("second", json!({}));

        let mut overrides = ExpansionOverrides::new();
        assert!(!is_expanded(&trace, &overrides, 1));
        assert!(is_expanded(&trace, &overrides, 2));

        assert!(overrides.toggle(1, trace.current_sequence()));
        assert!(!overrides.toggle(2, trace.current_sequence()));
        let html = render_trace(&trace, &overrides).into_string();
        assert!(html.contains(r#"class="expander expanded" data-seq="1""#));
        assert!(html.contains(r#"class="expander" data-seq="2""#));

        // a later action does not reset an explicit choice
        trace.record_action("third", json!({}));
        assert!(is_expanded(&trace, &overrides, 1));
        assert!(!is_expanded(&trace, &overrides, 2));
        assert!(is_expanded(&trace, &overrides, 3));
    }

    #[test]
    fn test_bubble_states() {
        let overrides = ExpansionOverrides::new();
        let mut turn = ChatTurn::new("hi");
        turn.set_status(TurnStatus::Streaming);
        assert_eq!(render_bubble(&turn, &overrides), render_placeholder());

        turn.apply(ServerEvent::thought("hmm"));
        turn.apply(ServerEvent::error("tool timed out"));
        let html = render_bubble(&turn, &overrides);
        assert!(html.contains("Thought 1:"));
        assert!(html.contains(r#"<div class="error-message">❌ Error: tool timed out</div>"#));

        turn.set_status(TurnStatus::Failed("connection reset".into()));
        assert_eq!(
            render_bubble(&turn, &overrides),
            r#"<div class="error-message">❌ Error: connection reset</div>"#
        );
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("", 0), "");
    }
}

//! Terminal render target
//!
//! The chat session repaints the whole bubble after every event. On a
//! terminal that would reprint everything, so this target keeps track of
//! what it has already echoed for the turn in flight and prints only the
//! new parts. The full markup goes to the transcript, if one is open.

use std::io::{self, Write};

use pilot_chat::{ChatTurn, RenderTarget, TurnStatus};
use uuid::Uuid;

use crate::transcript::Transcript;
use crate::utils::one_line;

/// What has been echoed for the current turn
#[derive(Debug, Default)]
struct Echoed {
    thoughts: usize,
    actions: usize,
    observations: usize,
    final_answer: Option<String>,
    step_errors: usize,
    failure: bool,
}

pub struct TerminalTarget<W: Write + Send = io::Stdout> {
    out: W,
    current: Option<Uuid>,
    echoed: Echoed,
    transcript: Option<Transcript>,
}

impl TerminalTarget {
    pub fn stdout(transcript: Option<Transcript>) -> Self {
        Self::new(io::stdout(), transcript)
    }
}

impl<W: Write + Send> TerminalTarget<W> {
    pub fn new(out: W, transcript: Option<Transcript>) -> Self {
        Self {
            out,
            current: None,
            echoed: Echoed::default(),
            transcript,
        }
    }

    pub fn transcript_mut(&mut self) -> Option<&mut Transcript> {
        self.transcript.as_mut()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn echo(&mut self, turn: &ChatTurn) -> io::Result<()> {
        let trace = turn.trace();

        for (i, thought) in trace.thoughts().iter().enumerate().skip(self.echoed.thoughts) {
            writeln!(self.out, "💭 Thought {}: {}", i + 1, thought)?;
        }
        self.echoed.thoughts = trace.thoughts().len();

        for action in trace.actions().iter().skip(self.echoed.actions) {
            writeln!(
                self.out,
                "⚙️  [Action {}: {} {}]",
                action.sequence,
                action.name,
                one_line(&action.input.to_string(), 120)
            )?;
        }
        self.echoed.actions = trace.actions().len();

        for observation in trace.observations().iter().skip(self.echoed.observations) {
            // orphaned observations pair with nothing and are not shown
            let Some(action) = trace
                .actions()
                .iter()
                .find(|a| a.sequence == observation.sequence)
            else {
                continue;
            };
            writeln!(
                self.out,
                "📊 [{}: {}]",
                action.name,
                one_line(&observation.content, 200)
            )?;
        }
        self.echoed.observations = trace.observations().len();

        if let Some(answer) = trace.final_answer() {
            if self.echoed.final_answer.as_deref() != Some(answer) {
                writeln!(self.out, "\n✅ {}", answer)?;
                self.echoed.final_answer = Some(answer.to_string());
            }
        }

        for message in turn.step_errors().iter().skip(self.echoed.step_errors) {
            writeln!(self.out, "❌ Error: {}", message)?;
        }
        self.echoed.step_errors = turn.step_errors().len();

        if let TurnStatus::Failed(reason) = turn.status() {
            if !self.echoed.failure {
                writeln!(self.out, "❌ Error: {}", reason)?;
                self.echoed.failure = true;
            }
        }
        Ok(())
    }
}

impl<W: Write + Send> RenderTarget for TerminalTarget<W> {
    fn paint(&mut self, turn: &ChatTurn, html: &str) {
        if let Some(transcript) = self.transcript.as_mut() {
            if let Err(e) = transcript.update(turn, html) {
                tracing::warn!("Failed to write transcript {}: {}", transcript.path().display(), e);
            }
        }

        if self.current != Some(turn.id()) {
            // a repaint of an earlier turn (after /toggle) has nothing new to echo
            if turn.status().is_terminal() {
                return;
            }
            self.current = Some(turn.id());
            self.echoed = Echoed::default();
        }

        if let Err(e) = self.echo(turn) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }

    fn scroll_to_bottom(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!("Failed to flush terminal output: {}", e);
        }
    }
}

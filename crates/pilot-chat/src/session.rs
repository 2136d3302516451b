//! Chat session controller
//!
//! A [`ChatSession`] turns one user message into one [`ChatTurn`]: it opens
//! the response stream, feeds every decoded event into the turn's trace,
//! repaints the bubble after each change and records the outcome in its
//! history.

use std::{collections::HashMap, sync::Arc};

use futures::StreamExt;
use pilot_client::{AgentClient, ChatRequest, Decoded, decode_stream};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    events::SessionEvent,
    handle::SessionHandle,
    render::{ExpansionOverrides, render_bubble},
    transport::{ChatTransport, HttpTransport},
    turn::{ChatTurn, TurnStatus},
};

/// Where rendered bubbles go.
///
/// `paint` receives the complete bubble markup each time, replacing whatever
/// was shown for that turn before.
pub trait RenderTarget: Send {
    fn paint(&mut self, turn: &ChatTurn, html: &str);

    fn scroll_to_bottom(&mut self) {}
}

/// Drives chat turns against a transport and keeps the local history
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    handle: SessionHandle,
    event_tx: broadcast::Sender<SessionEvent>,
    turns: Vec<ChatTurn>,
    overrides: HashMap<Uuid, ExpansionOverrides>,
    hands_free: bool,
}

impl ChatSession {
    /// Create a new session
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self::with_handle(transport, SessionHandle::new())
    }

    /// Create a session sharing an existing handle (and its busy guard)
    pub fn with_handle(transport: Arc<dyn ChatTransport>, handle: SessionHandle) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            transport,
            handle,
            event_tx,
            turns: Vec::new(),
            overrides: HashMap::new(),
            hands_free: false,
        }
    }

    /// Create a session talking to the HTTP chat endpoint
    pub fn http(client: AgentClient) -> Self {
        Self::new(Arc::new(HttpTransport::new(client)))
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn hands_free(&self) -> bool {
        self.hands_free
    }

    /// Sets the `hands_free` flag sent with every following message
    pub fn set_hands_free(&mut self, enabled: bool) {
        self.hands_free = enabled;
    }

    /// Finished turns, oldest first
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn turn(&self, id: Uuid) -> Option<&ChatTurn> {
        self.turns.iter().find(|t| t.id() == id)
    }

    /// Forget the local history. The backend's history is untouched.
    pub fn clear_history(&mut self) {
        self.turns.clear();
        self.overrides.clear();
    }

    /// Current bubble markup for a finished turn
    pub fn render_turn(&self, id: Uuid) -> Result<String> {
        let turn = self.turn(id).ok_or(Error::UnknownTurn(id))?;
        Ok(render_bubble(turn, &self.overrides_for(id)))
    }

    /// Flip an action section of a finished turn and repaint it.
    ///
    /// Returns the new expansion state.
    pub fn toggle_action(
        &mut self,
        turn_id: Uuid,
        sequence: u32,
        target: &mut dyn RenderTarget,
    ) -> Result<bool> {
        let turn = self
            .turns
            .iter()
            .find(|t| t.id() == turn_id)
            .ok_or(Error::UnknownTurn(turn_id))?;
        let latest = turn.trace().current_sequence();
        if sequence == 0 || sequence > latest {
            return Err(Error::UnknownAction { turn_id, sequence });
        }

        let overrides = self.overrides.entry(turn_id).or_default();
        let expanded = overrides.toggle(sequence, latest);
        target.paint(turn, &render_bubble(turn, overrides));
        Ok(expanded)
    }

    /// Send one message and stream the response into `target`.
    ///
    /// Transport failures do not surface as `Err`: they end the turn in
    /// [`TurnStatus::Failed`] and the returned turn carries the reason.
    pub async fn send(&mut self, text: &str, target: &mut dyn RenderTarget) -> Result<&ChatTurn> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }
        let guard = self.handle.try_acquire().ok_or(Error::Busy)?;

        let mut turn = ChatTurn::new(text);
        let turn_id = turn.id();
        self.handle.begin_turn(turn_id);
        self.emit(SessionEvent::TurnStart {
            turn_id,
            message: text.to_string(),
        });

        turn.set_status(TurnStatus::Sending);
        self.paint(&turn, target);

        let request = ChatRequest::new(text, self.hands_free);
        let transport = Arc::clone(&self.transport);
        match transport.open(&request).await {
            Ok(body) => {
                turn.set_status(TurnStatus::Streaming);
                self.emit(SessionEvent::StreamOpen { turn_id });
                self.stream_into(&mut turn, body, target).await;
            }
            Err(e) => {
                tracing::warn!("Turn {} failed to open stream: {}", turn_id, e);
                turn.set_status(TurnStatus::Failed(e.user_message()));
            }
        }

        let overrides = self.handle.end_turn();
        self.paint_with(&turn, &overrides, target);
        if !overrides.is_empty() {
            self.overrides.insert(turn_id, overrides);
        }
        self.emit(SessionEvent::TurnEnd {
            turn_id,
            status: turn.status().clone(),
        });
        drop(guard);

        self.turns.push(turn);
        Ok(&self.turns[self.turns.len() - 1])
    }

    /// Read the body until it ends or breaks, applying each record to `turn`.
    async fn stream_into(
        &self,
        turn: &mut ChatTurn,
        body: pilot_client::ByteStream,
        target: &mut dyn RenderTarget,
    ) {
        let turn_id = turn.id();
        let repaint = Arc::clone(&self.handle.repaint);
        let records = decode_stream(body);
        tokio::pin!(records);

        loop {
            tokio::select! {
                next = records.next() => match next {
                    Some(Ok(Decoded::Event(event))) => {
                        turn.apply(event.clone());
                        let sequence = turn.trace().current_sequence();
                        self.handle.set_latest_sequence(sequence);
                        if let pilot_client::ServerEvent::Error { content } = &event {
                            self.emit(SessionEvent::StepError {
                                turn_id,
                                message: content.clone(),
                            });
                        }
                        self.emit(SessionEvent::TraceUpdated {
                            turn_id,
                            sequence,
                            event,
                        });
                        self.paint(turn, target);
                    }
                    Some(Ok(Decoded::Malformed { reason })) => {
                        turn.record_dropped();
                        self.emit(SessionEvent::RecordDropped { turn_id, reason });
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Turn {} stream broke off: {}", turn_id, e);
                        turn.set_status(TurnStatus::Failed(e.user_message()));
                        break;
                    }
                    None => {
                        turn.set_status(TurnStatus::Completed);
                        break;
                    }
                },
                _ = repaint.notified() => {
                    self.paint(turn, target);
                }
            }
        }
    }

    fn paint(&self, turn: &ChatTurn, target: &mut dyn RenderTarget) {
        self.paint_with(turn, &self.handle.live_overrides(), target);
    }

    fn paint_with(
        &self,
        turn: &ChatTurn,
        overrides: &ExpansionOverrides,
        target: &mut dyn RenderTarget,
    ) {
        target.paint(turn, &render_bubble(turn, overrides));
        target.scroll_to_bottom();
    }

    fn overrides_for(&self, id: Uuid) -> ExpansionOverrides {
        self.overrides.get(&id).cloned().unwrap_or_default()
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use pilot_client::ByteStream;

    /// One scripted response: chunks to deliver, then an optional read error.
    #[derive(Clone)]
    struct Script {
        chunks: Vec<&'static str>,
        read_error: Option<&'static str>,
    }

    struct MockTransport {
        /// `None` makes `open` fail with a 500
        script: Option<Script>,
        requests: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl MockTransport {
        fn streaming(chunks: Vec<&'static str>) -> Self {
            Self {
                script: Some(Script {
                    chunks,
                    read_error: None,
                }),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn breaking(chunks: Vec<&'static str>, error: &'static str) -> Self {
            Self {
                script: Some(Script {
                    chunks,
                    read_error: Some(error),
                }),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn refusing() -> Self {
            Self {
                script: None,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for MockTransport {
        async fn open(&self, request: &ChatRequest) -> pilot_client::Result<ByteStream> {
            self.requests.lock().push(request.clone());
            let Some(script) = self.script.clone() else {
                return Err(pilot_client::Error::api(500, r#"{"error": "agent offline"}"#));
            };
            let stream: ByteStream = Box::pin(async_stream::stream! {
                for chunk in script.chunks {
                    yield Ok(Bytes::from_static(chunk.as_bytes()));
                }
                if let Some(error) = script.read_error {
                    yield Err(pilot_client::Error::Stream(error.to_string()));
                }
            });
            Ok(stream)
        }
    }

    #[derive(Default)]
    struct RecordingTarget {
        paints: Vec<String>,
        scrolls: usize,
    }

    impl RenderTarget for RecordingTarget {
        fn paint(&mut self, _turn: &ChatTurn, html: &str) {
            self.paints.push(html.to_string());
        }

        fn scroll_to_bottom(&mut self) {
            self.scrolls += 1;
        }
    }

    impl RecordingTarget {
        fn last(&self) -> &str {
            self.paints.last().map(String::as_str).unwrap_or_default()
        }
    }

    const EXAMPLE_STREAM: [&str; 5] = [
        "data: {\"type\": \"thought\", \"content\": \"checking inventory\"}\n\n",
        "data: {\"type\": \"action\", \"tool_name\": \"search_kb\", \"tool_input\": {\"q\": \"pricing\"}}\n\n",
        "data: {\"type\": \"observation\", \"content\": \"3 docs found\"}\n\n",
        "data: {\"type\": \"final_answer\", \"content\": \"Price is $20\"}\n\n",
        "data: {\"type\": \"complete\"}\n\n",
    ];

    fn session(transport: MockTransport) -> ChatSession {
        ChatSession::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_example_stream_completes() {
        let mut session = session(MockTransport::streaming(EXAMPLE_STREAM.to_vec()));
        let mut target = RecordingTarget::default();

        let turn = session.send("what does it cost?", &mut target).await.unwrap();
        assert_eq!(turn.status(), &TurnStatus::Completed);
        assert_eq!(turn.trace().final_answer(), Some("Price is $20"));
        assert_eq!(turn.trace().observation_for(1).unwrap().content, "3 docs found");

        // placeholder, one paint per event, final paint
        assert_eq!(target.paints.len(), 6);
        assert_eq!(target.paints[0], crate::render::render_placeholder());
        assert_eq!(target.scrolls, target.paints.len());
        let html = target.last();
        assert!(html.contains(r#"class="expander expanded" data-seq="1""#));
        assert!(html.find("Thought 1:").unwrap() < html.find("Price is $20").unwrap());
    }

    #[tokio::test]
    async fn test_request_carries_hands_free_flag() {
        let transport = Arc::new(MockTransport::streaming(vec![]));
        let mut session = ChatSession::new(transport.clone());
        session.set_hands_free(true);
        session.send("  draft replies  ", &mut RecordingTarget::default()).await.unwrap();

        let requests = transport.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "draft replies");
        assert!(requests[0].hands_free);
    }

    #[tokio::test]
    async fn test_stream_ending_after_action_completes() {
        let mut session = session(MockTransport::streaming(vec![
            "data: {\"type\": \"action\", \"tool_name\": \"send_email\", \"tool_input\": {\"to\": \"a@b.c\"}}\n",
        ]));
        let mut target = RecordingTarget::default();

        let turn = session.send("email them", &mut target).await.unwrap();
        assert_eq!(turn.status(), &TurnStatus::Completed);
        assert_eq!(turn.trace().actions().len(), 1);
        assert!(target.last().contains("Action 1:"));
        assert!(!target.last().contains("Observation:"));
    }

    #[tokio::test]
    async fn test_open_failure_fails_turn_with_one_annotation() {
        let mut session = session(MockTransport::refusing());
        let mut target = RecordingTarget::default();

        let turn = session.send("hello", &mut target).await.unwrap();
        assert_eq!(turn.status(), &TurnStatus::Failed("agent offline".into()));
        assert_eq!(
            target.last(),
            r#"<div class="error-message">❌ Error: agent offline</div>"#
        );
        assert_eq!(target.last().matches("error-message").count(), 1);
        assert_eq!(session.turns().len(), 1);
    }

    #[tokio::test]
    async fn test_read_error_replaces_bubble() {
        let mut session = session(MockTransport::breaking(
            vec!["data: {\"type\": \"thought\", \"content\": \"partial work\"}\n"],
            "connection reset",
        ));
        let mut target = RecordingTarget::default();

        let turn = session.send("hello", &mut target).await.unwrap();
        assert!(matches!(turn.status(), TurnStatus::Failed(_)));
        assert!(target.paints.iter().any(|p| p.contains("partial work")));
        assert!(!target.last().contains("partial work"));
        assert!(target.last().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_error_event_is_not_terminal() {
        let mut session = session(MockTransport::streaming(vec![
            "data: {\"type\": \"error\", \"content\": \"tool timed out\"}\n",
            "data: {\"type\": \"final_answer\", \"content\": \"done anyway\"}\n",
        ]));
        let mut events = session.subscribe();
        let mut target = RecordingTarget::default();

        let turn = session.send("hello", &mut target).await.unwrap();
        assert_eq!(turn.status(), &TurnStatus::Completed);
        assert_eq!(turn.step_errors(), ["tool timed out"]);
        let html = target.last();
        assert!(html.find("done anyway").unwrap() < html.find("tool timed out").unwrap());

        let mut saw_step_error = false;
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::StepError { message, .. } = event {
                assert_eq!(message, "tool timed out");
                saw_step_error = true;
            }
        }
        assert!(saw_step_error);
    }

    #[tokio::test]
    async fn test_malformed_records_are_counted() {
        let mut session = session(MockTransport::streaming(vec![
            "data: {not json}\n",
            "data: {\"type\": \"thought\", \"content\": \"still here\"}\n",
        ]));
        let turn = session.send("hello", &mut RecordingTarget::default()).await.unwrap();
        assert_eq!(turn.dropped_records(), 1);
        assert_eq!(turn.trace().thoughts(), ["still here"]);
        assert_eq!(turn.status(), &TurnStatus::Completed);
    }

    #[tokio::test]
    async fn test_busy_handle_rejects_second_send() {
        let handle = SessionHandle::new();
        let transport: Arc<dyn ChatTransport> = Arc::new(MockTransport::streaming(vec![]));
        let mut session = ChatSession::with_handle(transport, handle.clone());
        let mut target = RecordingTarget::default();

        let _held = handle.try_acquire().unwrap();
        let err = session.send("hello", &mut target).await.unwrap_err();
        assert!(matches!(err, Error::Busy));
        assert!(target.paints.is_empty());
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let mut session = session(MockTransport::streaming(vec![]));
        let err = session.send("   ", &mut RecordingTarget::default()).await.unwrap_err();
        assert!(matches!(err, Error::EmptyMessage));
        assert!(session.turns().is_empty());
        assert!(!session.handle().is_busy());
    }

    #[tokio::test]
    async fn test_toggle_survives_rerender() {
        let mut session = session(MockTransport::streaming(vec![
            "data: {\"type\": \"action\", \"tool_name\": \"first\", \"tool_input\": {}}\n",
            "data: {\"type\": \"action\", \"tool_name\": \"second\", \"tool_input\": {}}\n",
        ]));
        let mut target = RecordingTarget::default();
        let turn_id = session.send("go", &mut target).await.unwrap().id();

        assert!(session.toggle_action(turn_id, 1, &mut target).unwrap());
        assert!(!session.toggle_action(turn_id, 2, &mut target).unwrap());

        let html = session.render_turn(turn_id).unwrap();
        assert_eq!(html, target.last());
        assert!(html.contains(r#"class="expander expanded" data-seq="1""#));
        assert!(html.contains(r#"class="expander" data-seq="2""#));
        assert_eq!(session.render_turn(turn_id).unwrap(), html);

        assert!(matches!(
            session.toggle_action(turn_id, 3, &mut target),
            Err(Error::UnknownAction { sequence: 3, .. })
        ));
        assert!(matches!(
            session.toggle_action(Uuid::new_v4(), 1, &mut target),
            Err(Error::UnknownTurn(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_history_forgets_turns() {
        let mut session = session(MockTransport::streaming(EXAMPLE_STREAM.to_vec()));
        let id = session.send("hi", &mut RecordingTarget::default()).await.unwrap().id();
        assert!(session.turn(id).is_some());

        session.clear_history();
        assert!(session.turns().is_empty());
        assert!(matches!(session.render_turn(id), Err(Error::UnknownTurn(_))));
    }

    /// Paints the bubble and toggles the first action the moment it appears,
    /// the way a UI click would arrive mid-stream.
    struct ClickingTarget {
        handle: SessionHandle,
        clicked: bool,
        paints: Vec<String>,
    }

    impl RenderTarget for ClickingTarget {
        fn paint(&mut self, turn: &ChatTurn, html: &str) {
            self.paints.push(html.to_string());
            if !self.clicked && turn.trace().current_sequence() == 2 {
                self.clicked = true;
                assert_eq!(self.handle.toggle_action(1), Some(true));
            }
        }
    }

    #[tokio::test]
    async fn test_live_toggle_repaints_in_flight_turn() {
        let handle = SessionHandle::new();
        let transport: Arc<dyn ChatTransport> = Arc::new(MockTransport::streaming(vec![
            "data: {\"type\": \"action\", \"tool_name\": \"first\", \"tool_input\": {}}\n",
            "data: {\"type\": \"action\", \"tool_name\": \"second\", \"tool_input\": {}}\n",
        ]));
        let mut session = ChatSession::with_handle(transport, handle.clone());
        let mut target = ClickingTarget {
            handle,
            clicked: false,
            paints: Vec::new(),
        };

        let turn_id = session.send("go", &mut target).await.unwrap().id();
        let last = target.paints.last().unwrap();
        assert!(last.contains(r#"class="expander expanded" data-seq="1""#));
        assert!(last.contains(r#"class="expander expanded" data-seq="2""#));

        // the choice made mid-stream carries over to the finished turn
        assert_eq!(&session.render_turn(turn_id).unwrap(), last);
    }
}

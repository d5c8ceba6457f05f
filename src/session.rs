use crate::client::ChatBackend;
use crate::conversation::{ConversationStore, WireMessage};
use crate::error::{ChatError, ConversationError};
use crate::events::{ChatRole, StreamEvent};
use crate::quick_reply::QuickReply;
use crate::streaming::StreamConsumer;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shown in place of the reply when the backend cannot be reached or the
/// stream breaks
pub const TRANSPORT_ERROR_MESSAGE: &str =
    "I'm sorry, but I encountered an error. Please try again later.";

/// Where the current reply stream is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    /// Request issued, status not known yet
    Sending,
    /// Body chunks are arriving
    Streaming,
}

/// How the last reply stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed,
}

/// What happened to a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank text, nothing changed
    Ignored,
    /// A reply is still streaming
    Busy,
    /// Answered locally from the quick-reply table
    QuickReply(QuickReply),
    /// Sent to the backend, the reply will stream in
    Dispatched,
}

impl SubmitOutcome {
    /// Whether the submission was taken and the input should be cleared
    pub fn accepted(&self) -> bool {
        matches!(self, SubmitOutcome::QuickReply(_) | SubmitOutcome::Dispatched)
    }
}

/// One conversation with the support assistant: owns the store and applies
/// reply streams to it, one at a time
pub struct ChatSession {
    id: Uuid,
    conversation: ConversationStore,
    consumer: StreamConsumer,
    phase: StreamPhase,
    last_outcome: Option<StreamOutcome>,
    stream_rx: Option<mpsc::Receiver<StreamEvent>>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, greeting: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation: ConversationStore::new(greeting),
            consumer: StreamConsumer::new(backend),
            phase: StreamPhase::Idle,
            last_outcome: None,
            stream_rx: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    #[cfg(test)]
    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn last_outcome(&self) -> Option<StreamOutcome> {
        self.last_outcome
    }

    /// A reply is in flight and submissions are rejected
    pub fn is_busy(&self) -> bool {
        self.phase != StreamPhase::Idle
    }

    /// Submit user text. Quick replies are answered locally, anything else
    /// starts a reply stream. Must be called inside a tokio runtime.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        if self.is_busy() {
            debug!(session = %self.id, "submission rejected, reply still streaming");
            return SubmitOutcome::Busy;
        }

        if let Some(reply) = QuickReply::resolve(text) {
            self.conversation.append_user_turn(text);
            self.write(|c| c.resolve_open_turn(reply.reply()));
            info!(session = %self.id, ?reply, "answered from quick replies");
            return SubmitOutcome::QuickReply(reply);
        }

        let mut history = self.conversation.wire_history();
        history.push(WireMessage {
            role: ChatRole::User,
            content: text.to_string(),
        });
        self.conversation.append_user_turn(text);

        info!(session = %self.id, messages = history.len(), "sending conversation");
        self.stream_rx = Some(self.consumer.start(history));
        self.phase = StreamPhase::Sending;
        self.last_outcome = None;
        SubmitOutcome::Dispatched
    }

    /// Apply every stream event that has already arrived without waiting.
    /// Returns whether anything was applied.
    pub fn poll_stream(&mut self) -> bool {
        let Some(rx) = self.stream_rx.as_mut() else {
            return false;
        };

        let mut events = Vec::new();
        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        let changed = !events.is_empty() || disconnected;
        for event in events {
            self.apply(event);
        }
        if disconnected && self.stream_rx.is_some() {
            self.apply(Self::closed_early());
        }
        changed
    }

    /// Wait for the next stream event and apply it. `None` once no stream
    /// is running.
    pub async fn step(&mut self) -> Option<StreamEvent> {
        let rx = self.stream_rx.as_mut()?;
        let event = rx.recv().await.unwrap_or_else(Self::closed_early);
        self.apply(event.clone());
        Some(event)
    }

    /// Apply events until the current stream settles
    pub async fn wait_for_stream(&mut self) {
        while self.step().await.is_some() {}
    }

    /// Replace the conversation with the end notice. A stream still in
    /// flight is detached and its remaining output dropped.
    pub fn end_conversation(&mut self) {
        if self.stream_rx.take().is_some() {
            warn!(session = %self.id, phase = ?self.phase, "ending conversation with a reply in flight");
        }
        self.phase = StreamPhase::Idle;
        self.conversation.reset();
        info!(session = %self.id, "conversation ended");
    }

    fn apply(&mut self, event: StreamEvent) {
        if self.stream_rx.is_none() {
            return;
        }

        match event {
            StreamEvent::Connected => {
                self.phase = StreamPhase::Streaming;
            }
            StreamEvent::Fragment(text) => {
                self.phase = StreamPhase::Streaming;
                self.write(|c| c.append_to_open_turn(&text));
            }
            StreamEvent::Completed => {
                if self.conversation.last().is_some_and(|m| m.content.is_empty()) {
                    debug!(session = %self.id, "backend replied with an empty body");
                }
                self.settle(StreamOutcome::Completed);
            }
            StreamEvent::Failed(reason) => {
                warn!(session = %self.id, %reason, "reply failed");
                self.write(|c| c.resolve_open_turn(TRANSPORT_ERROR_MESSAGE));
                self.settle(StreamOutcome::Failed);
            }
        }
    }

    fn settle(&mut self, outcome: StreamOutcome) {
        info!(session = %self.id, ?outcome, "reply settled");
        self.stream_rx = None;
        self.phase = StreamPhase::Idle;
        self.last_outcome = Some(outcome);
    }

    fn write(&mut self, op: impl FnOnce(&mut ConversationStore) -> Result<(), ConversationError>) {
        if let Err(err) = op(&mut self.conversation) {
            error!(session = %self.id, error = %err, "conversation update rejected");
        }
    }

    fn closed_early() -> StreamEvent {
        let err = ChatError::Interrupted("stream closed without a result".to_string());
        StreamEvent::Failed(err.to_string())
    }
}

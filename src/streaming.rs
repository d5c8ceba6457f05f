use crate::client::ChatBackend;
use crate::conversation::WireMessage;
use crate::decoder::Utf8StreamDecoder;
use crate::error::ChatError;
use crate::events::StreamEvent;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Drives one request/response cycle and reports it as `StreamEvent`s.
///
/// Every stream ends with exactly one `Completed` or `Failed`, unless the
/// receiver is dropped first.
#[derive(Clone)]
pub struct StreamConsumer {
    backend: Arc<dyn ChatBackend>,
}

impl StreamConsumer {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Spawn the request on the runtime and hand back the event receiver
    pub fn start(&self, history: Vec<WireMessage>) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(1000);
        let backend = Arc::clone(&self.backend);

        tokio::spawn(async move {
            Self::run(backend.as_ref(), history, tx).await;
        });

        rx
    }

    /// Run the cycle to its end on the current task
    pub async fn run(
        backend: &dyn ChatBackend,
        history: Vec<WireMessage>,
        tx: mpsc::Sender<StreamEvent>,
    ) {
        let terminal = match Self::pump(backend, history, &tx).await {
            Ok(()) => StreamEvent::Completed,
            Err(err) => {
                warn!(error = %err, "reply stream failed");
                StreamEvent::Failed(err.to_string())
            }
        };
        let _ = tx.send(terminal).await;
    }

    async fn pump(
        backend: &dyn ChatBackend,
        history: Vec<WireMessage>,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<(), ChatError> {
        let mut body = backend.open_reply(history).await?;

        if tx.send(StreamEvent::Connected).await.is_err() {
            return Ok(());
        }

        let mut decoder = Utf8StreamDecoder::new();
        let mut received = 0usize;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            received += chunk.len();

            let text = decoder.decode(&chunk);
            if !text.is_empty() && tx.send(StreamEvent::Fragment(text)).await.is_err() {
                debug!("reply receiver dropped, abandoning stream");
                return Ok(());
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            let _ = tx.send(StreamEvent::Fragment(tail)).await;
        }

        debug!(bytes = received, "reply stream finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{Script, ScriptedBackend};

    async fn collect(backend: ScriptedBackend) -> Vec<StreamEvent> {
        let consumer = StreamConsumer::new(Arc::new(backend));
        let mut rx = consumer.start(Vec::new());
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn text_of(events: &[StreamEvent]) -> String {
        events
            .iter()
            .filter_map(|event| match event {
                StreamEvent::Fragment(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn successful_stream_emits_fragments_in_order() {
        let events = collect(ScriptedBackend::new(vec![Script::text(&[
            "Hel", "lo, ", "world",
        ])]))
        .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Connected,
                StreamEvent::Fragment("Hel".to_string()),
                StreamEvent::Fragment("lo, ".to_string()),
                StreamEvent::Fragment("world".to_string()),
                StreamEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn split_multibyte_characters_are_reassembled() {
        let bytes = "Привет, мир".as_bytes().to_vec();
        let chunks = bytes.chunks(3).map(|c| Ok(c.to_vec())).collect();

        let events = collect(ScriptedBackend::new(vec![Script::Reply(chunks)])).await;

        assert_eq!(text_of(&events), "Привет, мир");
        assert!(
            events
                .iter()
                .all(|e| !matches!(e, StreamEvent::Fragment(t) if t.contains('\u{FFFD}')))
        );
        assert_eq!(events.last(), Some(&StreamEvent::Completed));
    }

    #[tokio::test]
    async fn body_error_ends_with_failure() {
        let events = collect(ScriptedBackend::new(vec![Script::Reply(vec![
            Ok(b"Hel".to_vec()),
            Err("connection reset".to_string()),
            Ok(b"never".to_vec()),
        ])]))
        .await;

        assert_eq!(events[0], StreamEvent::Connected);
        assert_eq!(events[1], StreamEvent::Fragment("Hel".to_string()));
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[2],
            StreamEvent::Failed("reply interrupted: connection reset".to_string())
        );
    }

    #[tokio::test]
    async fn refused_request_fails_before_connecting() {
        let events = collect(ScriptedBackend::new(vec![Script::Refuse(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        )]))
        .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::Failed(reason) if reason.contains("500")));
    }

    #[tokio::test]
    async fn empty_body_completes_without_fragments() {
        let events = collect(ScriptedBackend::new(vec![Script::Reply(Vec::new())])).await;
        assert_eq!(events, vec![StreamEvent::Connected, StreamEvent::Completed]);
    }
}

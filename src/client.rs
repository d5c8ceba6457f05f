use crate::config::Config;
use crate::conversation::WireMessage;
use crate::error::ChatError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio::time::Duration;
use tracing::debug;

/// Raw response body, chunked however the transport delivers it
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ChatError>>;

/// A chat backend that answers a conversation with a streamed reply
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the conversation and return the reply body once the backend has
    /// accepted the request
    async fn open_reply(&self, history: Vec<WireMessage>) -> Result<ByteStream, ChatError>;
}

/// Backend reached over HTTP: `POST` the history as a JSON array, read the
/// body as unframed text
#[derive(Clone)]
pub struct HttpChatBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpChatBackend {
    pub fn new(config: &Config) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ChatError::Request)?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn open_reply(&self, history: Vec<WireMessage>) -> Result<ByteStream, ChatError> {
        debug!(endpoint = %self.endpoint, messages = history.len(), "posting conversation");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&history)
            .send()
            .await
            .map_err(ChatError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ChatError::Body))
            .boxed())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One scripted answer
    pub enum Script {
        /// Accept and deliver these chunks; `Err` entries fail the body read
        Reply(Vec<Result<Vec<u8>, String>>),
        /// Refuse the request with a non-success status
        Refuse(reqwest::StatusCode),
    }

    impl Script {
        pub fn text(chunks: &[&str]) -> Script {
            Script::Reply(chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect())
        }
    }

    /// Backend that plays back scripted replies and records every request
    #[derive(Default)]
    pub struct ScriptedBackend {
        scripts: Mutex<VecDeque<Script>>,
        requests: Mutex<Vec<Vec<WireMessage>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        pub fn new(scripts: Vec<Script>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<Vec<WireMessage>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn open_reply(&self, history: Vec<WireMessage>) -> Result<ByteStream, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(history);

            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Script::Reply(Vec::new()));

            match script {
                Script::Refuse(status) => Err(ChatError::Status(status)),
                Script::Reply(chunks) => Ok(futures::stream::iter(
                    chunks
                        .into_iter()
                        .map(|chunk| chunk.map_err(ChatError::Interrupted)),
                )
                .boxed()),
            }
        }
    }
}

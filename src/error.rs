use thiserror::Error;

/// Transport failures talking to the chat backend
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("chat backend returned {0}")]
    Status(reqwest::StatusCode),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("reading response body failed: {0}")]
    Body(#[source] reqwest::Error),

    #[error("reply interrupted: {0}")]
    Interrupted(String),
}

/// Misuse of the conversation store by its caller
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConversationError {
    #[error("no open assistant turn to write to")]
    NoOpenTurn,
}

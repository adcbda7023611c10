use std::fmt;

/// Backend endpoint a request was sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Chat,
    Evaluate,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Chat => "/rag_chat",
            Endpoint::Evaluate => "/evaluate",
        }
    }

    /// Fixed text shown to the user when this endpoint cannot be reached
    pub fn unavailable_message(self) -> &'static str {
        match self {
            Endpoint::Chat => "Error: Could not connect to the chat service.",
            Endpoint::Evaluate => "Error: Could not connect to the evaluation service.",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Failure talking to the RAG backend. Every variant is "service
/// unavailable" from the user's point of view.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: Endpoint,
        status: reqwest::StatusCode,
    },

    #[error("{endpoint} returned a malformed body: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} task aborted: {reason}")]
    Aborted { endpoint: Endpoint, reason: String },
}

impl Error {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Error::Transport { endpoint, .. }
            | Error::Status { endpoint, .. }
            | Error::Decode { endpoint, .. }
            | Error::Aborted { endpoint, .. } => *endpoint,
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.endpoint().unavailable_message()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

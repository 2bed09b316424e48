use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server responded with status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// 2xx response that did not carry the expected result field.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Message supplied by the server in an error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// The remote playground service.
///
/// Every method performs exactly one round-trip. Result strings are returned
/// as sent by the server (the image URL stays relative).
#[async_trait]
pub trait PlaygroundApi: Send + Sync {
    async fn probe(&self) -> Result<String, ApiError>;
    async fn login(&self, username: &str, password: &str) -> Result<(), ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn generate_text(&self, prompt: &str) -> Result<String, ApiError>;
    async fn generate_image(&self, prompt: &str) -> Result<String, ApiError>;
    async fn chat(&self, message: &str) -> Result<String, ApiError>;
}

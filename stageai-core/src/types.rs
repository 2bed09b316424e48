use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum AuthStatus {
    #[default]
    Idle,
    LoggedIn,
    LoggedOut,
    Error {
        message: String,
    },
}

impl AuthStatus {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn)
    }

    /// Text shown under the login controls. `Idle` shows nothing.
    pub fn display_message(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::LoggedIn => Some(crate::text::MSG_LOGGED_IN),
            Self::LoggedOut => Some(crate::text::MSG_LOGGED_OUT),
            Self::Error { message } => Some(message.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Text,
    Image,
    Chat,
}

impl OperationKind {
    /// JSON field carrying the user input in the request body.
    pub fn request_field(self) -> &'static str {
        match self {
            Self::Text | Self::Image => "prompt",
            Self::Chat => "message",
        }
    }

    /// JSON field expected in a successful response body.
    pub fn result_field(self) -> &'static str {
        match self {
            Self::Text => "generated_text",
            Self::Image => "image_url",
            Self::Chat => "reply",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Chat => "chat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Terminal state of one generation slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum SlotResult {
    Ready(String),
    Failed(String),
}

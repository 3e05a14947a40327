//! UI-agnostic data model
//!
//! These types are shared by every front-end and don't depend on any
//! specific UI framework.

use serde::{Deserialize, Serialize};

/// A message in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub kind: MessageKind,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            kind: MessageKind::Normal,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            kind: MessageKind::Normal,
        }
    }

    /// Assistant message carrying an error reported by the backend
    pub fn backend_error(error: &str) -> Self {
        Self {
            role: Role::Assistant,
            text: format!("Error: {}", error),
            kind: MessageKind::Error,
        }
    }

    /// Assistant message for a request that never produced a usable body
    pub fn failure(notice: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: notice.into(),
            kind: MessageKind::Failure,
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.kind != MessageKind::Normal
    }
}

/// The role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageKind {
    #[default]
    Normal,
    /// The backend answered with an `error` field
    Error,
    /// Transport failure, undecodable body, or timeout
    Failure,
}

/// Structured output shown in the output pane
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    pub code: String,
    pub narration: String,
    pub video_url: Option<String>,
}

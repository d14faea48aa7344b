use crate::models::chat::{ ChatMessage, MessageId };
use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub text: String,
}

/// Everything the presentation layer needs to re-render, in the order the
/// session produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    MessageAdded(ChatMessage),
    ContentAppended {
        id: MessageId,
        chunk: String,
    },
    /// Final state of an assistant message once its request settled.
    StreamFinished(ChatMessage),
    MessageRemoved {
        id: MessageId,
    },
    ConversationCleared,
    LoadingChanged(bool),
    ThemeChanged(Theme),
    Toast(Toast),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Sending,
    Streaming,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    EmptyQuery,
    Busy,
}

/// How a `send_query` call settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Skipped(SkipReason),
    /// `done` arrived, or the body ended without a terminal event.
    Completed,
    /// The backend sent an `error` event.
    Errored(String),
    /// The request was rejected or the body broke off; the reply was removed.
    ConnectionFailed(String),
    Cancelled,
}

pub mod lines;

use crate::error::ClientError;
use crate::models::chat::{ Conversation, MessageId };
use crate::models::events::StreamEvent;
use futures::{ stream, Stream, StreamExt };
use log::{ debug, warn };
use std::collections::VecDeque;
use std::pin::Pin;

pub use lines::LineBuffer;

/// Raw response body, chunked however the transport delivers it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ClientError>> + Send>>;

pub(crate) const GENERIC_STREAM_ERROR: &str = "An error occurred while generating the response.";

/// Parses one line of the chat body. Blank lines and lines that are not a
/// JSON event yield `None`.
pub fn parse_line(line: &str) -> Option<StreamEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamEvent>(line) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Skipping malformed stream line ({}): {}", e, line);
            None
        }
    }
}

struct DecodeState {
    body: ByteStream,
    lines: LineBuffer,
    ready: VecDeque<StreamEvent>,
    finished: bool,
}

impl DecodeState {
    fn queue(&mut self, line: &str) {
        if let Some(event) = parse_line(line) {
            self.ready.push_back(event);
        }
    }
}

/// Turns a response body into the ordered sequence of events it carries.
///
/// A transport error is yielded once and ends the sequence. Events already
/// decoded before the error are delivered first.
pub fn decode_events(body: ByteStream) -> impl Stream<Item = Result<StreamEvent, ClientError>> + Send {
    let state = DecodeState {
        body,
        lines: LineBuffer::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for line in state.lines.push(&chunk) {
                        state.queue(&line);
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    if let Some(tail) = state.lines.finish() {
                        state.queue(&tail);
                    }
                }
            }
        }
    })
}

/// What the consumer should do after an event has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Content changed (or nothing happened); keep reading.
    Continue { appended: Option<String> },
    /// `done` received; the target message is finished.
    Completed,
    /// `error` received; carries the text to show the user.
    Failed(String),
}

/// Applies one event to the message `target`. Updates for a message that no
/// longer exists are dropped.
pub fn apply_event(conversation: &mut Conversation, target: &MessageId, event: StreamEvent) -> Dispatch {
    match event {
        StreamEvent::FinalSummaryChunk { content } => {
            if conversation.append_content(target, &content) {
                Dispatch::Continue { appended: Some(content) }
            } else {
                debug!("Dropping chunk for message {} that is no longer streaming", target);
                Dispatch::Continue { appended: None }
            }
        }
        StreamEvent::Done { content } => {
            conversation.finish_streaming(target, content.as_deref());
            Dispatch::Completed
        }
        StreamEvent::Error { message, content } => {
            conversation.finish_streaming(target, None);
            let text = message
                .or(content)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_STREAM_ERROR.to_string());
            Dispatch::Failed(text)
        }
        StreamEvent::Unknown => {
            debug!("Ignoring stream event with unrecognised type");
            Dispatch::Continue { appended: None }
        }
    }
}

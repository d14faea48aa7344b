pub mod events;

use crate::backend::{ ClaimsBackend, UploadFile };
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::chat::{ ChatMessage, Conversation, MessageId };
use crate::stream::{ apply_event, decode_events, Dispatch };
use futures::StreamExt;
use log::{ debug, error, info, warn };
use std::sync::Arc;
use tokio::sync::{ broadcast, Mutex };
use tokio_util::sync::CancellationToken;

pub use events::{ RequestPhase, SendOutcome, SessionEvent, SkipReason, Theme, Toast, ToastLevel };

const DEFAULT_EVENT_BUFFER: usize = 256;
const CONNECTION_ERROR: &str = "Connection error: could not reach the claims assistant.";
const UPLOAD_FAILED: &str = "File upload failed. Please try again.";
const CLEAR_DONE: &str = "All stored claims data has been cleared.";
const CLEAR_FAILED: &str = "Failed to clear stored data.";
const CHAT_CLEARED: &str = "Chat cleared.";

struct ActiveStream {
    target: MessageId,
    cancel: CancellationToken,
}

struct SessionState {
    conversation: Conversation,
    input: String,
    loading: bool,
    phase: RequestPhase,
    theme: Theme,
    active: Option<ActiveStream>,
}

/// Owns the conversation and the single in-flight query, and turns user
/// actions into backend calls. Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct SessionController {
    backend: Arc<dyn ClaimsBackend>,
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn ClaimsBackend>) -> Self {
        Self::build(backend, Theme::Light, DEFAULT_EVENT_BUFFER)
    }

    pub fn from_config(backend: Arc<dyn ClaimsBackend>, config: &ClientConfig) -> Self {
        let theme = if config.dark_mode { Theme::Dark } else { Theme::Light };
        Self::build(backend, theme, config.event_buffer)
    }

    fn build(backend: Arc<dyn ClaimsBackend>, theme: Theme, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        let state = SessionState {
            conversation: Conversation::new(),
            input: String::new(),
            loading: false,
            phase: RequestPhase::Idle,
            theme,
            active: None,
        };
        Self {
            backend,
            state: Arc::new(Mutex::new(state)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the state is still authoritative.
        let _ = self.events.send(event);
    }

    fn toast(&self, level: ToastLevel, text: impl Into<String>) {
        self.emit(SessionEvent::Toast(Toast { level, text: text.into() }));
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.conversation.messages().to_vec()
    }

    pub async fn message(&self, id: &MessageId) -> Option<ChatMessage> {
        self.state.lock().await.conversation.get(id).cloned()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    pub async fn phase(&self) -> RequestPhase {
        self.state.lock().await.phase
    }

    pub async fn theme(&self) -> Theme {
        self.state.lock().await.theme
    }

    pub async fn input(&self) -> String {
        self.state.lock().await.input.clone()
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.state.lock().await.input = text.into();
    }

    /// Sends whatever is in the input buffer.
    pub async fn submit_input(&self) -> SendOutcome {
        let text = self.input().await;
        self.send_query(&text).await
    }

    /// Sends one question and streams the answer into the conversation.
    ///
    /// Blank text, or a call while another query is in flight, changes
    /// nothing and never reaches the backend.
    pub async fn send_query(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            debug!("Ignoring empty query");
            return SendOutcome::Skipped(SkipReason::EmptyQuery);
        }

        let (target, cancel, added) = {
            let mut state = self.state.lock().await;
            if state.loading {
                debug!("Query already in flight, ignoring new send");
                return SendOutcome::Skipped(SkipReason::Busy);
            }
            let question = ChatMessage::user(text);
            let reply = ChatMessage::assistant_placeholder();
            let target = reply.id;
            state.conversation.push(question.clone());
            state.conversation.push(reply.clone());
            state.input.clear();
            state.loading = true;
            state.phase = RequestPhase::Sending;
            let cancel = CancellationToken::new();
            state.active = Some(ActiveStream { target, cancel: cancel.clone() });
            (target, cancel, [question, reply])
        };

        for message in added {
            self.emit(SessionEvent::MessageAdded(message));
        }
        self.emit(SessionEvent::LoadingChanged(true));

        let outcome = self.run_query(text, target, &cancel).await;
        self.settle(target, &outcome).await;
        outcome
    }

    async fn run_query(&self, text: &str, target: MessageId, cancel: &CancellationToken) -> SendOutcome {
        info!("Sending query for reply {}", target);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return SendOutcome::Cancelled,
            response = self.backend.send_query(text) => response,
        };
        let body = match response {
            Ok(body) => body,
            Err(e) => return self.connection_failed(target, e).await,
        };

        self.state.lock().await.phase = RequestPhase::Streaming;
        let events = decode_events(body);
        futures::pin_mut!(events);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Stream for reply {} cancelled", target);
                    return SendOutcome::Cancelled;
                }
                next = events.next() => next,
            };

            let event = match next {
                None => {
                    debug!("Stream for reply {} ended without a terminal event", target);
                    return SendOutcome::Completed;
                }
                Some(Err(e)) => return self.connection_failed(target, e).await,
                Some(Ok(event)) => event,
            };

            let dispatch = {
                let mut state = self.state.lock().await;
                apply_event(&mut state.conversation, &target, event)
            };
            match dispatch {
                Dispatch::Continue { appended: Some(chunk) } => {
                    self.emit(SessionEvent::ContentAppended { id: target, chunk });
                }
                Dispatch::Continue { appended: None } => {}
                Dispatch::Completed => return SendOutcome::Completed,
                Dispatch::Failed(text) => {
                    warn!("Backend reported an error for reply {}: {}", target, text);
                    self.toast(ToastLevel::Error, text.clone());
                    return SendOutcome::Errored(text);
                }
            }
        }
    }

    async fn connection_failed(&self, target: MessageId, e: ClientError) -> SendOutcome {
        error!("Chat request failed: {}", e);
        let removed = self.state.lock().await.conversation.remove(&target).is_some();
        if removed {
            self.emit(SessionEvent::MessageRemoved { id: target });
        }
        self.toast(ToastLevel::Error, CONNECTION_ERROR);
        SendOutcome::ConnectionFailed(e.to_string())
    }

    /// Returns to idle whatever the outcome was.
    async fn settle(&self, target: MessageId, outcome: &SendOutcome) {
        let finished = {
            let mut state = self.state.lock().await;
            state.conversation.finish_streaming(&target, None);
            state.loading = false;
            state.phase = RequestPhase::Idle;
            state.active = None;
            state.conversation.get(&target).cloned()
        };

        if let Some(message) = finished {
            self.emit(SessionEvent::StreamFinished(message));
        }
        self.emit(SessionEvent::LoadingChanged(false));
        debug!("Reply {} settled: {:?}", target, outcome);
    }

    /// Cancels the in-flight query, keeping what has streamed so far.
    pub async fn stop_generating(&self) -> bool {
        let state = self.state.lock().await;
        match &state.active {
            Some(active) => {
                info!("Stopping reply {}", active.target);
                active.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Empties the conversation and abandons any in-flight stream.
    pub async fn reset_chat(&self) {
        {
            let mut state = self.state.lock().await;
            state.conversation.clear();
            if let Some(active) = &state.active {
                active.cancel.cancel();
            }
        }
        self.emit(SessionEvent::ConversationCleared);
        self.toast(ToastLevel::Info, CHAT_CLEARED);
    }

    pub async fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut state = self.state.lock().await;
            state.theme = state.theme.toggled();
            state.theme
        };
        self.emit(SessionEvent::ThemeChanged(theme));
        theme
    }

    /// Uploads all files in one request. Returns false when nothing was
    /// uploaded.
    pub async fn upload_files(&self, files: Vec<UploadFile>) -> bool {
        if files.is_empty() {
            return false;
        }
        let count = files.len();
        info!("Uploading {} file(s)", count);

        match self.backend.upload_files(files).await {
            Ok(reply) => {
                let noun = if count == 1 { "file" } else { "files" };
                self.toast(ToastLevel::Success, format!("Uploaded {} {}.", count, noun));
                if let Some(message) = reply.message.filter(|m| !m.is_empty()) {
                    self.toast(ToastLevel::Info, message);
                }
                true
            }
            Err(e) => {
                error!("Upload failed: {}", e);
                self.toast(ToastLevel::Error, UPLOAD_FAILED);
                false
            }
        }
    }

    /// Purges all claims data stored on the backend.
    pub async fn clear_data(&self) -> bool {
        match self.backend.clear_data().await {
            Ok(reply) => {
                let text = reply.message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| CLEAR_DONE.to_string());
                info!("Backend data cleared: {}", text);
                self.toast(ToastLevel::Success, text);
                true
            }
            Err(e) => {
                error!("Clearing backend data failed: {}", e);
                self.toast(ToastLevel::Error, CLEAR_FAILED);
                false
            }
        }
    }

    pub async fn check_health(&self) -> bool {
        match self.backend.health().await {
            Ok(true) => {
                self.toast(ToastLevel::Success, "Backend is up.");
                true
            }
            Ok(false) => {
                self.toast(ToastLevel::Error, "Backend responded but is not healthy.");
                false
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                self.toast(ToastLevel::Error, CONNECTION_ERROR);
                false
            }
        }
    }
}

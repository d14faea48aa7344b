use crate::models::chat::{ ChatMessage, MessageId, Role };
use crate::session::{ SessionEvent, Theme, ToastLevel };
use log::warn;
use std::io::{ self, Write };
use tokio::sync::broadcast::{ self, error::RecvError };

const RESET: &str = "\x1b[0m";

struct Palette {
    assistant: &'static str,
    success: &'static str,
    info: &'static str,
    error: &'static str,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            assistant: "\x1b[34m",
            success: "\x1b[32m",
            info: "\x1b[36m",
            error: "\x1b[31m",
        },
        Theme::Dark => Palette {
            assistant: "\x1b[94m",
            success: "\x1b[92m",
            info: "\x1b[96m",
            error: "\x1b[91m",
        },
    }
}

/// Writes session events as plain terminal text.
pub struct Renderer<W: Write> {
    out: W,
    theme: Theme,
    streamed: Option<MessageId>,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self { out, theme, streamed: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, event: &SessionEvent) -> io::Result<()> {
        let colors = palette(self.theme);
        match event {
            SessionEvent::MessageAdded(message) if message.role == Role::Assistant => {
                write!(self.out, "{}assistant>{} ", colors.assistant, RESET)?;
            }
            SessionEvent::MessageAdded(_) => {}
            SessionEvent::ContentAppended { id, chunk } => {
                self.streamed = Some(*id);
                write!(self.out, "{}", chunk)?;
            }
            SessionEvent::StreamFinished(message) => self.finish(message)?,
            SessionEvent::MessageRemoved { .. } => {
                writeln!(self.out, "(no reply)")?;
            }
            SessionEvent::ConversationCleared => {
                self.streamed = None;
                writeln!(self.out, "--- conversation cleared ---")?;
            }
            SessionEvent::LoadingChanged(_) => {}
            SessionEvent::ThemeChanged(theme) => {
                self.theme = *theme;
                writeln!(self.out, "theme: {}", theme)?;
            }
            SessionEvent::Toast(toast) => {
                let (color, label) = match toast.level {
                    ToastLevel::Success => (colors.success, "ok"),
                    ToastLevel::Info => (colors.info, "info"),
                    ToastLevel::Error => (colors.error, "error"),
                };
                writeln!(self.out, "{}[{}]{} {}", color, label, RESET, toast.text)?;
            }
        }
        self.out.flush()
    }

    fn finish(&mut self, message: &ChatMessage) -> io::Result<()> {
        // Content that arrived only with `done` was never printed.
        if self.streamed != Some(message.id) {
            write!(self.out, "{}", message.content)?;
        }
        self.streamed = None;
        match message.display_timestamp() {
            Some(at) => writeln!(self.out, "  ({})", at.with_timezone(&chrono::Local).format("%H:%M")),
            None => writeln!(self.out),
        }
    }
}

pub async fn render_events(mut rx: broadcast::Receiver<SessionEvent>, theme: Theme) {
    let mut renderer = Renderer::new(io::stdout(), theme);
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Err(e) = renderer.render(&event) {
                    warn!("Failed to write to terminal: {}", e);
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Console fell behind, {} session events skipped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

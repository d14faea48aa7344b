use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Backend Args ---
    /// Base URL of the claims assistant backend (e.g., http://localhost:8000)
    #[arg(long, env = "BACKEND_URL", default_value = "http://localhost:8000")]
    pub backend_url: String,

    /// Seconds to wait for a TCP connection to the backend.
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "10")]
    pub connect_timeout_secs: u64,

    /// Overall timeout in seconds for upload, clear and health requests.
    /// Chat streams are not bounded by it.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "120")]
    pub request_timeout_secs: u64,

    // --- Session Args ---
    /// Start with the dark theme.
    #[arg(long, env = "DARK_MODE", default_value = "false")]
    pub dark_mode: bool,

    /// Capacity of the session event channel feeding the console.
    #[arg(long, env = "EVENT_BUFFER", default_value = "256")]
    pub event_buffer: usize,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

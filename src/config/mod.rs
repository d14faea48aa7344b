use crate::cli::Args;
use crate::error::ClientError;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub dark_mode: bool,
    pub event_buffer: usize,
}

impl ClientConfig {
    pub fn new(backend_url: Url) -> Self {
        Self {
            backend_url,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            dark_mode: false,
            event_buffer: 256,
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, ClientError> {
        Ok(Self {
            backend_url: parse_base_url(&args.backend_url)?,
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            dark_mode: args.dark_mode,
            event_buffer: args.event_buffer.max(1),
        })
    }
}

/// Parses a base URL so that `Url::join("api/chat")` keeps any path prefix,
/// e.g. `https://host/claims` becomes `https://host/claims/`.
pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_prefix() {
        let url = parse_base_url("https://claims.example.com/assistant").unwrap();
        assert_eq!(url.join("api/chat").unwrap().as_str(), "https://claims.example.com/assistant/api/chat");

        let root = parse_base_url("http://localhost:8000").unwrap();
        assert_eq!(root.join("api/data/clear").unwrap().as_str(), "http://localhost:8000/api/data/clear");
    }

    #[test]
    fn rejects_garbage_url() {
        assert!(matches!(parse_base_url("not a url"), Err(ClientError::InvalidUrl(_))));
    }
}

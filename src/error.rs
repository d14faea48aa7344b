use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}{}", body_suffix(.body))]
    Status {
        status: reqwest::StatusCode,
        body: Option<String>,
    },

    #[error("failed to read upload file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(text) if !text.is_empty() => format!(": {}", text),
        _ => String::new(),
    }
}

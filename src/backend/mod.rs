pub mod http;

use async_trait::async_trait;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::events::StatusReply;
use crate::stream::ByteStream;
use std::path::Path;
use std::sync::Arc;

use self::http::HttpBackend;

/// A CSV file queued for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// The three operations the claims backend offers the chat client, plus a
/// liveness probe.
#[async_trait]
pub trait ClaimsBackend: Send + Sync {
    /// Issues a query and returns the raw response body. A non-success status
    /// is an error; the body is not inspected here.
    async fn send_query(&self, query: &str) -> Result<ByteStream, ClientError>;

    async fn upload_files(&self, files: Vec<UploadFile>) -> Result<StatusReply, ClientError>;

    async fn clear_data(&self) -> Result<StatusReply, ClientError>;

    async fn health(&self) -> Result<bool, ClientError>;
}

pub fn new_backend(config: &ClientConfig) -> Result<Arc<dyn ClaimsBackend>, ClientError> {
    let backend = HttpBackend::from_config(config)?;
    Ok(Arc::new(backend))
}

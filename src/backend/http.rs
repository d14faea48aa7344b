use async_trait::async_trait;
use futures::{ StreamExt, TryStreamExt };
use log::{ debug, info };
use reqwest::multipart::{ Form, Part };
use reqwest::{ Client as HttpClient, Response };
use std::time::Duration;
use url::Url;

use super::{ ClaimsBackend, UploadFile };
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::events::{ ChatQuery, HealthReply, StatusReply };
use crate::stream::ByteStream;

const CHAT_ROUTE: &str = "api/chat";
const UPLOAD_ROUTE: &str = "api/upload";
const CLEAR_ROUTE: &str = "api/data/clear";
const CSV_MIME: &str = "text/csv";

#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: HttpClient,
    base_url: Url,
    request_timeout: Duration,
}

impl HttpBackend {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = HttpClient::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.backend_url.clone(),
            request_timeout: config.request_timeout,
        })
    }

    fn endpoint(&self, route: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(route)?)
    }
}

/// Fails on non-success statuses, keeping the body text for the log.
async fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.ok().filter(|b| !b.is_empty());
    Err(ClientError::Status { status, body })
}

/// Reads an optional `{ "message": ... }` body; anything else counts as empty.
async fn status_reply(resp: Response) -> StatusReply {
    match resp.bytes().await {
        Ok(body) => serde_json::from_slice(&body).unwrap_or_default(),
        Err(e) => {
            debug!("Ignoring unreadable reply body: {}", e);
            StatusReply::default()
        }
    }
}

#[async_trait]
impl ClaimsBackend for HttpBackend {
    async fn send_query(&self, query: &str) -> Result<ByteStream, ClientError> {
        let url = self.endpoint(CHAT_ROUTE)?;
        info!("POST {} ({} chars)", url, query.len());

        let req = ChatQuery { query: query.to_string() };
        let resp = self.http.post(url).json(&req).send().await?;
        let resp = check_status(resp).await?;

        let body = resp
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(ClientError::from);
        Ok(body.boxed())
    }

    async fn upload_files(&self, files: Vec<UploadFile>) -> Result<StatusReply, ClientError> {
        let url = self.endpoint(UPLOAD_ROUTE)?;
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes).file_name(file.name).mime_str(CSV_MIME)?;
            form = form.part("files", part);
        }

        let resp = self.http
            .post(url)
            .timeout(self.request_timeout)
            .multipart(form)
            .send().await?;
        let resp = check_status(resp).await?;
        Ok(status_reply(resp).await)
    }

    async fn clear_data(&self) -> Result<StatusReply, ClientError> {
        let url = self.endpoint(CLEAR_ROUTE)?;
        let resp = self.http.post(url).timeout(self.request_timeout).send().await?;
        let resp = check_status(resp).await?;
        Ok(status_reply(resp).await)
    }

    async fn health(&self) -> Result<bool, ClientError> {
        let resp = self.http
            .get(self.base_url.clone())
            .timeout(self.request_timeout)
            .send().await?;
        let resp = check_status(resp).await?;
        let body = resp.bytes().await?;
        let reply: HealthReply = serde_json::from_slice(&body)?;
        Ok(reply.status.eq_ignore_ascii_case("ok"))
    }
}

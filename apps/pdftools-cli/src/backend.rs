//! Transport to the processing server

use async_trait::async_trait;
use pdftools_core::{FormPart, TransferOutcome, TransferRequest};
use reqwest::multipart::{Form, Part};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Performs one multipart POST and reports what happened.
///
/// Timeouts are not the backend's concern; the runner enforces them.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, request: TransferRequest<PathBuf>) -> TransferOutcome;
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// reqwest-based backend talking to a real server
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn form(&self, request: TransferRequest<PathBuf>) -> Result<Form, BackendError> {
        let mut form = Form::new();
        for part in request.parts {
            form = match part {
                FormPart::File { field, file } => {
                    let bytes =
                        tokio::fs::read(&file.handle)
                            .await
                            .map_err(|source| BackendError::Read {
                                path: file.handle.clone(),
                                source,
                            })?;
                    let part = Part::bytes(bytes)
                        .file_name(file.name)
                        .mime_str(&file.mime_type)?;
                    form.part(field, part)
                }
                FormPart::Text { field, value } => form.text(field, value),
            };
        }
        Ok(form)
    }

    async fn post(&self, request: TransferRequest<PathBuf>) -> Result<(u16, Vec<u8>), BackendError> {
        let url = format!("{}{}", self.base_url, request.path());
        debug!(%url, parts = request.parts.len(), "POST");

        let form = self.form(request).await?;
        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send(&self, request: TransferRequest<PathBuf>) -> TransferOutcome {
        match self.post(request).await {
            Ok((status, body)) => TransferOutcome::Response { status, body },
            Err(e) => TransferOutcome::NetworkFailure(e.to_string()),
        }
    }
}

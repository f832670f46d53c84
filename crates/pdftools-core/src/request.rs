//! Multipart request model and response interpretation
//!
//! Drivers turn a [`TransferRequest`] into a real HTTP call (browser
//! `FormData` or a reqwest multipart form) and report back a
//! [`TransferOutcome`].

use serde::Deserialize;

use crate::error::TransferError;
use crate::file::CandidateFile;
use crate::flow::FlowKind;

#[derive(Debug, Clone, PartialEq)]
pub enum FormPart<H> {
    File {
        field: &'static str,
        file: CandidateFile<H>,
    },
    Text {
        field: &'static str,
        value: String,
    },
}

impl<H> FormPart<H> {
    pub fn field(&self) -> &'static str {
        match self {
            FormPart::File { field, .. } | FormPart::Text { field, .. } => *field,
        }
    }
}

/// One POST to the processing server
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest<H> {
    pub flow: FlowKind,
    pub parts: Vec<FormPart<H>>,
}

impl<H> TransferRequest<H> {
    pub fn new(flow: FlowKind) -> Self {
        Self {
            flow,
            parts: Vec::new(),
        }
    }

    pub fn path(&self) -> &'static str {
        self.flow.endpoint()
    }

    pub fn file(mut self, field: &'static str, file: CandidateFile<H>) -> Self {
        self.parts.push(FormPart::File { field, file });
        self
    }

    pub fn text(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            field,
            value: value.into(),
        });
        self
    }

    /// Value of the first text part with this field name
    pub fn text_value(&self, field: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { field: f, value } if *f == field => Some(value.as_str()),
            _ => None,
        })
    }

    /// Names of all file parts with this field name, in order
    pub fn file_names(&self, field: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                FormPart::File { field: f, file } if *f == field => Some(file.name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// What the driver observed for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The server answered; `body` is the fully read response body
    Response { status: u16, body: Vec<u8> },
    /// The client-side timeout fired and the request was aborted
    TimedOut,
    /// The request never produced a readable response
    NetworkFailure(String),
}

impl TransferOutcome {
    /// Split into the downloaded bytes or the error to report
    pub fn into_result(self) -> Result<Vec<u8>, TransferError> {
        match self {
            TransferOutcome::Response { status, body } if (200..300).contains(&status) => Ok(body),
            TransferOutcome::Response { status, body } => Err(TransferError::Server {
                status,
                message: server_error_message(&body).unwrap_or_default(),
            }),
            TransferOutcome::TimedOut => Err(TransferError::Timeout),
            TransferOutcome::NetworkFailure(reason) => Err(TransferError::Network(reason)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Extract the `error` field from a JSON error body, if there is one
pub fn server_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|msg| !msg.trim().is_empty())
}

/// `<prefix>_<epoch-ms>.<ext>` name used for generated downloads
pub fn download_filename(prefix: &str, epoch_ms: i64, ext: &str) -> String {
    format!("{}_{}.{}", prefix, epoch_ms, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_part_order() {
        let request: TransferRequest<()> = TransferRequest::new(FlowKind::Split)
            .file("file", CandidateFile::new("a.pdf", 1, "application/pdf", ()))
            .text("mode", "pages")
            .text("pages", "1,2");

        let fields: Vec<_> = request.parts.iter().map(FormPart::field).collect();
        assert_eq!(fields, vec!["file", "mode", "pages"]);
        assert_eq!(request.text_value("mode"), Some("pages"));
        assert_eq!(request.text_value("ranges"), None);
        assert_eq!(request.file_names("file"), vec!["a.pdf"]);
        assert_eq!(request.path(), "/split");
    }

    #[test]
    fn test_success_statuses_yield_body() {
        let outcome = TransferOutcome::Response {
            status: 200,
            body: b"%PDF-1.7".to_vec(),
        };
        assert_eq!(outcome.into_result().unwrap(), b"%PDF-1.7".to_vec());
    }

    #[test]
    fn test_server_error_uses_json_message() {
        let outcome = TransferOutcome::Response {
            status: 400,
            body: br#"{"error": "At least 2 PDF files are required"}"#.to_vec(),
        };
        assert_eq!(
            outcome.into_result().unwrap_err(),
            TransferError::Server {
                status: 400,
                message: "At least 2 PDF files are required".into()
            }
        );
    }

    #[test]
    fn test_server_error_without_message() {
        assert_eq!(server_error_message(br#"{"status": 500}"#), None);
        assert_eq!(server_error_message(br#"{"error": ""}"#), None);
        assert_eq!(server_error_message(b"<html>Bad Gateway</html>"), None);
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(
            download_filename("merged_pdf", 1700000000123, "pdf"),
            "merged_pdf_1700000000123.pdf"
        );
    }
}

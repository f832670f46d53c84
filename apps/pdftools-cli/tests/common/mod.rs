#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use lopdf::{Dictionary, Document, Object};
use pdftools_cli::Backend;
use pdftools_core::{FormPart, TransferOutcome, TransferRequest};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn setup_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Write a PDF with `num_pages` blank pages
pub fn write_pdf(dir: &Path, name: &str, num_pages: u32) -> PathBuf {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let page_ids: Vec<_> = (0..num_pages)
        .map(|_| {
            doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
            ]))
        })
        .collect();

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to serialise test PDF");

    let path = dir.join(name);
    std::fs::write(&path, buffer).expect("Failed to write test PDF");
    path
}

/// Smallest valid PNG signature plus padding; enough for type sniffing
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0u8; 32]);
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write test PNG");
    path
}

// ============================================================================
// Mock server
// ============================================================================

/// One multipart field as the server saw it
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    File { field: String, name: String, len: usize },
    Text { field: String, value: String },
}

#[derive(Debug, Clone, Default)]
pub struct ServerLog {
    pub requests: Arc<Mutex<Vec<(String, Vec<Received>)>>>,
}

impl ServerLog {
    pub fn requests(&self) -> Vec<(String, Vec<Received>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct MockState {
    log: ServerLog,
    fail_with: Option<String>,
}

async fn read_fields(mut multipart: Multipart) -> Vec<Received> {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await.unwrap_or_default();
                fields.push(Received::File {
                    field: name,
                    name: file_name,
                    len: bytes.len(),
                });
            }
            None => {
                let value = field.text().await.unwrap_or_default();
                fields.push(Received::Text { field: name, value });
            }
        }
    }
    fields
}

fn respond(state: &MockState, path: &str, fields: Vec<Received>, body: &'static [u8]) -> Response {
    state
        .log
        .requests
        .lock()
        .unwrap()
        .push((path.to_string(), fields));

    match &state.fail_with {
        Some(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response(),
        None => (StatusCode::OK, body).into_response(),
    }
}

async fn merge(State(state): State<MockState>, multipart: Multipart) -> Response {
    let fields = read_fields(multipart).await;
    respond(&state, "/merge", fields, b"%PDF-1.7 merged")
}

async fn split(State(state): State<MockState>, multipart: Multipart) -> Response {
    let fields = read_fields(multipart).await;
    let all = fields
        .iter()
        .any(|f| matches!(f, Received::Text { field, value } if field == "mode" && value == "all"));
    let body: &'static [u8] = if all { b"PK\x03\x04 archive" } else { b"%PDF-1.7 split" };
    respond(&state, "/split", fields, body)
}

async fn images_to_pdf(State(state): State<MockState>, multipart: Multipart) -> Response {
    let fields = read_fields(multipart).await;
    respond(&state, "/images-to-pdf", fields, b"%PDF-1.7 images")
}

async fn compress(State(state): State<MockState>, multipart: Multipart) -> Response {
    let fields = read_fields(multipart).await;
    respond(&state, "/image-compress/process", fields, b"\x89PNG smaller")
}

/// Start a mock processing server on an ephemeral port
pub async fn spawn_mock_server(fail_with: Option<&str>) -> (String, ServerLog) {
    let log = ServerLog::default();
    let state = MockState {
        log: log.clone(),
        fail_with: fail_with.map(str::to_string),
    };

    let app = Router::new()
        .route("/merge", post(merge))
        .route("/split", post(split))
        .route("/images-to-pdf", post(images_to_pdf))
        .route("/image-compress/process", post(compress))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{}", addr), log)
}

// ============================================================================
// In-process backends
// ============================================================================

/// Never answers; only a client-side timeout ends the request
pub struct PendingBackend;

#[async_trait]
impl Backend for PendingBackend {
    async fn send(&self, _request: TransferRequest<PathBuf>) -> TransferOutcome {
        std::future::pending().await
    }
}

/// Answers every request with a fixed outcome and records what it was sent
pub struct CannedBackend {
    outcome: TransferOutcome,
    pub seen: Mutex<Vec<TransferRequest<PathBuf>>>,
}

impl CannedBackend {
    pub fn new(outcome: TransferOutcome) -> Self {
        Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: &[u8]) -> Self {
        Self::new(TransferOutcome::Response {
            status: 200,
            body: body.to_vec(),
        })
    }

    pub fn seen_fields(&self) -> Vec<Vec<&'static str>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.parts.iter().map(FormPart::field).collect())
            .collect()
    }
}

#[async_trait]
impl Backend for CannedBackend {
    async fn send(&self, request: TransferRequest<PathBuf>) -> TransferOutcome {
        self.seen.lock().unwrap().push(request);
        self.outcome.clone()
    }
}

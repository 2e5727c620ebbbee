use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{routing::delete, routing::get, routing::post, Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::task;
use tracing::{error, info};
use uuid::Uuid;

use docgenius_core::{FileDraft, FileSummary, MediaType, Operation, OperationKind, ProcessedResult};
use docgenius_extract::{render_download, DocumentExtractor, ExtractError, TextExtractor};
use docgenius_llm::{page_reference, GenAiClient, TextGenerator};
use docgenius_store::{resolve_operation, MemStorage, ResolveError};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

struct AppState {
    store: MemStorage,
    extractor: Box<dyn TextExtractor>,
    generator: Box<dyn TextGenerator>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();
    let generator = GenAiClient::from_env().unwrap_or_else(|_| GenAiClient::local());
    info!(
        "provider" = %generator.provider().as_str(),
        "model" = %generator.model()
    );
    let state = Arc::new(AppState {
        store: MemStorage::new(),
        extractor: Box::new(DocumentExtractor),
        generator: Box::new(generator),
    });
    let app = Router::new()
        .route("/", get(serve_ui))
        .route("/api/upload", post(handle_upload))
        .route("/api/files/recent", get(handle_recent_files))
        .route("/api/summarize", post(handle_summarize))
        .route("/api/qa", post(handle_qa))
        .route("/api/math", post(handle_math))
        .route("/api/download/:kind/:file_id", get(handle_download))
        .route("/api/files/:file_id/results", get(handle_results))
        .route("/api/files/:file_id", delete(handle_delete))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);
    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening" = %addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest {
    file_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QaRequest {
    file_id: i64,
    question: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_reference: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    success: bool,
    message: String,
}

async fn handle_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<FileSummary>, AppError> {
    let UploadedFile {
        data,
        filename,
        content_type,
    } = extract_file(&mut multipart).await?;
    let media_type = content_type
        .as_deref()
        .and_then(MediaType::from_mime)
        .ok_or_else(|| AppError::validation("Unsupported file type"))?;
    let original_name = filename.unwrap_or_else(|| "upload".to_string());
    let file_size = data.len() as u64;
    let mime = media_type.as_mime();
    let blocking_state = state.clone();
    let content = task::spawn_blocking(move || -> Result<String, ExtractError> {
        let mut tmp = NamedTempFile::new()?;
        std::io::Write::write_all(&mut tmp, &data)?;
        blocking_state.extractor.extract(tmp.path(), mime)
    })
    .await
    .map_err(AppError::internal)?
    .map_err(|err| {
        error!("extract_failed" = %err);
        AppError::upstream("Failed to process file. Please try uploading a different file.")
    })?;
    let record = state.store.create_file(FileDraft {
        filename: stored_filename(&original_name),
        original_name,
        file_type: media_type,
        file_size,
        content,
    });
    Ok(Json(record.summary()))
}

async fn handle_recent_files(State(state): State<Arc<AppState>>) -> Json<Vec<FileSummary>> {
    Json(state.store.recent_files(10))
}

async fn handle_summarize(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<OperationResponse>, AppError> {
    let request: ProcessRequest = parse_request(body)?;
    let record = run_operation(&state, request.file_id, Operation::Summary).await?;
    Ok(Json(OperationResponse {
        result: record.result,
        question: None,
        page_reference: None,
    }))
}

async fn handle_qa(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<OperationResponse>, AppError> {
    let request = parse_qa_request(body)?;
    let record = run_operation(
        &state,
        request.file_id,
        Operation::Qa {
            question: request.question,
        },
    )
    .await?;
    let page_reference = page_reference(&record.result);
    Ok(Json(OperationResponse {
        result: record.result,
        question: record.question,
        page_reference,
    }))
}

async fn handle_math(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<OperationResponse>, AppError> {
    let request: ProcessRequest = parse_request(body)?;
    let record = run_operation(&state, request.file_id, Operation::Math).await?;
    Ok(Json(OperationResponse {
        result: record.result,
        question: None,
        page_reference: None,
    }))
}

async fn handle_download(
    State(state): State<Arc<AppState>>,
    AxumPath((kind, file_id)): AxumPath<(String, String)>,
) -> Result<Response, AppError> {
    let file = file_id
        .parse::<i64>()
        .ok()
        .and_then(|id| state.store.get_file(id))
        .ok_or_else(|| AppError::not_found("File not found"))?;
    let kind = OperationKind::from_str(&kind)
        .ok_or_else(|| AppError::not_found("Result not found"))?;
    // Stored qa rows always carry a question, so a question-less probe only
    // ever surfaces summary and math results here.
    let result = state
        .store
        .find_result(file.id, kind, None)
        .ok_or_else(|| AppError::not_found("Result not found"))?;
    let body = render_download(&result.result, kind);
    // Filename and rendered header both name the parsed kind, not the raw
    // path segment.
    let filename = format!(
        "{}_{}_{}.txt",
        file.original_name,
        kind.as_str(),
        Utc::now().format("%Y-%m-%d")
    );
    let headers = [
        (header::CONTENT_TYPE, "text/plain".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, body).into_response())
}

async fn handle_results(
    State(state): State<Arc<AppState>>,
    AxumPath(file_id): AxumPath<String>,
) -> Json<Vec<ProcessedResult>> {
    let results = match file_id.parse::<i64>() {
        Ok(id) => state.store.results_for_file(id),
        Err(_) => Vec::new(),
    };
    Json(results)
}

async fn handle_delete(AxumPath(_file_id): AxumPath<String>) -> Json<DeleteResponse> {
    // Records live for the process lifetime; the browser clears its own list.
    Json(DeleteResponse {
        success: true,
        message: "File deleted successfully".to_string(),
    })
}

async fn run_operation(
    state: &AppState,
    file_id: i64,
    operation: Operation,
) -> Result<ProcessedResult, AppError> {
    resolve_operation(&state.store, state.generator.as_ref(), file_id, &operation)
        .await
        .map_err(|err| match err {
            ResolveError::FileNotFound(_) => AppError::not_found("File not found"),
            ResolveError::Generation(err) => {
                error!("generation_failed" = %err);
                AppError::upstream(operation.kind().failure_text())
            }
        })
}

fn parse_request<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|_| AppError::validation("Invalid request data"))
}

fn parse_qa_request(body: serde_json::Value) -> Result<QaRequest, AppError> {
    let request: QaRequest = parse_request(body)?;
    if request.question.trim().is_empty() {
        return Err(AppError::validation("Invalid request data"));
    }
    Ok(request)
}

fn stored_filename(original_name: &str) -> String {
    match Path::new(original_name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

struct UploadedFile {
    data: Vec<u8>,
    filename: Option<String>,
    content_type: Option<String>,
}

async fn extract_file(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::validation)?
    {
        if let Some(name) = field.name() {
            if name == "file" {
                let filename = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(AppError::validation)?;
                return Ok(UploadedFile {
                    data: data.to_vec(),
                    filename,
                    content_type,
                });
            }
        }
    }
    Err(AppError::validation("No file uploaded"))
}

async fn serve_ui() -> Html<&'static str> {
    Html(include_str!("../../../ui/index.html"))
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn validation<E: ToString>(msg: E) -> Self {
        Self::Validation(msg.to_string())
    }

    fn not_found<E: ToString>(msg: E) -> Self {
        Self::NotFound(msg.to_string())
    }

    fn upstream<E: ToString>(msg: E) -> Self {
        Self::Upstream(msg.to_string())
    }

    fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(err) => {
                error!("internal_error" = %err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    struct ScriptedGenerator {
        reply: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn state_with_file(reply: &str) -> (Arc<AppState>, i64, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let state = Arc::new(AppState {
            store: MemStorage::new(),
            extractor: Box::new(DocumentExtractor),
            generator: Box::new(ScriptedGenerator {
                reply: reply.to_string(),
                calls: calls.clone(),
            }),
        });
        let file = state.store.create_file(FileDraft {
            filename: "abc.txt".to_string(),
            original_name: "report.txt".to_string(),
            file_type: MediaType::Text,
            file_size: 23,
            content: "Revenue grew 10% to $5M".to_string(),
        });
        (state, file.id, calls)
    }

    #[test]
    fn process_request_requires_numeric_file_id() {
        let parsed: ProcessRequest = parse_request(json!({ "fileId": 7 })).unwrap();
        assert_eq!(parsed.file_id, 7);

        let missing: Result<ProcessRequest, AppError> = parse_request(json!({}));
        assert!(matches!(missing, Err(AppError::Validation(ref msg)) if msg == "Invalid request data"));

        let wrong_type: Result<ProcessRequest, AppError> =
            parse_request(json!({ "fileId": "seven" }));
        assert!(wrong_type.is_err());
    }

    #[test]
    fn blank_question_is_rejected_before_any_lookup() {
        for question in ["", "   ", "\n\t"] {
            let parsed = parse_qa_request(json!({ "fileId": 1, "question": question }));
            assert!(
                matches!(parsed, Err(AppError::Validation(ref msg)) if msg == "Invalid request data")
            );
        }
    }

    #[test]
    fn qa_request_keeps_question_verbatim() {
        let parsed = parse_qa_request(json!({ "fileId": 1, "question": "  What is it?  " })).unwrap();
        assert_eq!(parsed.question, "  What is it?  ");
    }

    #[test]
    fn stored_filename_is_synthetic_but_keeps_extension() {
        let stored = stored_filename("report.final.txt");
        assert!(stored.ends_with(".txt"));
        assert_ne!(stored, "report.final.txt");
        assert!(!stored_filename("README").contains('.'));
    }

    #[test]
    fn error_statuses_follow_taxonomy() {
        assert_eq!(
            AppError::validation("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::upstream("x").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn operation_response_omits_absent_fields() {
        let bare = serde_json::to_value(OperationResponse {
            result: "<h2>Main Summary</h2>".to_string(),
            question: None,
            page_reference: None,
        })
        .unwrap();
        assert_eq!(bare, json!({ "result": "<h2>Main Summary</h2>" }));

        let qa = serde_json::to_value(OperationResponse {
            result: "See page 3 for the table.".to_string(),
            question: Some("Where is the table?".to_string()),
            page_reference: Some("Page 3".to_string()),
        })
        .unwrap();
        assert_eq!(
            qa,
            json!({
                "result": "See page 3 for the table.",
                "question": "Where is the table?",
                "pageReference": "Page 3"
            })
        );
    }

    #[tokio::test]
    async fn math_responses_replay_byte_identical_through_the_handler() {
        let (state, file_id, calls) =
            state_with_file("<h2>Solution</h2><p>$5M after 10% growth.</p>");
        let body = json!({ "fileId": file_id });

        let Json(first) = handle_math(State(state.clone()), Json(body.clone()))
            .await
            .unwrap();
        let Json(second) = handle_math(State(state), Json(body)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!first.result.is_empty());
        assert_eq!(first.result, second.result);
        assert_eq!(second.question, None);
        assert_eq!(second.page_reference, None);
    }

    #[tokio::test]
    async fn qa_handler_echoes_question_and_page_reference() {
        let (state, file_id, calls) =
            state_with_file("<h2>Answer</h2><p>See page 3 for the table.</p>");
        let body = json!({ "fileId": file_id, "question": "What is the revenue?" });

        let Json(first) = handle_qa(State(state.clone()), Json(body.clone()))
            .await
            .unwrap();
        let Json(cached) = handle_qa(State(state), Json(body)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.question.as_deref(), Some("What is the revenue?"));
        assert_eq!(first.page_reference.as_deref(), Some("Page 3"));
        assert_eq!(cached.page_reference.as_deref(), Some("Page 3"));
        assert_eq!(first.result, cached.result);
    }

    #[tokio::test]
    async fn operations_on_unknown_files_map_to_not_found() {
        let (state, _file_id, calls) = state_with_file("unused");

        let err = handle_summarize(State(state), Json(json!({ "fileId": 99 })))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "File not found"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn download_kind_and_filename_agree_regardless_of_path_case() {
        let (state, file_id, _calls) = state_with_file("<h2>Solution</h2><p>Growth holds.</p>");
        handle_math(State(state.clone()), Json(json!({ "fileId": file_id })))
            .await
            .unwrap();

        let response = handle_download(
            State(state),
            AxumPath(("MATH".to_string(), file_id.to_string())),
        )
        .await
        .unwrap();

        let (parts, body) = response.into_parts();
        let disposition = parts.headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"report.txt_math_"));
        let bytes = axum::body::to_bytes(body, MAX_UPLOAD_BYTES).await.unwrap();
        assert!(bytes.starts_with(b"DocGenius - Math Result"));
    }
}

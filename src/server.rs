//! Browser UI and JSON API.
//!
//! Serves the single-page scanner UI and the endpoints it calls. Scans run
//! the same [`process_batch`] loop as the CLI.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Scanner UI (upload, drag-and-drop, camera, review form) |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/types` | Known document types |
//! | `POST` | `/api/scan` | Classify and extract a batch of images |
//! | `POST` | `/api/form` | Apply edits to a record and return its form |
//! | `POST` | `/api/save` | Confirm a reviewed record |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "no files in request" } }
//! ```
//!
//! Error codes: `bad_request` (400), `payload_too_large` (413),
//! `internal` (500). Malformed JSON bodies and bodies over the size limit
//! use the same envelope. Per-file model failures are not HTTP errors; they
//! are reported in the item's `status`/`message`.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, FromRequest, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::batch::{process_batch, Batch, BatchItem, BatchSummary};
use crate::config::Config;
use crate::form::{apply_updates, form_view, FormView};
use crate::gemini::{GeminiClient, ModelClient};
use crate::image::{ImageError, ImageInput};
use crate::models::{DocType, DocumentData};
use crate::progress::NoProgress;

/// Most files accepted by a single `POST /api/scan`.
pub const MAX_FILES_PER_SCAN: usize = 10;

/// Floor for the request body limit, so small `max_file_bytes` settings
/// still get a proper `payload_too_large` JSON error from the handler.
const MIN_BODY_LIMIT: usize = 1024 * 1024;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    client: Arc<dyn ModelClient>,
}

impl AppState {
    pub fn new(config: Config, client: Arc<dyn ModelClient>) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

/// Starts the server on `[server].bind` with a Gemini-backed client.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let client = GeminiClient::from_config(&config.model)?;
    tracing::info!(model = %client.model(), "using Gemini model");
    let state = AppState::new(config.clone(), Arc::new(client));

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("scanner listening on http://{}", bind_addr);
    println!("Scanner UI available at http://{}", bind_addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Builds the application router. Exposed so tests can serve it with a
/// substitute [`ModelClient`].
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Base64 inflates uploads by 4/3; leave headroom for the JSON envelope.
    let body_limit = state
        .config
        .upload
        .max_file_bytes
        .saturating_mul(2)
        .saturating_mul(MAX_FILES_PER_SCAN)
        .max(MIN_BODY_LIMIT);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/types", get(handle_types))
        .route("/api/scan", post(handle_scan))
        .route("/api/form", post(handle_form))
        .route("/api/save", post(handle_save))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn payload_too_large(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::PAYLOAD_TOO_LARGE,
        code: "payload_too_large".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            payload_too_large(rejection.body_text())
        } else {
            bad_request(rejection.body_text())
        }
    }
}

/// [`Json`] extractor whose rejections use the JSON error envelope.
#[derive(Debug)]
struct ApiJson<T>(T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

fn image_error(file: &str, err: ImageError) -> AppError {
    let message = format!("{}: {}", file, err);
    match err {
        ImageError::TooLarge { .. } => payload_too_large(message),
        _ => bad_request(message),
    }
}

// ============ GET / and /health ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/types ============

#[derive(Serialize)]
struct TypeInfo {
    #[serde(rename = "tipoDocumento")]
    doc_type: DocType,
    label: &'static str,
    extractable: bool,
}

async fn handle_types() -> Json<Vec<TypeInfo>> {
    Json(
        DocType::ALL
            .iter()
            .map(|t| TypeInfo {
                doc_type: *t,
                label: t.label(),
                extractable: crate::schema::extraction_schema(*t).is_some(),
            })
            .collect(),
    )
}

// ============ POST /api/scan ============

/// One uploaded file: either `data` (base64) with `mimeType`, or a camera
/// capture as a `dataUrl`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFile {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub data_url: Option<String>,
}

/// Body of `POST /api/scan`: a list of `files`, or a single capture given
/// as a top-level `dataUrl` (optionally named by `fileName`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default)]
    pub files: Vec<UploadFile>,
    /// Skip classification and extract as this type.
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub data_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl ScanRequest {
    /// All uploads in queue order; a top-level `dataUrl` goes last.
    fn into_uploads(self) -> Vec<UploadFile> {
        let mut files = self.files;
        if let Some(data_url) = self.data_url {
            files.push(UploadFile {
                file_name: self.file_name,
                mime_type: None,
                data: None,
                data_url: Some(data_url),
            });
        }
        files
    }
}

#[derive(Serialize)]
struct ScanItemResponse {
    #[serde(flatten)]
    item: BatchItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    form: Option<FormView>,
    /// `data:` URL of the source image, shown next to the form.
    preview: String,
}

#[derive(Serialize)]
struct ScanResponse {
    items: Vec<ScanItemResponse>,
    summary: BatchSummary,
}

fn decode_upload(index: usize, upload: &UploadFile) -> Result<ImageInput, AppError> {
    let fallback_name = format!("arquivo-{}", index + 1);
    let name = upload.file_name.as_deref().unwrap_or(&fallback_name);

    let image = match (&upload.data_url, &upload.data) {
        (Some(url), _) => ImageInput::from_data_url(upload.file_name.as_deref(), url),
        (None, Some(data)) => {
            let mime = upload
                .mime_type
                .as_deref()
                .ok_or_else(|| bad_request(format!("{}: mimeType is required with data", name)))?;
            ImageInput::from_base64(name, mime, data)
        }
        (None, None) => return Err(bad_request(format!("{}: missing data or dataUrl", name))),
    };

    image.map_err(|e| image_error(name, e))
}

async fn handle_scan(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    let forced_type = match req.doc_type.as_deref() {
        Some(t) => Some(t.parse::<DocType>().map_err(bad_request)?),
        None => None,
    };

    let uploads = req.into_uploads();
    if uploads.len() > MAX_FILES_PER_SCAN {
        return Err(bad_request(format!(
            "at most {} files per scan, got {}",
            MAX_FILES_PER_SCAN,
            uploads.len()
        )));
    }

    let mut batch = Batch::default();
    for (index, upload) in uploads.iter().enumerate() {
        let image = decode_upload(index, upload)?;
        image
            .validate(&state.config.upload)
            .map_err(|e| image_error(&image.file_name, e))?;
        batch.push(image);
    }
    if batch.is_empty() {
        return Err(bad_request("no files in request"));
    }

    let summary = process_batch(state.client.as_ref(), &mut batch, forced_type, &NoProgress).await;
    tracing::info!(
        success = summary.success,
        error = summary.error,
        "scan request finished"
    );

    let items = batch
        .items
        .into_iter()
        .map(|item| ScanItemResponse {
            form: item.data().map(form_view),
            preview: item.image.to_data_url(),
            item,
        })
        .collect();

    Ok(Json(ScanResponse { items, summary }))
}

// ============ POST /api/form ============

#[derive(Debug, Deserialize)]
pub struct FormRequest {
    pub data: DocumentData,
    #[serde(default)]
    pub updates: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct FormResponse {
    data: DocumentData,
    form: FormView,
}

async fn handle_form(ApiJson(req): ApiJson<FormRequest>) -> Result<Json<FormResponse>, AppError> {
    let mut data = req.data;
    apply_updates(&mut data, &req.updates).map_err(|e| bad_request(e.to_string()))?;
    let form = form_view(&data);
    Ok(Json(FormResponse { data, form }))
}

// ============ POST /api/save ============

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub data: DocumentData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    saved: bool,
    tipo_documento: DocType,
}

/// Records the reviewed data in the log. Nothing is persisted.
async fn handle_save(ApiJson(req): ApiJson<SaveRequest>) -> Result<Json<SaveResponse>, AppError> {
    let json = serde_json::to_string(&req.data).map_err(|e| internal(e.to_string()))?;
    tracing::info!(doc_type = %req.data.doc_type(), data = %json, "document confirmed");
    Ok(Json(SaveResponse {
        saved: true,
        tipo_documento: req.data.doc_type(),
    }))
}

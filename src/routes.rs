//! HTTP surface.
//!
//! Three routes: `POST /upload` accepts a multipart video plus sampling
//! parameters and answers with a session id, `GET /frames/{session_id}`
//! returns the extracted frames exactly once, and `GET /health` is a
//! liveness probe. Validation failures are rejected before any filesystem
//! work begins.

use std::{collections::BTreeMap, time::Duration};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::Field},
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    error::FotogramaError,
    metadata::VideoDetails,
    sampler::{SamplePlan, SampleWindow},
    session,
    state::AppState,
    video::VideoSource,
};

/// Response literal for an upload without a `video` field.
const ERROR_NO_FILE: &str = "No se envió ningún archivo";
/// Response literal for a video FFmpeg cannot open.
const ERROR_UNREADABLE_VIDEO: &str = "No se pudo abrir el archivo de video.";
/// Response literal for an unknown (or already consumed) session id.
const ERROR_SESSION_NOT_FOUND: &str = "SESSIONT NOT FOUND.";
/// Success message for a processed upload.
const MESSAGE_UPLOAD_OK: &str = "Video procesado y frames generados con éxito.";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`FotogramaError`] for domain errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce the service's JSON error
/// bodies, preserving the exact wire literals clients depend on.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A domain-level error from the library.
    #[error(transparent)]
    Domain(#[from] FotogramaError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),

            ApiError::Domain(domain) => match domain {
                FotogramaError::InvalidRange { .. }
                | FotogramaError::InvalidFrameCount
                | FotogramaError::InvalidVideo(_)
                | FotogramaError::NoVideoStream => {
                    (StatusCode::BAD_REQUEST, domain.to_string())
                }
                FotogramaError::FileOpen { .. } => {
                    (StatusCode::BAD_REQUEST, ERROR_UNREADABLE_VIDEO.to_string())
                }
                FotogramaError::FileNotFound { .. } => {
                    (StatusCode::NOT_FOUND, domain.to_string())
                }
                FotogramaError::SessionNotFound(_) => {
                    (StatusCode::NOT_FOUND, ERROR_SESSION_NOT_FOUND.to_string())
                }
                other => {
                    tracing::error!(error = %other, "Internal domain error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal error occurred".to_string(),
                    )
                }
            },

            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `video_details` payload of the upload response.
///
/// The field names reproduce the service's published wire format.
#[derive(Debug, Serialize)]
pub struct VideoDetailsPayload {
    #[serde(rename = "Ancho (pixeles)")]
    width: u32,
    #[serde(rename = "Alto (pixeles)")]
    height: u32,
    #[serde(rename = "Cantidad de cuadros (frames)")]
    frame_count: u64,
    #[serde(rename = "Fotogramas por segundo (FPS)")]
    fps: f64,
    #[serde(rename = "Tiempo total (segundos)")]
    duration_seconds: f64,
    #[serde(rename = "Codec (formato)")]
    codec: String,
}

impl From<&VideoDetails> for VideoDetailsPayload {
    fn from(details: &VideoDetails) -> Self {
        Self {
            width: details.width,
            height: details.height,
            frame_count: details.frame_count,
            fps: details.fps,
            duration_seconds: details.duration_seconds,
            codec: details.codec.clone(),
        }
    }
}

/// Success payload of `POST /upload`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    message: &'static str,
    session_id: String,
    video_details: VideoDetailsPayload,
}

/// Success payload of `GET /frames/{session_id}`.
#[derive(Debug, Serialize)]
pub struct FramesResponse {
    frames: BTreeMap<String, String>,
}

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    status: &'static str,
    /// Crate version from Cargo.toml.
    version: &'static str,
}

/// GET /health -- liveness probe.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /upload -- accept a video, sample frames from the requested window,
/// and register a session for one-time retrieval.
async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut video: Option<(String, Vec<u8>)> = None;
    let mut start_time: f64 = 0.0;
    let mut end_time: f64 = 0.0;
    let mut frame_count: u32 = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::BadRequest(error.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "video" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|error| ApiError::BadRequest(error.to_string()))?;
                video = Some((filename, data.to_vec()));
            }
            "start_time" => start_time = parse_text_field(field, "start_time").await?,
            "end_time" => end_time = parse_text_field(field, "end_time").await?,
            "frame_count" => frame_count = parse_text_field(field, "frame_count").await?,
            _ => {} // ignore unknown fields
        }
    }

    let (filename, data) =
        video.ok_or_else(|| ApiError::BadRequest(ERROR_NO_FILE.to_string()))?;

    // Reject invalid windows before any filesystem work.
    let window = SampleWindow::new(start_time, end_time, frame_count);
    window.validate()?;

    let session_id = session::generate_session_id();

    let workspace = state.workspace.clone();
    let id = session_id.clone();
    let details = tokio::task::spawn_blocking(move || -> ApiResult<VideoDetails> {
        workspace.provision_session(&id)?;

        let result = (|| -> ApiResult<VideoDetails> {
            let video_path = workspace.save_upload(&id, &filename, &data)?;
            let mut source = VideoSource::open(&video_path)?;
            let details = source.details().clone();

            let plan = SamplePlan::compute(&window, details.fps, details.duration_seconds)?;
            let written = source.extract_frames(&plan, &workspace.frames_dir(&id))?;
            log::info!(
                "Session {id}: extracted {} frame(s) for window [{}, {}]",
                written.len(),
                window.start_time,
                window.end_time,
            );
            Ok(details)
        })();

        // The stored video is transient either way; only frames persist.
        workspace.discard_upload(&id);
        if result.is_err() {
            workspace.discard_frames(&id);
        }
        result
    })
    .await
    .map_err(|error| ApiError::Internal(error.to_string()))??;

    state
        .store
        .register(session_id.clone(), state.workspace.frames_dir(&session_id));
    tracing::info!(%session_id, "Video processed and frames generated");

    Ok(Json(UploadResponse {
        message: MESSAGE_UPLOAD_OK,
        video_details: VideoDetailsPayload::from(&details),
        session_id,
    }))
}

/// GET /frames/{session_id} -- return the session's frames, base64-encoded,
/// and destroy the session. A second call with the same id is a 404.
async fn get_frames(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<FramesResponse>> {
    let store = state.store.clone();
    let frames = tokio::task::spawn_blocking(move || store.consume(&session_id))
        .await
        .map_err(|error| ApiError::Internal(error.to_string()))??;

    Ok(Json(FramesResponse { frames }))
}

/// Read a multipart text field and parse it into `T`.
async fn parse_text_field<T: std::str::FromStr>(
    field: Field<'_>,
    name: &str,
) -> ApiResult<T> {
    let text = field
        .text()
        .await
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    text.trim()
        .parse::<T>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid value for '{name}': {text}")))
}

/// Assemble the service router with its middleware stack.
pub fn router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload_video))
        .route("/frames/{session_id}", get(get_frames))
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500.
        .layer(CatchPanicLayer::new())
        // Request timeout: the outer bound on a long extraction.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.request_timeout_secs),
        ))
        // Propagate request ID to the response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // Uploads are whole videos; raise axum's default body limit.
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
}

//! Router integration tests for the HTTP surface.
//!
//! These exercise the exact wire literals and the reject-before-write
//! discipline without touching a real video. The full upload/retrieve
//! roundtrip runs only when the sample fixture is present.

use std::fs;
use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use fotograma::{AppState, ServiceConfig, Workspace, router};

const BOUNDARY: &str = "fotograma-test-boundary";

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

/// Build a router over storage roots inside a fresh temporary directory.
fn test_app(root: &TempDir) -> Router {
    let config = ServiceConfig {
        uploads_root: root.path().join("uploads"),
        frames_root: root.path().join("frames"),
        ..ServiceConfig::default()
    };
    let workspace =
        Workspace::create(&config.uploads_root, &config.frames_root).expect("create workspace");
    router(AppState::new(config, workspace))
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.oneshot(request).await.expect("send request")
}

async fn post_multipart(app: Router, body: Vec<u8>) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("build request");
    app.oneshot(request).await.expect("send request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON body")
}

/// Incrementally build a multipart/form-data body.
#[derive(Default)]
struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    fn file(mut self, name: &str, filename: &str, content: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: video/mp4\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(content);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}

fn directory_is_empty(path: &Path) -> bool {
    fs::read_dir(path).map(|mut dir| dir.next().is_none()).unwrap_or(true)
}

#[tokio::test]
async fn health_check_returns_ok() {
    let root = TempDir::new().expect("tempdir");
    let response = get(test_app(&root), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let root = TempDir::new().expect("tempdir");
    let response = get(test_app(&root), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_request_id_header() {
    let root = TempDir::new().expect("tempdir");
    let response = get(test_app(&root), "/health").await;

    assert!(
        response.headers().get("x-request-id").is_some(),
        "response must carry an x-request-id header"
    );
}

#[tokio::test]
async fn unknown_session_returns_404_with_exact_literal() {
    let root = TempDir::new().expect("tempdir");
    let response = get(test_app(&root), "/frames/unknown-id").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "SESSIONT NOT FOUND.");
}

#[tokio::test]
async fn upload_without_video_field_returns_400_with_exact_literal() {
    let root = TempDir::new().expect("tempdir");
    let body = MultipartBody::default()
        .text("start_time", "0")
        .text("end_time", "5")
        .text("frame_count", "3")
        .finish();

    let response = post_multipart(test_app(&root), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No se envió ningún archivo");
    assert!(directory_is_empty(&root.path().join("frames")));
}

#[tokio::test]
async fn upload_with_zero_frame_count_is_rejected_before_any_writes() {
    let root = TempDir::new().expect("tempdir");
    let body = MultipartBody::default()
        .file("video", "clip.mp4", b"not a real video")
        .text("start_time", "0")
        .text("end_time", "5")
        .text("frame_count", "0")
        .finish();

    let response = post_multipart(test_app(&root), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(directory_is_empty(&root.path().join("uploads")));
    assert!(directory_is_empty(&root.path().join("frames")));
}

#[tokio::test]
async fn upload_with_end_not_after_start_is_rejected() {
    let root = TempDir::new().expect("tempdir");
    let body = MultipartBody::default()
        .file("video", "clip.mp4", b"not a real video")
        .text("start_time", "5")
        .text("end_time", "1")
        .text("frame_count", "3")
        .finish();

    let response = post_multipart(test_app(&root), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(directory_is_empty(&root.path().join("uploads")));
    assert!(directory_is_empty(&root.path().join("frames")));
}

#[tokio::test]
async fn upload_defaults_are_rejected_when_fields_are_omitted() {
    // start_time, end_time, and frame_count all default to zero, which is
    // an invalid window.
    let root = TempDir::new().expect("tempdir");
    let body = MultipartBody::default()
        .file("video", "clip.mp4", b"not a real video")
        .finish();

    let response = post_multipart(test_app(&root), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_with_unparseable_frame_count_is_rejected() {
    let root = TempDir::new().expect("tempdir");
    let body = MultipartBody::default()
        .file("video", "clip.mp4", b"not a real video")
        .text("start_time", "0")
        .text("end_time", "5")
        .text("frame_count", "many")
        .finish();

    let response = post_multipart(test_app(&root), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreadable_video_returns_400_and_cleans_up() {
    let root = TempDir::new().expect("tempdir");
    let body = MultipartBody::default()
        .file("video", "clip.mp4", b"these bytes are not a video container")
        .text("start_time", "0")
        .text("end_time", "5")
        .text("frame_count", "3")
        .finish();

    let response = post_multipart(test_app(&root), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No se pudo abrir el archivo de video.");

    // Both per-session directories are discarded on failure.
    assert!(directory_is_empty(&root.path().join("uploads")));
    assert!(directory_is_empty(&root.path().join("frames")));
}

#[tokio::test]
async fn upload_and_consume_roundtrip() {
    if !Path::new(sample_video_path()).exists() {
        return;
    }
    let video_bytes = fs::read(sample_video_path()).expect("read fixture");

    let root = TempDir::new().expect("tempdir");
    let app = test_app(&root);

    let body = MultipartBody::default()
        .file("video", "sample_video.mp4", &video_bytes)
        .text("start_time", "0")
        .text("end_time", "2")
        .text("frame_count", "3")
        .finish();

    let response = post_multipart(app.clone(), body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Video procesado y frames generados con éxito.");
    let details = &json["video_details"];
    for key in [
        "Ancho (pixeles)",
        "Alto (pixeles)",
        "Cantidad de cuadros (frames)",
        "Fotogramas por segundo (FPS)",
        "Tiempo total (segundos)",
        "Codec (formato)",
    ] {
        assert!(!details[key].is_null(), "missing video_details key {key}");
    }

    let session_id = json["session_id"].as_str().expect("session id").to_string();

    // The transient upload is gone; the frames are waiting.
    assert!(directory_is_empty(&root.path().join("uploads")));

    let response = get(app.clone(), &format!("/frames/{session_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let frames = json["frames"].as_object().expect("frames object");
    assert!(!frames.is_empty());
    assert!(frames.len() <= 3, "at most frame_count frames");
    for (filename, payload) in frames {
        assert!(filename.starts_with("frame_") && filename.ends_with(".jpg"));
        let bytes = BASE64_STANDARD
            .decode(payload.as_str().expect("base64 string"))
            .expect("valid base64");
        assert!(!bytes.is_empty());
    }

    // Consumption is destructive: the same id is now unknown.
    let response = get(app, &format!("/frames/{session_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "SESSIONT NOT FOUND.");
    assert!(directory_is_empty(&root.path().join("frames")));
}

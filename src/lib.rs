//! # fotograma
//!
//! A small HTTP service that samples still frames from uploaded videos and
//! hands them back exactly once.
//!
//! A client POSTs a video together with a time window and a frame budget;
//! the service decodes the selected frames with FFmpeg (via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate), stores them
//! as JPEGs keyed by a fresh session id, and returns the id along with the
//! video's properties. A single GET with that id returns every frame
//! base64-encoded and destroys the session.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fotograma::{AppState, ServiceConfig, Workspace, router};
//!
//! # async fn serve() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::default();
//! let workspace = Workspace::create(&config.uploads_root, &config.frames_root)?;
//! let app = router(AppState::new(config, workspace));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Sampling
//!
//! The core of the service is a pure plan computation: the requested window
//! is clamped to the video's duration, the bounds become frame numbers, and
//! the spacing is `max(1, span / frame_count)` in whole frames. The plan can
//! be inspected without touching a decoder:
//!
//! ```
//! use fotograma::{SamplePlan, SampleWindow};
//!
//! let plan = SamplePlan::compute(&SampleWindow::new(0.0, 10.0, 5), 10.0, 10.0).unwrap();
//! assert_eq!(plan.step, 20);
//! ```
//!
//! ## Lifecycle
//!
//! A session is created on upload and consumed by the first retrieval, which
//! deletes its frames from disk. Sessions that are never retrieved keep
//! their frame directories until an operator removes them; the registry
//! itself is in-memory only and empties on restart.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the host system.

pub mod config;
pub mod error;
pub mod metadata;
pub mod routes;
pub mod sampler;
pub mod session;
pub mod state;
pub mod storage;
pub mod video;

pub use config::ServiceConfig;
pub use error::FotogramaError;
pub use metadata::VideoDetails;
pub use routes::{ApiError, ApiResult, router};
pub use sampler::{SamplePlan, SampleWindow};
pub use session::SessionStore;
pub use state::AppState;
pub use storage::Workspace;
pub use video::VideoSource;

//! Session registry and one-time frame retrieval.
//!
//! A session links an upload to its extracted frames until they are
//! retrieved. The registry is an in-memory map from session id to the
//! session's frame directory, guarded by a single coarse mutex: entries are
//! removed *inside* the lock before any filesystem work, so retrieval is
//! at-most-once even when two requests race on the same id. Nothing expires
//! abandoned sessions; their directories leak until an external reaper
//! removes them.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::PathBuf,
    sync::Mutex,
};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};

use crate::error::FotogramaError;

/// Generate a fresh session token (a hyphenated UUID v4).
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// In-memory registry of live sessions.
///
/// A session id maps to the directory holding its extracted frames. The
/// registry is not persisted; a process restart forgets every session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, PathBuf>>,
}

impl SessionStore {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session once its frames have been extracted.
    pub fn register(&self, session_id: String, frames_dir: PathBuf) {
        log::debug!(
            "Registering session {session_id} -> {}",
            frames_dir.display()
        );
        self.lock().insert(session_id, frames_dir);
    }

    /// Atomically remove a session, returning its frame directory.
    ///
    /// Exactly one caller can win for a given id; every later call returns
    /// `None`.
    pub fn take(&self, session_id: &str) -> Option<PathBuf> {
        self.lock().remove(session_id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Consume a session: read every frame in its directory into a
    /// filename → base64 map, then delete the directory tree.
    ///
    /// The registry entry is removed before any file I/O, so a session can
    /// be consumed at most once. Cleanup rolls forward: the directory is
    /// deleted even when a frame fails to read, and the session stays
    /// consumed either way.
    ///
    /// # Errors
    ///
    /// - [`FotogramaError::SessionNotFound`] if the id is unregistered (or
    ///   was already consumed).
    /// - [`FotogramaError::IoError`] if a frame file cannot be read.
    pub fn consume(
        &self,
        session_id: &str,
    ) -> Result<BTreeMap<String, String>, FotogramaError> {
        let frames_dir = self
            .take(session_id)
            .ok_or_else(|| FotogramaError::SessionNotFound(session_id.to_string()))?;

        let frames = encode_frames(&frames_dir);

        if let Err(error) = fs::remove_dir_all(&frames_dir) {
            // The entry is already gone; a leftover directory is an orphan,
            // not a retrievable session.
            log::error!(
                "Failed to remove frame directory {}: {error}",
                frames_dir.display()
            );
        }

        let frames = frames?;
        log::info!(
            "Consumed session {session_id} ({} frame(s))",
            frames.len()
        );
        Ok(frames)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PathBuf>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read every regular file in `frames_dir` and base64-encode its contents,
/// keyed by filename.
fn encode_frames(frames_dir: &PathBuf) -> Result<BTreeMap<String, String>, FotogramaError> {
    let mut frames = BTreeMap::new();

    for entry in fs::read_dir(frames_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().into_owned();
        let bytes = fs::read(entry.path())?;
        frames.insert(filename, BASE64_STANDARD.encode(bytes));
    }

    Ok(frames)
}

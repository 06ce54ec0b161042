//! On-disk layout for uploads and extracted frames.
//!
//! Each session owns two directories: `<uploads_root>/<session_id>/` holds
//! the uploaded video while it is being probed and sampled, and
//! `<frames_root>/<session_id>/` holds the extracted JPEGs until the session
//! is consumed. The upload directory is transient and removed right after
//! extraction; the frame directory lives until retrieval.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::FotogramaError;

/// Base name for the stored upload; the original extension is appended.
const UPLOAD_FILE_STEM: &str = "uploaded_video";

/// The two per-session storage roots.
#[derive(Debug, Clone)]
pub struct Workspace {
    uploads_root: PathBuf,
    frames_root: PathBuf,
}

impl Workspace {
    /// Create a workspace over the given roots and make sure both exist.
    ///
    /// # Errors
    ///
    /// Returns [`FotogramaError::IoError`] if a root cannot be created.
    pub fn create(
        uploads_root: impl Into<PathBuf>,
        frames_root: impl Into<PathBuf>,
    ) -> Result<Self, FotogramaError> {
        let workspace = Self {
            uploads_root: uploads_root.into(),
            frames_root: frames_root.into(),
        };
        fs::create_dir_all(&workspace.uploads_root)?;
        fs::create_dir_all(&workspace.frames_root)?;
        Ok(workspace)
    }

    /// The upload directory for a session.
    pub fn upload_dir(&self, session_id: &str) -> PathBuf {
        self.uploads_root.join(session_id)
    }

    /// The frame directory for a session.
    pub fn frames_dir(&self, session_id: &str) -> PathBuf {
        self.frames_root.join(session_id)
    }

    /// Create the empty upload and frame directories for a new session.
    ///
    /// # Errors
    ///
    /// Returns [`FotogramaError::IoError`] if either directory cannot be
    /// created.
    pub fn provision_session(&self, session_id: &str) -> Result<(), FotogramaError> {
        fs::create_dir_all(self.upload_dir(session_id))?;
        fs::create_dir_all(self.frames_dir(session_id))?;
        log::debug!("Provisioned storage for session {session_id}");
        Ok(())
    }

    /// Write the uploaded video into the session's upload directory as
    /// `uploaded_video<ext>`, where `<ext>` is taken from the client's
    /// filename. Returns the stored path.
    ///
    /// # Errors
    ///
    /// Returns [`FotogramaError::IoError`] if the file cannot be written.
    pub fn save_upload(
        &self,
        session_id: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, FotogramaError> {
        let stored_name = match Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) if !ext.is_empty() => format!("{UPLOAD_FILE_STEM}.{ext}"),
            _ => UPLOAD_FILE_STEM.to_string(),
        };

        let path = self.upload_dir(session_id).join(stored_name);
        fs::write(&path, bytes)?;
        log::debug!(
            "Stored upload for session {session_id} at {} ({} bytes)",
            path.display(),
            bytes.len(),
        );
        Ok(path)
    }

    /// Remove the session's upload directory (the stored video), keeping the
    /// frames. Called once extraction has finished to bound disk use.
    ///
    /// Best-effort: a failure is logged, not returned, since the frames are
    /// already in place and the session must still become retrievable.
    pub fn discard_upload(&self, session_id: &str) {
        let dir = self.upload_dir(session_id);
        if let Err(error) = fs::remove_dir_all(&dir) {
            log::warn!("Failed to remove upload directory {}: {error}", dir.display());
        }
    }

    /// Remove the session's frame directory. Used to clean up when an upload
    /// fails after provisioning. Best-effort, like
    /// [`discard_upload`](Workspace::discard_upload).
    pub fn discard_frames(&self, session_id: &str) {
        let dir = self.frames_dir(session_id);
        if let Err(error) = fs::remove_dir_all(&dir) {
            log::warn!("Failed to remove frame directory {}: {error}", dir.display());
        }
    }
}

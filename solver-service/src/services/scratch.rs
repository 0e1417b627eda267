//! Request-scoped scratch files.
//!
//! Uploads are written to disk only so the extractor can read them by path.
//! A [`ScratchFile`] removes its file when dropped, so every exit path of a
//! handler (success, early return, error, panic unwind) releases it.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

const FALLBACK_FILE_NAME: &str = "upload.pdf";
const FALLBACK_REQUEST_ID: &str = "request";

/// Longest request-id prefix kept in a scratch name (a hyphenated UUID).
const MAX_REQUEST_ID_LEN: usize = 36;

/// Longest file-name suffix kept in a scratch name. Together with the id,
/// nonce and separators this stays under the common 255-byte name limit.
const MAX_FILE_NAME_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Open the scratch root, creating it if missing.
    pub async fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root).await?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Write `data` to `<root>/<request_id>_<nonce>_<sanitized name>`.
    ///
    /// Request ids can be supplied by the client, so the nonce keeps two
    /// requests that share an id apart. Both the id and the name are capped.
    pub async fn persist(
        &self,
        request_id: &str,
        file_name: &str,
        data: &[u8],
    ) -> io::Result<ScratchFile> {
        let path = self.root.join(scratch_name(request_id, file_name));
        ScratchFile::write(path, data).await
    }
}

fn scratch_name(request_id: &str, file_name: &str) -> String {
    let mut id = clean_component(request_id);
    id.truncate(MAX_REQUEST_ID_LEN);
    let id = id.trim_end_matches(['.', '_']);
    let id = if id.is_empty() { FALLBACK_REQUEST_ID } else { id };

    let nonce = Uuid::new_v4().simple().to_string();
    let name = shorten_keeping_extension(&sanitize_filename(file_name), MAX_FILE_NAME_LEN);

    format!("{}_{}_{}", id, &nonce[..8], name)
}

/// Owned handle to a file in the scratch directory. Deleted on drop.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Write `data` to `path`. The guard exists before the first byte is
    /// written, so a failed or partial write is removed too.
    async fn write(path: PathBuf, data: &[u8]) -> io::Result<Self> {
        let file = ScratchFile { path };
        fs::write(&file.path, data).await?;

        tracing::debug!(path = %file.path.display(), size = data.len(), "Scratch file written");

        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    /// Removal is a single synchronous unlink. `Drop` cannot await, and it
    /// must also run while a panic unwinds the handler.
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Scratch file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove scratch file"
            ),
        }
    }
}

/// Reduce a client-supplied file name to a safe, flat ASCII name.
///
/// Path separators become word breaks, non-ASCII is dropped, whitespace runs
/// collapse to `_`, and anything outside `[A-Za-z0-9._-]` is removed. Leading
/// and trailing dots/underscores are trimmed so the result can never be `..`
/// or a hidden file. An empty result falls back to `upload.pdf`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = clean_component(name);
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

fn clean_component(name: &str) -> String {
    let spaced: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Cut an ASCII name to `max` bytes, keeping a short extension intact.
fn shorten_keeping_extension(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }

    let extension = name
        .rfind('.')
        .map(|dot| &name[dot..])
        .filter(|ext| ext.len() <= 10)
        .unwrap_or("");
    let stem = &name[..max - extension.len()];

    format!("{}{}", stem.trim_end_matches(['.', '_']), extension)
}

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["geojson", "png", "jpg", "jpeg", "gif", "tif"];

// Hardcoded pattern, valid at compile time
#[allow(clippy::unwrap_used)]
static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Extension check, case insensitive. Names without a dot are rejected.
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Reduce a client-supplied name to a flat ASCII file name.
///
/// Path separators and whitespace become `_`, everything outside
/// `[A-Za-z0-9_.-]` is dropped, and leading/trailing dots and underscores
/// are stripped. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let flattened = filename
        .replace(['/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    UNSAFE_FILENAME_CHARS
        .replace_all(&flattened, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// `<base>/uploads/<name>`
pub fn public_url(base_url: &str, filename: &str) -> String {
    format!("{}/uploads/{}", base_url.trim_end_matches('/'), filename)
}

/// Stores plot attachments in a flat directory served under `/uploads`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save an upload and return its stored name, or `None` when the file
    /// is not an allowed type. Same-named uploads overwrite each other.
    pub async fn save(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<Option<String>, UploadError> {
        let filename = secure_filename(original_name);

        if !allowed_file(original_name) || !allowed_file(&filename) {
            tracing::info!("Ignoring upload with disallowed name '{}'", original_name);
            return Ok(None);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        tracing::debug!("Stored upload {} ({} bytes)", filename, bytes.len());
        Ok(Some(filename))
    }
}

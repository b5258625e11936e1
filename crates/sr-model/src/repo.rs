use std::path::{Path, PathBuf};

use crate::error::{ModelError, Result};

/// Environment variable overriding the artifact cache location.
pub const CACHE_ENV: &str = "SUMMARY_RUNTIME_CACHE";

/// Local repository of pretrained model artifacts.
///
/// Model identifiers (e.g. "acme/encdec-base-sum") map to `.gguf` files
/// under a cache directory, with `/` mangled to `--` in the file name.
/// Fetching artifacts into the cache is an external downloader's job; this
/// type only resolves identifiers against what is already on disk.
pub struct ModelRepo {
    root: PathBuf,
}

impl ModelRepo {
    /// Create a repository rooted at the default cache directory, honoring
    /// the `SUMMARY_RUNTIME_CACHE` override.
    pub fn from_env() -> Self {
        let root = std::env::var_os(CACHE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::cache_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("summary-runtime")
            });
        ModelRepo { root }
    }

    /// Create a repository rooted at an explicit directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        ModelRepo { root: root.into() }
    }

    /// The cache directory this repository resolves against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a model identifier to the path of its cached artifact.
    ///
    /// Fails with [`ModelError::ModelNotFound`] when no artifact for the
    /// identifier exists in the cache.
    pub fn resolve(&self, model_id: &str) -> Result<PathBuf> {
        let file_name = format!("{}.gguf", model_id.replace('/', "--"));
        let path = self.root.join(file_name);
        if !path.is_file() {
            return Err(ModelError::ModelNotFound(model_id.to_string()));
        }
        Ok(path)
    }
}

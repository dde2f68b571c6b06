//! Shell settings loaded via OrthoConfig.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::Deal;
use crate::outbound::{InMemoryDealRepository, SeedError};

/// Errors raised while turning settings into a repository.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The seed file could not be read.
    #[error("failed to read seed file at {path}: {source}")]
    SeedRead {
        /// Path to the seed file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The seed file did not hold a deal list.
    #[error("invalid seed file at {path}: {source}")]
    SeedParse {
        /// Path to the seed file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The seed file held deals the repository cannot store.
    #[error("unusable seed file at {path}: {source}")]
    SeedRejected {
        /// Path to the seed file.
        path: PathBuf,
        /// Why the seed was refused.
        #[source]
        source: SeedError,
    },
}

/// Settings controlling the reference repository the shell runs against.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DEAL_SHELL")]
pub struct ShellSettings {
    /// Reject every repository call.
    #[ortho_config(default = false)]
    pub force_failure: bool,
    /// JSON file holding the deals to seed the repository with.
    pub seed_path: Option<PathBuf>,
}

impl ShellSettings {
    /// Read the seed deals, or an empty list when no seed file is configured.
    pub fn seed_deals(&self) -> Result<Vec<Deal>, SettingsError> {
        let Some(path) = self.seed_path.as_deref() else {
            return Ok(Vec::new());
        };
        let raw = read_to_string(path).map_err(|source| SettingsError::SeedRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SettingsError::SeedParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the reference repository these settings describe.
    pub fn build_repository(&self) -> Result<InMemoryDealRepository, SettingsError> {
        let repository =
            InMemoryDealRepository::with_deals(self.seed_deals()?).map_err(|source| {
                SettingsError::SeedRejected {
                    path: self.seed_path.clone().unwrap_or_default(),
                    source,
                }
            })?;
        Ok(repository.with_force_failure(self.force_failure))
    }
}

/// Read a UTF-8 file through a `cap_std` handle on its parent directory.
///
/// # Errors
///
/// Returns the I/O error raised while opening the directory or reading the
/// file; a path without a file name is [`io::ErrorKind::InvalidInput`].
pub fn read_to_string(path: &Path) -> io::Result<String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path must name a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read_to_string(Path::new(file_name))
}

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures that abort the current scaffold or sync invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no project folder available; pass a path or open a CMake project first")]
    NoProjectContext,
    #[error("file system failure at {}", path.display())]
    FileSystemFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn fs(path: &Path, source: io::Error) -> Self {
        Self::FileSystemFailure {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Non-fatal conditions collected during a sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncWarning {
    #[error("{dir}: no manifest at {}, skipped", path.display())]
    ManifestMissing { dir: &'static str, path: PathBuf },
    #[error("{}: no build rule and no `{anchor}` marker, left unchanged", path.display())]
    RootRuleNotFound { path: PathBuf, anchor: &'static str },
    #[error("root manifest {} not found, build rule not updated", path.display())]
    RootManifestMissing { path: PathBuf },
    #[error("{} is not valid UTF-8, left unchanged", path.display())]
    ManifestNotUtf8 { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;

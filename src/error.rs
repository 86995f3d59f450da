use std::{
    fmt,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::DB_FILE;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("{} is not an everpix archive (no {})", .0.display(), DB_FILE)]
    NotAnArchive(PathBuf),

    #[error("failed to open database at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("archive database has no {0} table")]
    Schema(&'static str),

    #[error("archive has no user record")]
    MissingUser,

    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("malformed backing: {0}")]
    Backing(#[from] BackingError),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to start the export thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("export worker panicked")]
    ExportPanicked,
}

impl ArchiveError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackingError {
    #[error("backing is empty")]
    Empty,

    #[error("unknown backing tag {0:#04x}")]
    UnknownTag(u8),

    #[error("backing is truncated")]
    Truncated,

    #[error("backing names an invalid data file {0:?}")]
    InvalidName(String),
}

/// Why a single photo could not be exported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    #[error("reading photo data: {0}")]
    Read(String),

    #[error("writing file: {0}")]
    Write(String),

    #[error("a different file already exists at the destination")]
    Conflict,

    #[error("photo appears more than once in the export list")]
    Duplicate,

    #[error("export was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    pub pid: Vec<u8>,
    pub path: PathBuf,
    pub kind: FailureKind,
}

impl ExportFailure {
    pub fn new(kind: FailureKind, pid: &[u8], path: &Path) -> ExportFailure {
        ExportFailure { pid: pid.to_vec(), path: path.to_path_buf(), kind }
    }
}

impl fmt::Display for ExportFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Error: {} ({}) -> {}",
            self.path.display(),
            crate::models::hex(&self.pid),
            self.kind
        )
    }
}

impl std::error::Error for ExportFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_what_failed() {
        let spawn = ArchiveError::Spawn(std::io::Error::new(std::io::ErrorKind::Other, "no threads"));
        assert_eq!(spawn.to_string(), "failed to start the export thread: no threads");

        let failure = ExportFailure::new(FailureKind::Conflict, &[0xab, 0x01], Path::new("/out/a.jpg"));
        assert_eq!(
            failure.to_string(),
            "Error: /out/a.jpg (ab01) -> a different file already exists at the destination"
        );
    }
}

use std::path::{Path, PathBuf};

pub mod archive;
pub mod backing;
pub mod cli;
pub mod db;
pub mod error;
pub mod export;
pub mod hash;
pub mod logging;
pub mod models;
pub mod pack;
pub mod util;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::Archive;
pub use error::{ArchiveError, ExportFailure, FailureKind};
pub use export::{ExportJob, ExportOptions, ExportReport};
pub use models::{Photo, User};

/// Name of the SQLite database inside an archive directory.
pub const DB_FILE: &str = "archive.sqlite";
/// Directory holding the packed data files referenced by photo backings.
pub const DATA_DIR: &str = "data";

pub fn build_db_path(archive_root: &Path) -> PathBuf {
    archive_root.join(DB_FILE)
}

pub fn build_data_dir(archive_root: &Path) -> PathBuf {
    archive_root.join(DATA_DIR)
}

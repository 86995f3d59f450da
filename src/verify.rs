use std::{collections::HashSet, fmt, path::{Path, PathBuf}};

use glob::{glob_with, MatchOptions, PatternError};
use rayon::prelude::*;

use crate::{
    archive::{read_photo, Archive},
    hash::{content_hash, file_hash},
    models::Photo,
    util::{build_final_path, is_export_file, sniff_extension},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStatus {
    Verified,
    Missing,
    Mismatch,
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct VerifyEntry {
    pub pid_hex: String,
    pub path: PathBuf,
    pub status: VerifyStatus,
}

impl VerifyEntry {
    pub fn is_ok(&self) -> bool {
        self.status == VerifyStatus::Verified
    }
}

impl fmt::Display for VerifyEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.status {
            VerifyStatus::Verified => write!(f, "Verified: {} -> {}", self.path.display(), self.pid_hex),
            VerifyStatus::Missing => write!(f, "Error: file not found {} -> {}", self.path.display(), self.pid_hex),
            VerifyStatus::Mismatch => write!(f, "Error: hash mismatch on {} -> {}", self.path.display(), self.pid_hex),
            VerifyStatus::Unreadable(e) => write!(f, "Error: reading {} -> {}", self.pid_hex, e),
        }
    }
}

/// Checks that every photo was exported into `dest` with identical content.
pub fn verify_export(archive: &Archive, photos: &[Photo], dest: &Path) -> Vec<VerifyEntry> {
    let files = archive.data_files();
    photos
        .par_iter()
        .map(|photo| {
            let entry = |path: PathBuf, status| VerifyEntry { pid_hex: photo.pid_hex(), path, status };
            let data = match read_photo(files, photo) {
                Ok(data) => data,
                Err(e) => return entry(dest.to_path_buf(), VerifyStatus::Unreadable(e.to_string())),
            };
            let path = build_final_path(dest, photo, sniff_extension(&data));
            if !path.exists() {
                return entry(path, VerifyStatus::Missing);
            }
            match file_hash(&path) {
                Ok(hash) if hash == content_hash(&data) => entry(path, VerifyStatus::Verified),
                Ok(_) => entry(path, VerifyStatus::Mismatch),
                Err(e) => entry(path, VerifyStatus::Unreadable(e.to_string())),
            }
        })
        .collect()
}

/// Exported-looking files under `dest` that no verified entry accounts for.
pub fn find_untracked(dest: &Path, entries: &[VerifyEntry]) -> Result<Vec<PathBuf>, PatternError> {
    let tracked: HashSet<&Path> = entries.iter().map(|entry| entry.path.as_path()).collect();
    let pattern = glob::Pattern::escape(&dest.to_string_lossy());
    let options: MatchOptions = Default::default();
    let mut untracked: Vec<PathBuf> = glob_with(&format!("{}/**/*", pattern), options)?
        .filter_map(|x| x.ok())
        .filter(|path| is_export_file(path) && !tracked.contains(path.as_path()))
        .collect();
    untracked.sort();
    Ok(untracked)
}

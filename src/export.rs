//! Export engine: writes archive photos into a dated folder tree.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    archive::read_photo,
    error::{ArchiveError, ExportFailure, FailureKind},
    hash::{content_hash, file_hash},
    models::Photo,
    pack::DataFiles,
    util::{build_final_path, set_file_time, sniff_extension, write_to_path},
};

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Resolve destinations and report outcomes without writing anything.
    pub dry_run: bool,
    /// Replace files that differ from the archive copy instead of failing.
    pub overwrite: bool,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub total: usize,
    pub exported: usize,
    /// Already present at the destination with identical content.
    pub skipped: usize,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Exported(PathBuf),
    Skipped(PathBuf),
    Failed(ExportFailure),
}

/// A running export. Dropping the job detaches the worker thread.
#[derive(Debug)]
pub struct ExportJob {
    handle: Option<JoinHandle<ExportReport>>,
    cancel: Arc<AtomicBool>,
}

impl ExportJob {
    pub(crate) fn spawn<P, C>(
        files: Arc<DataFiles>, photos: Vec<Photo>, dest: PathBuf, options: ExportOptions,
        progress: P, completion: C,
    ) -> Result<Self, ArchiveError>
    where
        P: Fn(f64) + Send + Sync + 'static,
        C: FnOnce(Vec<ExportFailure>) + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);
        let handle = thread::Builder::new()
            .name("everpix-export".to_string())
            .spawn(move || {
                let report = run_export(&files, &photos, &dest, &options, &worker_cancel, &progress);
                completion(report.failures.clone());
                report
            })
            .map_err(ArchiveError::Spawn)?;
        Ok(ExportJob { handle: Some(handle), cancel })
    }

    pub fn is_exporting(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Photos not yet started are reported as cancelled failures.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn wait(mut self) -> Result<ExportReport, ArchiveError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ArchiveError::ExportPanicked),
            None => Ok(ExportReport::default()),
        }
    }
}

pub(crate) fn run_export(
    files: &DataFiles, photos: &[Photo], dest: &Path, options: &ExportOptions,
    cancel: &AtomicBool, progress: &(dyn Fn(f64) + Sync),
) -> ExportReport {
    let mut seen = HashSet::with_capacity(photos.len());
    let mut unique = Vec::with_capacity(photos.len());
    let mut report = ExportReport { total: photos.len(), ..ExportReport::default() };
    for photo in photos {
        if seen.insert(photo.pid.as_slice()) {
            unique.push(photo);
        } else {
            report.failures.push(ExportFailure::new(FailureKind::Duplicate, &photo.pid, dest));
        }
    }

    info!("Exporting {} photos to {}", unique.len(), dest.display());
    if unique.is_empty() {
        progress(1.0);
        return report;
    }

    let total = unique.len();
    let done = Mutex::new(0usize);
    let work = || {
        unique
            .par_iter()
            .map(|photo| {
                let outcome = if cancel.load(Ordering::SeqCst) {
                    Outcome::Failed(ExportFailure::new(FailureKind::Cancelled, &photo.pid, dest))
                } else {
                    export_one(files, photo, dest, options)
                };
                let mut done = done.lock().unwrap_or_else(PoisonError::into_inner);
                *done += 1;
                progress(*done as f64 / total as f64);
                outcome
            })
            .collect::<Vec<Outcome>>()
    };

    let outcomes = match options.threads {
        Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(work),
            Err(e) => {
                warn!("Falling back to the global thread pool: {}", e);
                work()
            }
        },
        None => work(),
    };

    for outcome in outcomes {
        match outcome {
            Outcome::Exported(path) => {
                debug!("exported {}", path.display());
                report.exported += 1;
            }
            Outcome::Skipped(path) => {
                debug!("already exported {}", path.display());
                report.skipped += 1;
            }
            Outcome::Failed(failure) => {
                warn!("{}", failure);
                report.failures.push(failure);
            }
        }
    }
    info!(
        "Exported {}/{} photos ({} already present, {} failed)",
        report.exported,
        report.total,
        report.skipped,
        report.failures.len()
    );
    report
}

fn export_one(files: &DataFiles, photo: &Photo, dest: &Path, options: &ExportOptions) -> Outcome {
    let data = match read_photo(files, photo) {
        Ok(data) => data,
        Err(e) => {
            return Outcome::Failed(ExportFailure::new(
                FailureKind::Read(e.to_string()),
                &photo.pid,
                dest,
            ))
        }
    };
    let path = build_final_path(dest, photo, sniff_extension(&data));

    if path.exists() {
        match file_hash(&path) {
            Ok(hash) if hash == content_hash(&data) => return Outcome::Skipped(path),
            Ok(_) if is_truncated_copy(&path, &data) => {
                info!("replacing incomplete copy {}", path.display())
            }
            Ok(_) if !options.overwrite => {
                return Outcome::Failed(ExportFailure::new(FailureKind::Conflict, &photo.pid, &path))
            }
            Err(e) if !options.overwrite => {
                return Outcome::Failed(ExportFailure::new(
                    FailureKind::Write(e.to_string()),
                    &photo.pid,
                    &path,
                ))
            }
            _ => info!("overwriting {}", path.display()),
        }
    }

    if options.dry_run {
        info!("mock exported {} -> {}", photo.pid_hex(), path.display());
        return Outcome::Exported(path);
    }

    if let Err(e) = write_to_path(&data, &path) {
        return Outcome::Failed(ExportFailure::new(FailureKind::Write(e.to_string()), &photo.pid, &path));
    }
    if let Some(timestamp) = photo.timestamp {
        if let Err(e) = set_file_time(&path, timestamp) {
            warn!("could not set the date of {}: {}", path.display(), e);
        }
    }
    Outcome::Exported(path)
}

/// A shorter file holding a prefix of `data` is what an interrupted write
/// leaves behind.
fn is_truncated_copy(path: &Path, data: &[u8]) -> bool {
    match fs::read(path) {
        Ok(existing) => existing.len() < data.len() && data.starts_with(&existing),
        Err(_) => false,
    }
}

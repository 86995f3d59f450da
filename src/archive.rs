use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, info};
use rusqlite::{Connection, OpenFlags};

use crate::{
    backing::Backing,
    build_data_dir, build_db_path, db,
    error::ArchiveError,
    export::{self, ExportJob, ExportOptions, ExportReport},
    models::{Photo, User},
    pack::DataFiles,
    ExportFailure,
};

/// An opened Everpix archive: the SQLite database plus the packed data
/// files its photo backings point into.
#[derive(Debug)]
pub struct Archive {
    root: PathBuf,
    conn: Connection,
    files: Arc<DataFiles>,
}

impl Archive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let root = path.as_ref().to_path_buf();
        let db_path = build_db_path(&root);
        if !root.is_dir() || !db_path.is_file() {
            return Err(ArchiveError::NotAnArchive(root));
        }

        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| ArchiveError::Open { path: db_path.clone(), source })?;
        db::check_schema(&conn)?;
        info!("Opened archive {}", root.display());

        let files = Arc::new(DataFiles::new(&build_data_dir(&root)));
        Ok(Archive { root, conn, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fetch_user(&self) -> Result<User, ArchiveError> {
        db::fetch_user(&self.conn)
    }

    pub fn fetch_all_photos(&self) -> Result<Vec<Photo>, ArchiveError> {
        db::fetch_photos(&self.conn)
    }

    /// Reads the stored bytes of a photo.
    pub fn read_photo(&self, photo: &Photo) -> Result<Vec<u8>, ArchiveError> {
        read_photo(&self.files, photo)
    }

    /// Starts exporting `photos` into `to_path` on a background thread.
    ///
    /// `progress` receives the completed fraction, never decreasing and
    /// ending at `1.0`. `completion` runs once after the last progress call
    /// with every failure.
    pub fn export_photos<P, C>(
        &self, photos: Vec<Photo>, to_path: impl AsRef<Path>, options: ExportOptions, progress: P,
        completion: C,
    ) -> Result<ExportJob, ArchiveError>
    where
        P: Fn(f64) + Send + Sync + 'static,
        C: FnOnce(Vec<ExportFailure>) + Send + 'static,
    {
        ExportJob::spawn(
            Arc::clone(&self.files),
            photos,
            to_path.as_ref().to_path_buf(),
            options,
            progress,
            completion,
        )
    }

    /// Same as [`Archive::export_photos`] but runs on the calling thread.
    pub fn export_photos_blocking(
        &self, photos: &[Photo], to_path: impl AsRef<Path>, options: &ExportOptions,
        progress: impl Fn(f64) + Sync,
    ) -> ExportReport {
        export::run_export(&self.files, photos, to_path.as_ref(), options, &Default::default(), &progress)
    }

    pub(crate) fn data_files(&self) -> &DataFiles {
        &self.files
    }
}

pub(crate) fn read_photo(files: &DataFiles, photo: &Photo) -> Result<Vec<u8>, ArchiveError> {
    match Backing::decode(&photo.backing)? {
        Backing::Inline(data) => Ok(data.to_vec()),
        Backing::Packed { file, offset, length } => {
            debug!("Reading {} bytes of {} at {} for {}", length, file, offset, photo.pid_hex());
            files.read_range(file, offset, length)
        }
    }
}

use std::{
    collections::HashMap,
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use log::debug;

use crate::error::ArchiveError;

/// Open handles on the archive's packed data files, keyed by file name.
///
/// Handles are opened lazily and kept for the life of the archive so a large
/// export does not reopen the same pack for every photo.
#[derive(Debug)]
pub struct DataFiles {
    root: PathBuf,
    files: Mutex<HashMap<String, Arc<Mutex<File>>>>,
}

impl DataFiles {
    pub fn new(root: &Path) -> Self {
        DataFiles { root: root.to_path_buf(), files: Mutex::new(HashMap::new()) }
    }

    pub fn open_count(&self) -> usize {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn read_range(&self, name: &str, offset: u64, length: u64) -> Result<Vec<u8>, ArchiveError> {
        let path = self.root.join(name);
        let handle = self.handle(name, &path)?;
        let mut file = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let size = file.metadata().map_err(|e| ArchiveError::io(&path, e))?.len();
        if offset.checked_add(length).map_or(true, |end| end > size) {
            return Err(ArchiveError::io(
                &path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("range {}+{} is past the end of a {} byte file", offset, length, size),
                ),
            ));
        }

        let mut buf = vec![0u8; length as usize];
        file.seek(SeekFrom::Start(offset)).map_err(|e| ArchiveError::io(&path, e))?;
        file.read_exact(&mut buf).map_err(|e| ArchiveError::io(&path, e))?;
        Ok(buf)
    }

    fn handle(&self, name: &str, path: &Path) -> Result<Arc<Mutex<File>>, ArchiveError> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = files.get(name) {
            return Ok(Arc::clone(handle));
        }
        let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        debug!("Opened data file {}", path.display());
        let handle = Arc::new(Mutex::new(file));
        files.insert(name.to_string(), Arc::clone(&handle));
        Ok(handle)
    }
}

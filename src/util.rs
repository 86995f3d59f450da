use std::{
    ffi::OsStr,
    fs::{self, FileTimes},
    io::{self, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::models::Photo;

const FILE_DATE_F_STR: &str = "%Y%m%d_%H%M%S";

/// Extensions the exporter can produce; used to spot untracked files.
pub const EXPORT_EXTENSIONS: [&str; 8] = ["jpg", "png", "gif", "heic", "tiff", "mov", "mp4", "bin"];

/// Picks a file extension from the leading magic bytes.
pub fn sniff_extension(buf: &[u8]) -> &'static str {
    match buf {
        [0xff, 0xd8, 0xff, ..] => "jpg",
        [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, ..] => "png",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'I', b'I', 0x2a, 0x00, ..] | [b'M', b'M', 0x00, 0x2a, ..] => "tiff",
        [_, _, _, _, b'f', b't', b'y', b'p', brand @ ..] if brand.len() >= 4 => {
            match &brand[..4] {
                b"heic" | b"heix" | b"mif1" | b"msf1" | b"hevc" => "heic",
                b"qt  " => "mov",
                _ => "mp4",
            }
        }
        _ => "bin",
    }
}

/// `<dest>/<year>/<YYYYMMDD_HHMMSS>_<pid>.<ext>`, or `<dest>/<year>/undated_<pid>.<ext>`
/// when the photo carries no usable timestamp. Photos with neither a stored
/// year nor a timestamp have year 0.
pub fn build_final_path(dest: &Path, photo: &Photo, ext: &str) -> PathBuf {
    let file_name = match photo.taken_at() {
        Some(date) => format!("{}_{}.{}", date.format(FILE_DATE_F_STR), photo.pid_hex(), ext),
        None => format!("undated_{}.{}", photo.pid_hex(), ext),
    };
    dest.join(photo.year.to_string()).join(file_name)
}

pub fn is_export_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(OsStr::to_str)
            .map(|ext| EXPORT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
}

/// Sibling of `path` that receives the bytes until they are complete.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Writes into a `.part` file and renames it over `path`, so an interrupted
/// write never leaves a truncated file at the destination.
pub fn write_to_path(buf: &[u8], path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let part = part_path(path);
    let written = fs::File::create(&part).and_then(|mut file| {
        file.write_all(buf)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|_| fs::rename(&part, path)) {
        let _ = fs::remove_file(&part);
        return Err(e);
    }
    Ok(())
}

/// Sets access and modification times to the photo timestamp. Dates before
/// 1970 are kept; only times the platform cannot represent fall back to the
/// epoch.
pub fn set_file_time(path: &Path, timestamp: i64) -> io::Result<()> {
    let time = if timestamp >= 0 {
        UNIX_EPOCH + Duration::from_secs(timestamp as u64)
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(timestamp.unsigned_abs()))
            .unwrap_or(UNIX_EPOCH)
    };
    set_file_system_time(path, time)
}

fn set_file_system_time(path: &Path, time: SystemTime) -> io::Result<()> {
    let times = FileTimes::new().set_modified(time).set_accessed(time);
    let file = fs::File::options().write(true).open(path)?;
    file.set_times(times)
}

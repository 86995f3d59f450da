use std::{fs, path::Path};

use rusqlite::Connection;

use crate::{backing::Backing, build_data_dir, build_db_path, db, models::Photo, User};

pub(crate) const JPEG_HEADER: [u8; 4] = [0xff, 0xd8, 0xff, 0xe0];

pub(crate) fn jpeg(body: &str) -> Vec<u8> {
    let mut data = JPEG_HEADER.to_vec();
    data.extend_from_slice(body.as_bytes());
    data
}

/// Writes an archive with one user, storing every even photo inline and
/// every odd photo in a single pack file.
pub(crate) fn build_archive(root: &Path, photos: &[(Photo, Vec<u8>)]) -> Vec<Photo> {
    let con = Connection::open(build_db_path(root)).unwrap();
    db::create_tables(&con).unwrap();
    db::insert_user(
        &con,
        &User { email: Some("owner@example.com".to_string()), ..User::default() },
    )
    .unwrap();

    fs::create_dir_all(build_data_dir(root)).unwrap();
    let mut pack = Vec::new();
    let mut stored = Vec::new();
    for (i, (photo, data)) in photos.iter().enumerate() {
        let backing = if i % 2 == 0 {
            Backing::Inline(data).encode()
        } else {
            let offset = pack.len() as u64;
            pack.extend_from_slice(data);
            Backing::Packed { file: "pack-0", offset, length: data.len() as u64 }.encode()
        };
        let photo = Photo { backing, ..photo.clone() };
        db::insert_photo(&con, &photo).unwrap();
        stored.push(photo);
    }
    fs::write(build_data_dir(root).join("pack-0"), pack).unwrap();
    stored
}

pub(crate) fn dated_photo(pid: u8, timestamp: i64, year: i32) -> Photo {
    Photo {
        pid: vec![pid; 4],
        timestamp: Some(timestamp),
        year,
        source_type: Some("iphoto".to_string()),
        device_name: Some("iPhone 4S".to_string()),
        ..Photo::default()
    }
}

use std::{
    fs,
    path::Path,
    sync::{mpsc, Arc, Mutex},
};

use everpix_export::{
    backing::Backing,
    build_data_dir, build_db_path, db,
    verify::{verify_export, VerifyStatus},
    Archive, ExportOptions, FailureKind, Photo, User,
};
use rusqlite::Connection;

fn write_archive(root: &Path) {
    let con = Connection::open(build_db_path(root)).unwrap();
    db::create_tables(&con).unwrap();
    db::insert_user(
        &con,
        &User {
            email: Some("ada@example.com".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            timezone: Some("Europe/London".to_string()),
        },
    )
    .unwrap();

    let first = b"\xff\xd8\xff\xe0first photo".to_vec();
    let second = b"\xff\xd8\xff\xe1second photo".to_vec();
    let mut pack = vec![0u8; 16];
    let offset = pack.len() as u64;
    pack.extend_from_slice(&second);
    fs::create_dir_all(build_data_dir(root)).unwrap();
    fs::write(build_data_dir(root).join("pack-7"), &pack).unwrap();

    let photos = [
        Photo {
            pid: vec![0x10; 16],
            // 2011-03-13T07:06:40Z
            timestamp: Some(1_300_000_000),
            year: 2011,
            source_type: Some("iphoto".to_string()),
            backing: Backing::Inline(&first).encode(),
            ..Photo::default()
        },
        Photo {
            pid: vec![0x20; 16],
            // 2012-06-15T08:30:05Z
            timestamp: Some(1_339_749_005),
            year: 2012,
            device_name: Some("iPhone 4S".to_string()),
            backing: Backing::Packed { file: "pack-7", offset, length: second.len() as u64 }
                .encode(),
            ..Photo::default()
        },
        Photo {
            pid: vec![0x30; 16],
            timestamp: Some(1_339_749_100),
            year: 2012,
            backing: Backing::Packed { file: "pack-missing", offset: 0, length: 4 }.encode(),
            ..Photo::default()
        },
    ];
    for photo in &photos {
        db::insert_photo(&con, photo).unwrap();
    }
}

#[test]
fn opens_archive_and_fetches_records() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path());
    let archive = Archive::open(dir.path()).unwrap();

    let user = archive.fetch_user().unwrap();
    assert_eq!(user.display_name(), "Ada Lovelace");
    assert_eq!(user.timezone.as_deref(), Some("Europe/London"));

    let photos = archive.fetch_all_photos().unwrap();
    assert_eq!(photos.len(), 3);
    assert_eq!(photos[0].year, 2011);
    assert_eq!(photos[1].device_name.as_deref(), Some("iPhone 4S"));
}

#[test]
fn background_export_reports_progress_and_failures() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_archive(dir.path());
    let archive = Archive::open(dir.path()).unwrap();
    let photos = archive.fetch_all_photos().unwrap();

    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&progress);
    let (tx, rx) = mpsc::channel();
    let job = archive
        .export_photos(
            photos.clone(),
            out.path(),
            ExportOptions { threads: Some(2), ..ExportOptions::default() },
            move |fraction| sink.lock().unwrap().push(fraction),
            move |failures| tx.send(failures).unwrap(),
        )
        .unwrap();
    let report = job.wait().unwrap();

    let failures = rx.recv().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].pid, vec![0x30; 16]);
    assert!(matches!(failures[0].kind, FailureKind::Read(_)));
    assert_eq!(report.exported, 2);

    let progress = progress.lock().unwrap();
    assert_eq!(progress.len(), 3);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last().copied(), Some(1.0));

    let pid = "10".repeat(16);
    let first = out.path().join("2011").join(format!("20110313_070640_{}.jpg", pid));
    assert_eq!(fs::read(first).unwrap(), b"\xff\xd8\xff\xe0first photo");

    let entries = verify_export(&archive, &photos, out.path());
    let statuses: Vec<bool> =
        entries.iter().map(|entry| entry.status == VerifyStatus::Verified).collect();
    assert_eq!(statuses, [true, true, false]);
    assert!(matches!(entries[2].status, VerifyStatus::Unreadable(_)));
}

use std::{
    io::IsTerminal,
    path::Path,
    process::ExitCode,
};

use everpix_export::{
    cli::{Cli, Mode},
    logging, Archive, ArchiveError, ExportOptions, Photo,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};

fn main() -> ExitCode {
    let args = Cli::load();
    logging::init_logging();

    let archive = match Archive::open(&args.archive) {
        Ok(archive) => archive,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
    };
    let result = match args.mode {
        Mode::Info => print_user(&archive),
        Mode::List { year } => list_photos(&archive, year),
        Mode::Export { dest, year, dry_run, overwrite, threads, no_progress_bar } => {
            let options = ExportOptions { dry_run, overwrite, threads };
            export(&archive, &dest, year, options, no_progress_bar)
        }
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(1)
        }
    }
}

fn print_user(archive: &Archive) -> Result<ExitCode, ArchiveError> {
    let user = archive.fetch_user()?;
    println!("{}", user.display_name());
    println!("email:    {}", user.email.as_deref().unwrap_or("-"));
    println!("timezone: {}", user.timezone.as_deref().unwrap_or("-"));
    Ok(ExitCode::SUCCESS)
}

fn list_photos(archive: &Archive, year: Option<i32>) -> Result<ExitCode, ArchiveError> {
    let photos = select_photos(archive, year)?;
    if photos.is_empty() {
        println!("no photos in archive");
        return Ok(ExitCode::SUCCESS);
    }
    for photo in &photos {
        println!("{}", present_photo_row(photo));
    }
    Ok(ExitCode::SUCCESS)
}

fn export(
    archive: &Archive, dest: &Path, year: Option<i32>, options: ExportOptions, no_progress_bar: bool,
) -> Result<ExitCode, ArchiveError> {
    let photos = select_photos(archive, year)?;
    let total = photos.len() as u64;
    info!("Exporting {} photos from {} to {}", total, archive.root().display(), dest.display());

    let bar = create_progress_bar(no_progress_bar, total);
    let progress_bar = bar.clone();
    let job = archive.export_photos(
        photos,
        dest,
        options,
        move |fraction| progress_bar.set_position((fraction * total as f64).round() as u64),
        |failures| {
            if !failures.is_empty() {
                error!("{} photos could not be exported", failures.len());
            }
        },
    )?;
    let report = job.wait()?;
    bar.finish_and_clear();

    for failure in &report.failures {
        println!("{}", failure);
    }
    println!(
        "Exported {}/{} photos ({} already present, {} failed)",
        report.exported,
        report.total,
        report.skipped,
        report.failures.len()
    );
    Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn select_photos(archive: &Archive, year: Option<i32>) -> Result<Vec<Photo>, ArchiveError> {
    let photos = archive.fetch_all_photos()?;
    Ok(match year {
        Some(year) => photos.into_iter().filter(|photo| photo.year == year).collect(),
        None => photos,
    })
}

fn present_photo_row(photo: &Photo) -> String {
    let taken = photo
        .taken_at()
        .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let pair = |a: &Option<String>, b: &Option<String>| match (a.as_deref(), b.as_deref()) {
        (None, None) => "-".to_string(),
        (a, b) => format!("{}/{}", a.unwrap_or("-"), b.unwrap_or("-")),
    };
    format!(
        "{}\t{}\t{}\t{}\t{}",
        photo.pid_hex(),
        taken,
        photo.year,
        pair(&photo.source_type, &photo.source_name),
        pair(&photo.device_type, &photo.device_name)
    )
}

/// Hidden when asked or when stdout is not a terminal.
fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_rows_are_tab_separated() {
        let photo = Photo {
            pid: vec![0xab, 0xcd],
            timestamp: Some(1_339_749_005),
            year: 2012,
            source_type: Some("iphoto".to_string()),
            device_name: Some("iPhone 4S".to_string()),
            ..Photo::default()
        };
        assert_eq!(
            present_photo_row(&photo),
            "abcd\t2012-06-15 08:30:05\t2012\tiphoto/-\t-/iPhone 4S"
        );
        let undated = Photo { pid: vec![1], ..Photo::default() };
        assert_eq!(present_photo_row(&undated), "01\t-\t0\t-\t-");
    }
}

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use everpix_export::{
    logging,
    verify::{find_untracked, verify_export},
    Archive,
};
use log::error;

/// Verify an exported folder against the archive it came from
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct VerifyCli {
    /// The archive directory the photos were exported from
    #[clap(env = "EVERPIX_ARCHIVE")]
    archive: PathBuf,
    /// The export folder to check
    #[clap(env = "EVERPIX_EXPORT_DIR")]
    dest: PathBuf,
    /// Only check photos from this year
    #[clap(short, long)]
    year: Option<i32>,
    /// Also list files in the export folder that no photo accounts for
    #[clap(short, long, default_value_t = false)]
    untracked: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = VerifyCli::parse();
    logging::init_logging();

    let archive = match Archive::open(&args.archive) {
        Ok(archive) => archive,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
    };
    let photos = match archive.fetch_all_photos() {
        Ok(photos) => photos
            .into_iter()
            .filter(|photo| args.year.map_or(true, |year| photo.year == year))
            .collect::<Vec<_>>(),
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
    };

    let entries = verify_export(&archive, &photos, &args.dest);
    let mut problems = 0;
    for entry in &entries {
        println!("{}", entry);
        if !entry.is_ok() {
            problems += 1;
        }
    }
    println!("Done verifying {} photos, {} problems", entries.len(), problems);

    if args.untracked {
        match find_untracked(&args.dest, &entries) {
            Ok(untracked) => {
                for path in &untracked {
                    println!("Error: file not found in archive {}", path.display());
                }
                problems += untracked.len();
            }
            Err(e) => {
                error!("{}", e);
                return ExitCode::from(1);
            }
        }
    }

    if problems == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

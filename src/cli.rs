use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Export the photos of an Everpix archive into a dated folder tree.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Mode to run
    #[clap(subcommand)]
    pub mode: Mode,
    /// The archive directory holding archive.sqlite
    #[clap(short, long, env = "EVERPIX_ARCHIVE", default_value = "everpix")]
    pub archive: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Show the archive owner
    Info,
    /// List the photos in the archive
    List {
        /// Only list photos from this year
        #[clap(short, long)]
        year: Option<i32>,
    },
    /// Export photos into a destination folder
    Export {
        /// The folder to export into
        #[clap(env = "EVERPIX_EXPORT_DIR")]
        dest: PathBuf,
        /// Only export photos from this year
        #[clap(short, long)]
        year: Option<i32>,
        /// Report what would be written without touching the destination
        #[clap(short = 'n', long, default_value_t = false)]
        dry_run: bool,
        /// Replace files that differ from the archive copy
        #[clap(long, default_value_t = false)]
        overwrite: bool,
        /// Number of export threads
        #[clap(short, long, env = "EVERPIX_THREADS")]
        threads: Option<usize>,
        /// Disable the progress bar
        #[clap(long, default_value_t = false)]
        no_progress_bar: bool,
    },
}

impl Cli {
    /// Loads a `.env` file if present, then parses the command line.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_flags() {
        let cli = Cli::try_parse_from([
            "everpix", "--archive", "/a", "export", "/out", "--year", "2012", "-n", "-t", "3",
        ])
        .unwrap();
        assert_eq!(cli.archive, PathBuf::from("/a"));
        match cli.mode {
            Mode::Export { dest, year, dry_run, overwrite, threads, no_progress_bar } => {
                assert_eq!(dest, PathBuf::from("/out"));
                assert_eq!(year, Some(2012));
                assert!(dry_run);
                assert!(!overwrite);
                assert_eq!(threads, Some(3));
                assert!(!no_progress_bar);
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["everpix", "import"]).is_err());
    }
}

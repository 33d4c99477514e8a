mod cli;

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::process;

use imagefs::{plan_image, write_image, DirWalker, Geometry, Image, ImageError};
use log::{error, info, warn, LevelFilter};

fn run(args: &cli::Cli) -> Result<(), ImageError> {
    // The output is only touched once every source file has been found.
    let (table, layout) = plan_image(&DirWalker, &args.source, Geometry::default())?;

    let dest = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&args.output)?;
    let (summary, dev) = match write_image(&table, &layout, dest) {
        Ok(built) => built,
        Err(e) => {
            if let Err(rm) = fs::remove_file(&args.output) {
                warn!("could not remove partial image {:?}: {}", args.output, rm);
            }
            return Err(e);
        }
    };
    info!(
        "{:?}: {} files embedded, first free sector {}",
        args.output, summary.file_count, summary.first_free_sector
    );

    if !args.no_verify {
        let image = Image::open(dev)?;
        // Every collected file plus the swap file.
        let visible = image.entries().count();
        if visible != summary.file_count + 1 {
            error!(
                "root directory lists {} entries, expected {}",
                visible,
                summary.file_count + 1
            );
            process::exit(1);
        }
        info!("Verified {} directory entries", visible);
    }
    Ok(())
}

fn main() {
    let args = cli::Cli::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    if let Err(e) = run(&args) {
        error!("{}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            error!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(source: PathBuf, output: PathBuf) -> cli::Cli {
        cli::Cli {
            source,
            output,
            verbose: false,
            no_verify: false,
        }
    }

    #[test]
    fn missing_source_creates_no_image() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("disk.img");

        let result = run(&args(dir.path().join("user"), output.clone()));
        assert!(matches!(result, Err(ImageError::SourceUnreadable { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn builds_and_verifies_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("user");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("prog"), b"\x7fELF").unwrap();
        let output = dir.path().join("disk.img");

        run(&args(source, output.clone())).unwrap();
        assert_eq!(
            fs::metadata(&output).unwrap().len(),
            imagefs::config::DISK_SIZE as u64
        );
    }
}

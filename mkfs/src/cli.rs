use std::path::PathBuf;

use clap::Parser;
use imagefs::config::{DEFAULT_IMAGE_NAME, DEFAULT_SOURCE_DIR};

#[derive(Parser, Debug)]
#[command(
    name = "mkfs",
    about = "Pack user programs and test data into the kernel's disk image."
)]
pub struct Cli {
    /// Directory searched for files to embed.
    #[arg(short, long, default_value = DEFAULT_SOURCE_DIR)]
    pub source: PathBuf,

    /// Image to create. An existing file is overwritten.
    #[arg(short, long, default_value = DEFAULT_IMAGE_NAME)]
    pub output: PathBuf,

    /// Log where every region is placed.
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip reading the image back after writing it.
    #[arg(long)]
    pub no_verify: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_need_no_arguments() {
        let cli = Cli::try_parse_from(["mkfs"]).unwrap();
        assert_eq!(cli.source, PathBuf::from("user"));
        assert_eq!(cli.output, PathBuf::from("disk.img"));
        assert!(!cli.verbose);
        assert!(!cli.no_verify);
    }

    #[test]
    fn paths_can_be_overridden() {
        let cli = Cli::try_parse_from(["mkfs", "-s", "build/user", "--output", "out.img", "-v"])
            .unwrap();
        assert_eq!(cli.source, PathBuf::from("build/user"));
        assert_eq!(cli.output, PathBuf::from("out.img"));
        assert!(cli.verbose);
    }
}

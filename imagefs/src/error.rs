use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("too many files to embed: the inode table holds at most {max}")]
    CapacityExceeded { max: usize },
    #[error("cannot read source file {path:?}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("source file {path:?} changed size: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
    #[error("file name {name:?} does not fit a {max} byte directory entry")]
    NameTooLong { name: String, max: usize },
    #[error("{0:?} cannot be stored as a directory entry name")]
    InvalidName(String),
    #[error("two source files are both named {0:?}")]
    DuplicateName(String),
    #[error("file #{index} is too large for an inode ({size} bytes)")]
    FileTooLarge { index: usize, size: u64 },
    #[error("layout needs {needed} sectors but the disk has {available}")]
    DiskFull { needed: u64, available: u32 },
    #[error("invalid inode at sector {sector}: magic {magic:#010x}")]
    InvalidInode { sector: u32, magic: u32 },
    #[error("free map is {found} bytes, expected {expected}")]
    CorruptFreeMap { expected: usize, found: usize },
    #[error("found no file named {0:?}")]
    NotFound(String),
    #[error("disk image I/O failed")]
    Device(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ImageError>;

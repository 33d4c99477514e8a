//! Builds the flat disk image the kernel mounts as its root file system.
//!
//! # Layout
//! ==========================================================================
//! | Inodes (one per sector) | Free map | Root dir | File 0 .. File n | Swap |
//! ==========================================================================
//!
//! Files are collected from a source tree ([`collect`]), given sector ranges
//! ([`Layout::plan`]) and written in one pass ([`ImageWriter`]). [`Image`]
//! reads a finished image back.
mod alloc;
pub mod collect;
pub mod config;
mod dir;
mod error;
mod image;
pub mod io;
mod layout;
mod node;
mod writer;

use std::fs::File;
use std::path::Path;

pub use crate::alloc::{FreeMap, State};
pub use crate::collect::{collect, DirWalker, FileEnumerator, FileTable, SourceFile};
pub use crate::config::Geometry;
pub use crate::dir::{DirEntry, FileName};
pub use crate::error::{ImageError, Result};
pub use crate::image::Image;
pub use crate::layout::{Extent, Layout};
pub use crate::node::DiskInode;
pub use crate::writer::{BuildSummary, ImageWriter};

use crate::io::{FileBlockEmulator, FileBlockEmulatorBuilder};

/// Collects the files under `source` and lays them out. Nothing is written,
/// so a caller can defer creating the destination until this succeeds.
pub fn plan_image<E: FileEnumerator>(
    enumerator: &E,
    source: &Path,
    geometry: Geometry,
) -> Result<(FileTable, Layout)> {
    let table = collect(enumerator, source, &geometry)?;
    let layout = Layout::plan(&geometry, &table.sizes())?;
    Ok((table, layout))
}

/// Writes a planned image into `dest`, truncating it to the disk size first.
pub fn write_image(
    table: &FileTable,
    layout: &Layout,
    dest: File,
) -> Result<(BuildSummary, FileBlockEmulator)> {
    let dev = FileBlockEmulatorBuilder::from(dest)
        .with_disk_size(layout.geometry.disk_size)
        .build()?;
    let mut writer = ImageWriter::new(dev);
    let summary = writer.write(table, layout)?;
    Ok((summary, writer.into_inner()))
}

/// [`plan_image`] followed by [`write_image`].
pub fn build_image<E: FileEnumerator>(
    enumerator: &E,
    source: &Path,
    dest: File,
    geometry: Geometry,
) -> Result<(BuildSummary, FileBlockEmulator)> {
    let (table, layout) = plan_image(enumerator, source, geometry)?;
    write_image(&table, &layout, dest)
}

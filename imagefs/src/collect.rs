//! Discovers the files to embed in an image.
//!
//! Traversal is behind [`FileEnumerator`] so the selection rules and the
//! capacity checks do not depend on how the host lists a directory.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::Geometry;
use crate::dir::FileName;
use crate::error::{ImageError, Result};

/// Path suffixes embedded even though they contain a dot.
const SAMPLE_SUFFIX: &str = "sample.txt";
const ZEROS_SUFFIX: &str = "zeros";

/// Lists regular files below a directory.
pub trait FileEnumerator {
    /// Returns every regular file under `root`, at any depth. The order is
    /// up to the implementation but must be stable for a given tree.
    fn regular_files(&self, root: &Path) -> std::io::Result<Vec<PathBuf>>;
}

/// Recursive walk over `std::fs::read_dir`. Symlinks are not followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirWalker;

impl DirWalker {
    fn walk(&self, dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.walk(&entry.path(), out)?;
            } else if file_type.is_file() {
                out.push(entry.path());
            }
        }
        Ok(())
    }
}

impl FileEnumerator for DirWalker {
    fn regular_files(&self, root: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.walk(root, &mut files)?;
        Ok(files)
    }
}

/// Whether a file, given by its path relative to the source root, belongs
/// in the image: user programs have no extension, while test data files end
/// in `sample.txt` or `zeros`.
pub fn should_embed(relative: &Path) -> bool {
    let path = relative.to_string_lossy();
    !path.contains('.') || path.ends_with(SAMPLE_SUFFIX) || path.ends_with(ZEROS_SUFFIX)
}

/// A file selected for embedding.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: FileName,
    pub path: PathBuf,
    /// Size observed when the file was collected.
    pub size: u64,
}

impl SourceFile {
    /// Reads the whole file, checking it still has the collected size.
    pub fn read_contents(&self) -> Result<Vec<u8>> {
        let contents = std::fs::read(&self.path).map_err(|source| ImageError::SourceUnreadable {
            path: self.path.clone(),
            source,
        })?;
        if contents.len() as u64 != self.size {
            return Err(ImageError::SizeMismatch {
                path: self.path.clone(),
                expected: self.size,
                actual: contents.len() as u64,
            });
        }
        Ok(contents)
    }
}

/// Bounded, ordered set of files to embed. Position in the table decides the
/// inode number: entry `i` becomes inode `i + 2`.
#[derive(Debug, Clone)]
pub struct FileTable {
    files: Vec<SourceFile>,
    names: HashSet<FileName>,
    capacity: usize,
}

impl FileTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            files: Vec::new(),
            names: HashSet::new(),
            capacity,
        }
    }

    /// Appends a file, failing once the table is full or when the name is
    /// already taken.
    pub fn push(&mut self, file: SourceFile) -> Result<()> {
        if self.files.len() >= self.capacity {
            return Err(ImageError::CapacityExceeded { max: self.capacity });
        }
        if !self.names.insert(file.name.clone()) {
            return Err(ImageError::DuplicateName(file.name.to_string()));
        }
        self.files.push(file);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceFile> {
        self.files.iter()
    }

    pub fn sizes(&self) -> Vec<u64> {
        self.files.iter().map(|f| f.size).collect()
    }
}

/// Selects the files under `root` that go into the image.
///
/// Every selected file is opened once to make sure it is readable and to
/// record its size; the handle is dropped before returning.
pub fn collect<E: FileEnumerator>(
    enumerator: &E,
    root: &Path,
    geometry: &Geometry,
) -> Result<FileTable> {
    let paths = enumerator
        .regular_files(root)
        .map_err(|source| ImageError::SourceUnreadable {
            path: root.to_path_buf(),
            source,
        })?;

    let mut table = FileTable::with_capacity(geometry.max_files);
    for path in paths {
        let relative = path.strip_prefix(root).unwrap_or(path.as_path());
        if !should_embed(relative) {
            continue;
        }

        let unreadable = |source: std::io::Error| ImageError::SourceUnreadable {
            path: path.clone(),
            source,
        };
        let size = File::open(&path)
            .and_then(|f| f.metadata())
            .map_err(unreadable)?
            .len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!("Collect {:?} as {}, size = {}", path, name, size);
        table.push(SourceFile {
            name: FileName::new(name)?,
            path,
            size,
        })?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn source(name: &str) -> SourceFile {
        SourceFile {
            name: FileName::new(name).unwrap(),
            path: PathBuf::from(name),
            size: 0,
        }
    }

    #[test]
    fn selects_programs_and_test_data() {
        assert!(should_embed(Path::new("userprogs/args-none")));
        assert!(should_embed(Path::new("vm/sample.txt")));
        assert!(should_embed(Path::new("vm/child-sample.txt")));
        assert!(should_embed(Path::new("zeros")));
        assert!(!should_embed(Path::new("userprogs/args-none.c")));
        assert!(!should_embed(Path::new("lib/user.h")));
        assert!(!should_embed(Path::new("build.d/args-none")));
    }

    #[test]
    fn table_rejects_past_capacity() {
        let mut table = FileTable::with_capacity(2);
        table.push(source("a")).unwrap();
        table.push(source("b")).unwrap();

        match table.push(source("c")) {
            Err(ImageError::CapacityExceeded { max }) => assert_eq!(max, 2),
            _ => panic!("expected CapacityExceeded"),
        }
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn table_rejects_duplicate_names() {
        let mut table = FileTable::with_capacity(4);
        table.push(source("a")).unwrap();
        assert!(matches!(
            table.push(source("a")),
            Err(ImageError::DuplicateName(_))
        ));
    }

    #[test]
    fn collects_matching_files_with_sizes() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("userprogs")).unwrap();
        fs::write(root.path().join("userprogs/args-none"), vec![1; 10]).unwrap();
        fs::write(root.path().join("userprogs/args-none.c"), b"int main;").unwrap();
        fs::write(root.path().join("sample.txt"), vec![2; 600]).unwrap();

        let table = collect(&DirWalker, root.path(), &Geometry::default()).unwrap();

        let mut found: Vec<(String, u64)> = table
            .iter()
            .map(|f| (f.name.to_string(), f.size))
            .collect();
        found.sort();
        assert_eq!(
            found,
            vec![("args-none".to_string(), 10), ("sample.txt".to_string(), 600)]
        );
    }

    #[test]
    fn collecting_too_many_files_fails() {
        let root = tempfile::tempdir().unwrap();
        for i in 0..3 {
            fs::write(root.path().join(format!("prog{}", i)), b"x").unwrap();
        }
        let geo = Geometry {
            max_files: 2,
            ..Geometry::default()
        };

        assert!(matches!(
            collect(&DirWalker, root.path(), &geo),
            Err(ImageError::CapacityExceeded { max: 2 })
        ));
    }

    #[test]
    fn long_names_are_rejected() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("x".repeat(30)), b"x").unwrap();

        assert!(matches!(
            collect(&DirWalker, root.path(), &Geometry::default()),
            Err(ImageError::NameTooLong { .. })
        ));
    }

    #[test]
    fn missing_root_is_unreadable() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");

        assert!(matches!(
            collect(&DirWalker, &missing, &Geometry::default()),
            Err(ImageError::SourceUnreadable { .. })
        ));
    }

    /// Lists a fixed set of names whether or not they exist.
    struct Listed(&'static [&'static str]);

    impl FileEnumerator for Listed {
        fn regular_files(&self, root: &Path) -> std::io::Result<Vec<PathBuf>> {
            Ok(self.0.iter().map(|p| root.join(p)).collect())
        }
    }

    #[test]
    fn selected_file_that_cannot_be_opened_aborts() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("a"), b"x").unwrap();

        match collect(&Listed(&["a", "gone"]), root.path(), &Geometry::default()) {
            Err(ImageError::SourceUnreadable { path, source }) => {
                assert_eq!(path, root.path().join("gone"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("expected SourceUnreadable"),
        }
    }

    #[test]
    fn changed_file_is_a_size_mismatch() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("prog");
        fs::write(&path, vec![0; 10]).unwrap();
        let table = collect(&DirWalker, root.path(), &Geometry::default()).unwrap();

        fs::write(&path, vec![0; 11]).unwrap();
        let file = table.iter().next().unwrap();
        assert!(matches!(
            file.read_contents(),
            Err(ImageError::SizeMismatch {
                expected: 10,
                actual: 11,
                ..
            })
        ));
    }
}

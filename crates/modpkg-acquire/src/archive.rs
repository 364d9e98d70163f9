//! Zip archive validation and extraction.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use modpkg_core::AcquireError;

/// Smallest file accepted as a cached archive.
pub const MIN_ARCHIVE_SIZE: u64 = 100;

/// Light-weight check that a cached archive can be reused.
///
/// The file must exist, be at least [`MIN_ARCHIVE_SIZE`] bytes, open as a zip
/// archive and have a readable entry list. Entry contents are not verified;
/// deeper corruption surfaces when extracting.
pub fn is_cached_and_valid(path: &Path) -> bool {
    match check_archive(path) {
        Ok(entries) => {
            tracing::debug!(target: "modpkg.acquire", path = %path.display(), entries, "Cached archive is valid");
            true
        }
        Err(reason) => {
            if path.exists() {
                tracing::info!(target: "modpkg.acquire", path = %path.display(), reason, "Cached archive rejected");
            }
            false
        }
    }
}

fn check_archive(path: &Path) -> Result<usize, String> {
    let metadata = fs::metadata(path).map_err(|e| e.to_string())?;
    if !metadata.is_file() {
        return Err("not a file".to_string());
    }
    if metadata.len() < MIN_ARCHIVE_SIZE {
        return Err(format!("only {} bytes", metadata.len()));
    }
    let file = File::open(path).map_err(|e| e.to_string())?;
    let archive = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;
    Ok(archive.file_names().count())
}

/// What extraction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The archive was unpacked into the target.
    Extracted,
    /// The target already had content and was left untouched.
    AlreadyExtracted,
}

/// Extract `archive` into `target`.
///
/// A non-empty `target` is treated as already extracted. An empty one is
/// removed and re-created. When the archive has a single top-level directory
/// (as repository snapshots do) its content becomes the content of `target`.
///
/// Blocking; run it on a blocking thread.
pub fn extract_archive(archive: &Path, target: &Path) -> Result<ExtractOutcome, AcquireError> {
    if target.is_dir() {
        if fs::read_dir(target)?.next().is_some() {
            tracing::debug!(target: "modpkg.acquire", dir = %target.display(), "Already extracted");
            return Ok(ExtractOutcome::AlreadyExtracted);
        }
        fs::remove_dir(target)?;
    } else if target.exists() {
        fs::remove_file(target)?;
    }

    let parent = target
        .parent()
        .ok_or_else(|| AcquireError::other(format!("no parent for {}", target.display())))?;
    fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(parent)?;

    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| AcquireError::archive_invalid(archive, e.to_string()))?;
    zip.extract(staging.path())
        .map_err(|e| AcquireError::archive_invalid(archive, e.to_string()))?;

    let top_level: Vec<PathBuf> = fs::read_dir(staging.path())?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;

    match top_level.as_slice() {
        [single] if single.is_dir() => fs::rename(single, target)?,
        entries => {
            fs::create_dir(target)?;
            for entry in entries {
                if let Some(name) = entry.file_name() {
                    fs::rename(entry, target.join(name))?;
                }
            }
        }
    }

    tracing::info!(
        target: "modpkg.acquire",
        archive = %archive.display(),
        dir = %target.display(),
        "Archive extracted"
    );
    Ok(ExtractOutcome::Extracted)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    /// Build a zip shaped like a repository snapshot: one top-level
    /// directory holding the files.
    pub fn snapshot_zip(root: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.add_directory(format!("{root}/"), options).unwrap();
        for (name, content) in files {
            writer.start_file(format!("{root}/{name}"), options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// Build a zip with files at the top level.
    pub fn flat_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{flat_zip, snapshot_zip};
    use super::*;

    const README: &[u8] = b"# TEKSI Wastewater\n\nDatamodel and plugin for wastewater networks.\n";

    #[test]
    fn test_valid_archive_is_accepted() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("source.zip");
        fs::write(&path, snapshot_zip("tww-1.0", &[("README.md", README)])).unwrap();
        assert!(is_cached_and_valid(&path));
    }

    #[test]
    fn test_small_or_missing_archive_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("source.zip");
        assert!(!is_cached_and_valid(&path));

        fs::write(&path, b"PK\x05\x06").unwrap();
        assert!(!is_cached_and_valid(&path));
    }

    #[test]
    fn test_garbage_archive_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("source.zip");
        fs::write(&path, vec![0x42; 4096]).unwrap();
        assert!(!is_cached_and_valid(&path));
    }

    #[test]
    fn test_snapshot_root_becomes_target() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("source.zip");
        fs::write(
            &archive,
            snapshot_zip("tww-main", &[("README.md", README), ("sql/init.sql", b"select 1;")]),
        )
        .unwrap();
        let target = temp.path().join("src");

        let outcome = extract_archive(&archive, &target).unwrap();

        assert_eq!(outcome, ExtractOutcome::Extracted);
        assert_eq!(fs::read(target.join("README.md")).unwrap(), README);
        assert!(target.join("sql/init.sql").is_file());
        // No staging leftovers next to the target.
        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".extract-"))
            .collect();
        assert!(names.is_empty());
    }

    #[test]
    fn test_flat_archive_is_moved_as_is() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("plugin.zip");
        fs::write(&archive, flat_zip(&[("a.txt", b"a"), ("b.txt", b"b")])).unwrap();
        let target = temp.path().join("plugin");

        extract_archive(&archive, &target).unwrap();
        assert!(target.join("a.txt").is_file());
        assert!(target.join("b.txt").is_file());
    }

    #[test]
    fn test_non_empty_target_is_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("source.zip");
        fs::write(&archive, snapshot_zip("root", &[("new.txt", b"new")])).unwrap();
        let target = temp.path().join("src");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("old.txt"), b"old").unwrap();

        let outcome = extract_archive(&archive, &target).unwrap();
        assert_eq!(outcome, ExtractOutcome::AlreadyExtracted);
        assert!(!target.join("new.txt").exists());
    }

    #[test]
    fn test_empty_target_is_replaced() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("source.zip");
        fs::write(&archive, snapshot_zip("root", &[("new.txt", b"new")])).unwrap();
        let target = temp.path().join("src");
        fs::create_dir(&target).unwrap();

        let outcome = extract_archive(&archive, &target).unwrap();
        assert_eq!(outcome, ExtractOutcome::Extracted);
        assert!(target.join("new.txt").is_file());
    }

    #[test]
    fn test_corrupt_archive_fails_loudly() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("source.zip");
        fs::write(&archive, vec![0u8; 512]).unwrap();

        let err = extract_archive(&archive, &temp.path().join("src")).unwrap_err();
        assert!(matches!(err, AcquireError::ArchiveInvalid { .. }));
    }
}

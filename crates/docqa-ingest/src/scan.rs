//! Documents directory enumeration.

use crate::error::{IngestError, IngestResult};
use docqa_core::SourceFile;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// List the regular files directly inside `dir`, in enumeration order.
///
/// Sub-directories are not descended into. Symlinks are followed, so a link
/// to a file counts as a file. An entry that cannot be inspected (a dangling
/// link, say) is still listed so loading it reports the failure.
pub fn scan_directory(dir: &Path) -> IngestResult<Vec<SourceFile>> {
    if !dir.exists() {
        return Err(IngestError::DirectoryNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(IngestError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                match e.path() {
                    Some(path) if e.depth() == 1 => {
                        warn!("Cannot inspect {:?}: {}", path, e);
                        files.push(SourceFile::from_path(path)?);
                    }
                    _ => warn!("Skipping unreadable entry in {:?}: {}", dir, e),
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            debug!("Ignoring non-file entry: {:?}", entry.path());
            continue;
        }

        files.push(SourceFile::from_path(entry.path())?);
    }

    debug!("Scanned {:?}: {} file(s)", dir, files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_lists_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("Report.PDF"), "%PDF").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.txt"), "ignored").unwrap();

        let mut files = scan_directory(dir.path()).unwrap();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name, "Report.PDF");
        assert_eq!(files[0].extension, "pdf");
        assert_eq!(files[1].file_name, "notes.txt");
        assert!(files.iter().all(|f| f.exists && f.path.is_absolute()));
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = scan_directory(&missing).unwrap_err();
        assert!(matches!(err, IngestError::DirectoryNotFound(_)));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_scan_file_instead_of_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        let err = scan_directory(&file).unwrap_err();
        assert!(matches!(err, IngestError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_keeps_dangling_links() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.txt"), "hello").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.pdf"), dir.path().join("link.pdf"))
            .unwrap();

        let mut files = scan_directory(dir.path()).unwrap();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        assert_eq!(files.len(), 2);
        assert_eq!(files[1].file_name, "link.pdf");
        assert!(!files[1].exists);
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(scan_directory(dir.path()).unwrap().is_empty());
    }
}

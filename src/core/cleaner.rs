//! Cache directory cleaner.
//!
//! Scans and optionally deletes files under user cache directories.
//! Supports dry-run mode (simulation) and actual deletion with progress
//! tracking. Files that cannot be removed (in use, protected) are counted,
//! not fatal.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Cache directories for the current user.
pub fn default_cache_directories() -> Vec<PathBuf> {
    dirs::cache_dir().into_iter().collect()
}

/// Cache files cleaner
pub struct CacheCleaner {
    pub directories: Vec<PathBuf>,
}

/// Statistics from cleanup operations
#[derive(Debug, Default)]
pub struct CleanupStats {
    pub total_files: usize,
    pub total_size: u64,
    pub deleted_files: usize,
    pub deleted_size: u64,
    pub failed_files: usize,
}

impl CacheCleaner {
    /// Create a cleaner over the user's cache directories.
    pub fn new() -> Self {
        Self {
            directories: default_cache_directories(),
        }
    }

    /// Create a cleaner over explicit directories.
    pub fn with_directories(directories: Vec<PathBuf>) -> Self {
        Self { directories }
    }

    /// Scan the directories and count files without touching them.
    pub fn scan(&self) -> CleanupStats {
        let (total_files, total_size) = self
            .directories
            .iter()
            .map(|dir| scan_dir(dir))
            .fold((0, 0), |(files, bytes), (f, b)| (files + f, bytes + b));
        CleanupStats {
            total_files,
            total_size,
            ..Default::default()
        }
    }

    /// Clean cache files with a progress callback.
    ///
    /// # Arguments
    /// * `dry_run` - If true, only simulate deletion without deleting
    /// * `on_progress` - Called with (processed, total) for each file
    pub fn clean<F>(&self, dry_run: bool, on_progress: F) -> Result<CleanupStats>
    where
        F: Fn(usize, usize),
    {
        let mut stats = self.scan();
        let total = stats.total_files;
        let mut processed = 0usize;

        for dir in &self.directories {
            delete_files_recursive(dir, dry_run, &mut processed, total, &mut stats, &on_progress);
        }
        Ok(stats)
    }
}

impl Default for CacheCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk one directory tree, returning (file count, total bytes).
/// Unreadable directories and entries count as empty.
fn scan_dir(dir: &Path) -> (usize, u64) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return (0, 0),
    };
    entries
        .flatten()
        .filter_map(|entry| entry.metadata().ok().map(|meta| (entry.path(), meta)))
        .fold((0, 0), |(files, bytes), (path, meta)| {
            if meta.is_dir() {
                let (f, b) = scan_dir(&path);
                (files + f, bytes + b)
            } else if meta.is_file() {
                (files + 1, bytes + meta.len())
            } else {
                (files, bytes)
            }
        })
}

fn delete_files_recursive<F>(
    dir: &Path,
    dry_run: bool,
    processed: &mut usize,
    total: usize,
    stats: &mut CleanupStats,
    on_progress: &F,
) where
    F: Fn(usize, usize),
{
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    *processed += 1;
                    on_progress(*processed, total);

                    if dry_run {
                        stats.deleted_files += 1;
                        stats.deleted_size += metadata.len();
                    } else {
                        match fs::remove_file(entry.path()) {
                            Ok(_) => {
                                stats.deleted_files += 1;
                                stats.deleted_size += metadata.len();
                            }
                            Err(_) => {
                                stats.failed_files += 1;
                            }
                        }
                    }
                } else if metadata.is_dir() {
                    delete_files_recursive(
                        &entry.path(),
                        dry_run,
                        processed,
                        total,
                        stats,
                        on_progress,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn populate(dir: &Path) {
        let sub = dir.join("app");
        fs::create_dir_all(&sub).unwrap();
        for (name, content) in [("a.tmp", "aaaa"), ("b.tmp", "bb")] {
            let mut f = File::create(sub.join(name)).unwrap();
            f.write_all(content.as_bytes()).unwrap();
        }
    }

    #[test]
    fn test_scan_counts_files_and_sizes() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path());
        let cleaner = CacheCleaner::with_directories(vec![tmp.path().to_path_buf()]);
        let stats = cleaner.scan();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 6);
    }

    #[test]
    fn test_scan_descends_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let deep = tmp.path().join("app").join("v2").join("blobs");
        fs::create_dir_all(&deep).unwrap();
        File::create(deep.join("chunk"))
            .unwrap()
            .write_all(b"12345678")
            .unwrap();
        File::create(tmp.path().join("top.tmp"))
            .unwrap()
            .write_all(b"xyz")
            .unwrap();

        let cleaner = CacheCleaner::with_directories(vec![tmp.path().to_path_buf()]);
        let stats = cleaner.scan();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 11);
    }

    #[test]
    fn test_dry_run_deletes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path());
        let cleaner = CacheCleaner::with_directories(vec![tmp.path().to_path_buf()]);
        let stats = cleaner.clean(true, |_, _| {}).unwrap();
        assert_eq!(stats.deleted_files, 2);
        assert_eq!(cleaner.scan().total_files, 2);
    }

    #[test]
    fn test_clean_removes_files_and_reports_progress() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path());
        let cleaner = CacheCleaner::with_directories(vec![tmp.path().to_path_buf()]);
        let progressed = std::sync::atomic::AtomicUsize::new(0);
        let stats = cleaner
            .clean(false, |processed, total| {
                assert!(processed <= total);
                progressed.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(stats.deleted_files, 2);
        assert_eq!(stats.deleted_size, 6);
        assert_eq!(progressed.load(std::sync::atomic::Ordering::Relaxed), 2);
        assert_eq!(cleaner.scan().total_files, 0);
    }

    #[test]
    fn test_missing_directory_is_empty_scan() {
        let cleaner =
            CacheCleaner::with_directories(vec![PathBuf::from("/nonexistent/macperf-test")]);
        assert_eq!(cleaner.scan().total_files, 0);
    }
}

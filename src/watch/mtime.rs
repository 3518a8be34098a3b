//! Modification-time change detector
//!
//! Watches a small, explicitly enumerated list of paths; no directory walk.
//! Cheap enough to poll every supervisor tick. False positives (an mtime
//! touch with unchanged content) only cost a restart of a local process, so
//! precision is traded for speed here.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Watch set over an explicit path list, keyed by path.
pub struct MtimeWatcher {
    paths: Vec<PathBuf>,
    mtimes: HashMap<PathBuf, SystemTime>,
}

impl MtimeWatcher {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            mtimes: HashMap::new(),
        }
    }

    /// Paths this watcher was configured with.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Record current mtimes without reporting changes.
    pub fn scan(&mut self) {
        for path in &self.paths {
            if let Some(mtime) = modified(path) {
                self.mtimes.insert(path.clone(), mtime);
            }
        }
    }

    /// Return the paths whose mtime differs from the last recorded value,
    /// updating the record for each as a side effect.
    ///
    /// A path that does not exist is silently skipped: not an error and not
    /// a change. A path seen for the first time records its mtime without
    /// reporting a change.
    pub fn check(&mut self) -> Vec<PathBuf> {
        let mut changed = Vec::new();

        for path in &self.paths {
            let Some(current) = modified(path) else {
                continue;
            };

            match self.mtimes.get(path) {
                Some(previous) if *previous != current => {
                    self.mtimes.insert(path.clone(), current);
                    changed.push(path.clone());
                }
                Some(_) => {}
                None => {
                    self.mtimes.insert(path.clone(), current);
                }
            }
        }

        changed
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, FileTimes};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Bump a file's mtime without touching its contents.
    fn touch(path: &Path) {
        let file = File::options().write(true).open(path).unwrap();
        let later = SystemTime::now() + Duration::from_secs(5);
        file.set_times(FileTimes::new().set_modified(later)).unwrap();
    }

    #[test]
    fn test_touch_detected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("server.py");
        fs::write(&file, "print('hi')").unwrap();

        let mut watcher = MtimeWatcher::new(vec![file.clone()]);
        watcher.scan();
        assert!(watcher.check().is_empty());

        touch(&file);
        assert_eq!(watcher.check(), vec![file]);
        // Recorded value was refreshed: stable until the next touch.
        assert!(watcher.check().is_empty());
    }

    #[test]
    fn test_missing_path_silently_skipped() {
        let dir = TempDir::new().unwrap();
        let ghost = dir.path().join("not-there");

        let mut watcher = MtimeWatcher::new(vec![ghost]);
        watcher.scan();
        assert!(watcher.check().is_empty());
    }

    #[test]
    fn test_first_sighting_is_not_a_change() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("late.cfg");

        let mut watcher = MtimeWatcher::new(vec![file.clone()]);
        watcher.scan();

        // File appears after the initial scan: its first observed mtime is
        // recorded quietly, only subsequent edits count.
        fs::write(&file, "x").unwrap();
        assert!(watcher.check().is_empty());

        touch(&file);
        assert_eq!(watcher.check(), vec![file]);
    }

    #[test]
    fn test_only_changed_subset_reported() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let mut watcher = MtimeWatcher::new(vec![a.clone(), b.clone()]);
        watcher.scan();

        touch(&b);
        assert_eq!(watcher.check(), vec![b]);
    }
}

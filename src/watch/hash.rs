//! Content-hash change detector
//!
//! Walks a directory tree for files with watched extensions and keeps a
//! SHA-256 digest per path. A check re-fingerprints everything known, evicts
//! deleted paths, and discovers new ones. Digest comparison means an editor
//! rewriting a file verbatim (mtime-only touch) does not count as a change,
//! so polling this detector never triggers a spurious browser reload.

use colored::Colorize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::console::timestamp;

/// Extensions watched by default: markup, script, style, and common images.
pub const WATCH_EXTENSIONS: &[&str] = &["html", "js", "css", "png", "jpg", "jpeg", "gif", "svg"];

type Fingerprint = [u8; 32];

/// Watch set keyed by path, owned by one consumer.
///
/// Construct once, prime with [`scan`](Self::scan), then poll with
/// [`check`](Self::check). Unreadable files are not an error for this
/// detector: they are simply omitted from the set.
pub struct HashWatcher {
    root: PathBuf,
    extensions: Vec<String>,
    files: HashMap<PathBuf, Fingerprint>,
}

impl HashWatcher {
    /// Create a watcher over `root` with the default extension list.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_extensions(root, WATCH_EXTENSIONS)
    }

    /// Create a watcher over `root` with an explicit extension list.
    pub fn with_extensions(root: impl Into<PathBuf>, extensions: &[&str]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
            files: HashMap::new(),
        }
    }

    /// Number of files currently watched.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Prime the watch set from the current tree without reporting changes.
    pub fn scan(&mut self) {
        for path in self.walk() {
            if let Some(fp) = fingerprint(&path) {
                self.files.insert(path, fp);
            }
        }
    }

    /// Check for changes since the last call.
    ///
    /// Returns `true` if at least one watched file changed, disappeared, or
    /// appeared. The watch set is updated to the new ground truth as a side
    /// effect, so an immediately repeated call with no further edits returns
    /// `false`.
    pub fn check(&mut self) -> bool {
        let mut changed = false;

        // Pass 1: re-fingerprint everything we already know about.
        let known: Vec<PathBuf> = self.files.keys().cloned().collect();
        for path in known {
            if path.exists() {
                match fingerprint(&path) {
                    Some(fp) => {
                        if self.files.get(&path) != Some(&fp) {
                            println!(
                                "{}",
                                format!("[{}] FILE CHANGED: {}", timestamp(), path.display())
                                    .yellow()
                            );
                            self.files.insert(path, fp);
                            changed = true;
                        }
                    }
                    // Became unreadable: drop it from the set. If it turns
                    // readable again it will be re-discovered below.
                    None => {
                        self.files.remove(&path);
                    }
                }
            } else {
                println!(
                    "{}",
                    format!("[{}] FILE DELETED: {}", timestamp(), path.display()).red()
                );
                self.files.remove(&path);
                changed = true;
            }
        }

        // Pass 2: discover files that appeared since the last check.
        for path in self.walk() {
            if !self.files.contains_key(&path) {
                if let Some(fp) = fingerprint(&path) {
                    println!(
                        "{}",
                        format!("[{}] NEW FILE: {}", timestamp(), path.display()).green()
                    );
                    self.files.insert(path, fp);
                    changed = true;
                }
            }
        }

        changed
    }

    /// Recursively collect watchable files under the root.
    ///
    /// Skips any path with a hidden (dot-prefixed) segment relative to the
    /// root. Directory read errors are treated as "nothing there".
    fn walk(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        self.walk_dir(&self.root, &mut found);
        found
    }

    fn walk_dir(&self, dir: &Path, found: &mut Vec<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if is_hidden(&path) {
                continue;
            }
            if path.is_dir() {
                self.walk_dir(&path, found);
            } else if self.is_watchable(&path) {
                found.push(path);
            }
        }
    }

    fn is_watchable(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|w| w == &e.to_lowercase()))
            .unwrap_or(false)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// SHA-256 digest of a file's contents, or `None` if it cannot be read.
fn fingerprint(path: &Path) -> Option<Fingerprint> {
    let contents = fs::read(path).ok()?;
    Some(Sha256::digest(&contents).into())
}

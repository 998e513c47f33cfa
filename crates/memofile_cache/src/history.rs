//! The persistent call index.
//!
//! The index (the "history") is stored as `history.json` in the cache
//! directory: a single JSON object mapping call-pattern strings to the
//! absolute paths of their result artifacts. It is loaded fully into memory
//! at engine construction and rewritten in full on every mutation, before
//! the memoized call returns.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::CacheError;

/// Name of the index file within the cache directory.
pub const HISTORY_FILE: &str = "history.json";

/// The persistent index mapping call patterns to result artifact paths.
///
/// Entries are unique per pattern; recording an existing pattern replaces
/// its entry (last write wins). Entries are never pruned automatically: an
/// entry whose artifact has been deleted simply stops matching on lookup and
/// is superseded by the next miss for that pattern.
#[derive(Debug)]
pub struct History {
    /// Path of the backing `history.json` file.
    path: PathBuf,

    /// In-memory copy of the index, authoritative between saves.
    entries: HashMap<String, PathBuf>,
}

impl History {
    /// Loads the index from `history.json` inside `working_dir`, writing an
    /// empty JSON object there first if the file does not exist.
    ///
    /// A present-but-unparsable index is fatal: corruption propagates as
    /// [`CacheError::IndexParse`] rather than silently starting fresh, so an
    /// operator never loses a populated cache to a typo in a hand edit.
    pub fn load_or_init(working_dir: &Path) -> Result<Self, CacheError> {
        let path = working_dir.join(HISTORY_FILE);

        if !path.is_file() {
            std::fs::write(&path, "{}").map_err(|e| CacheError::Io {
                path: path.clone(),
                source: e,
            })?;
            return Ok(Self {
                path,
                entries: HashMap::new(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;
        let entries = serde_json::from_str(&content).map_err(|e| CacheError::IndexParse {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { path, entries })
    }

    /// Looks up the result path recorded for a call pattern.
    pub fn lookup(&self, pattern: &str) -> Option<&Path> {
        self.entries.get(pattern).map(PathBuf::as_path)
    }

    /// Returns `true` if the index has an entry for the pattern, whether or
    /// not its artifact still exists.
    pub fn contains(&self, pattern: &str) -> bool {
        self.entries.contains_key(pattern)
    }

    /// Records (or replaces) an entry and persists the whole index to disk.
    ///
    /// The index file is overwritten in full. There is no coordination with
    /// other writers; with a single engine per directory, as supported, the
    /// last successful write wins.
    pub fn record(&mut self, pattern: &str, result_path: &Path) -> Result<(), CacheError> {
        self.entries
            .insert(pattern.to_string(), result_path.to_path_buf());
        self.save()
    }

    /// Number of entries currently in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<(), CacheError> {
        let json =
            serde_json::to_string_pretty(&self.entries).map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        std::fs::write(&self.path, json).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

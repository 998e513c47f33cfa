//! The memoization engine.
//!
//! `FileCache` owns one cache directory and its `history.json` index and
//! implements the hit/miss protocol: derive a call pattern from the function
//! name and scalar arguments, return the stored result when the index knows
//! the pattern and its artifact file still exists, and otherwise invoke the
//! wrapped function, persist its result, and update the index. Deleting a
//! result file is the supported way to force a refresh; the stale index
//! entry is superseded on the next miss.

use std::cell::RefCell;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, MemoError};
use crate::history::History;
use crate::pattern::{make_call_pattern, CallArgs, KeyDerivation};

/// Default cache directory name, relative to the current working directory.
pub const DEFAULT_DIR_NAME: &str = "file_cache";

/// File extension for result artifacts.
const RESULT_EXT: &str = "json";

/// Disk-persisted memoization engine for expensive function calls.
///
/// One engine instance exclusively owns one cache directory, its
/// `history.json` index, and one result artifact per distinct call pattern.
/// All I/O is synchronous and happens on the calling thread; there is no
/// locking, so sharing a directory between processes is outside the
/// supported model (last writer wins).
///
/// Only scalar arguments (strings, integers, floats, booleans) participate
/// in cache keys, and results must be JSON-serializable. Two calls that
/// differ only in a non-scalar argument share a key under the default
/// [`KeyDerivation::Lenient`] mode; use [`KeyDerivation::Strict`] to reject
/// such calls instead.
#[derive(Debug)]
pub struct FileCache {
    /// Absolute path of the cache directory.
    working_dir: PathBuf,

    /// The persistent call index, loaded in full at construction.
    history: History,

    /// How call patterns treat non-scalar arguments.
    key_derivation: KeyDerivation,
}

impl FileCache {
    /// Opens (or creates) a cache directory and loads its index.
    ///
    /// A relative `dir_name` resolves against the process's current working
    /// directory; an absolute path is used as-is. The directory and an empty
    /// `history.json` are created if absent. Construction fails outright if
    /// the directory cannot be created or the index cannot be read and
    /// parsed; no degraded engine is returned.
    pub fn new(dir_name: impl AsRef<Path>) -> Result<Self, CacheError> {
        Self::with_key_derivation(dir_name, KeyDerivation::default())
    }

    /// Opens the conventional cache directory, [`DEFAULT_DIR_NAME`] under
    /// the current working directory.
    pub fn open_default() -> Result<Self, CacheError> {
        Self::new(DEFAULT_DIR_NAME)
    }

    /// Like [`FileCache::new`], selecting the key-derivation mode.
    pub fn with_key_derivation(
        dir_name: impl AsRef<Path>,
        key_derivation: KeyDerivation,
    ) -> Result<Self, CacheError> {
        let cwd = std::env::current_dir().map_err(|e| CacheError::Io {
            path: PathBuf::from("."),
            source: e,
        })?;
        let working_dir = cwd.join(dir_name.as_ref());

        std::fs::create_dir_all(&working_dir).map_err(|e| CacheError::Io {
            path: working_dir.clone(),
            source: e,
        })?;
        let history = History::load_or_init(&working_dir)?;

        Ok(Self {
            working_dir,
            history,
            key_derivation,
        })
    }

    /// The absolute path of the cache directory.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The current in-memory index.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Derives the call pattern for a call under this engine's mode.
    pub fn call_pattern(&self, func_name: &str, args: &CallArgs) -> Result<String, CacheError> {
        make_call_pattern(func_name, args, self.key_derivation)
    }

    /// The path at which the result artifact for a pattern is stored.
    pub fn result_path(&self, pattern: &str) -> PathBuf {
        self.working_dir.join(format!("{pattern}.{RESULT_EXT}"))
    }

    /// Reads the stored result for a pattern, if one is usable.
    ///
    /// Returns `Ok(None)` when the index has no entry for the pattern or
    /// the referenced artifact no longer exists on disk. An artifact that
    /// exists but fails to parse is a fatal [`CacheError::ResultParse`].
    pub fn load_cached<T: DeserializeOwned>(&self, pattern: &str) -> Result<Option<T>, CacheError> {
        match self.history.lookup(pattern) {
            Some(fp) if fp.is_file() => read_result(fp).map(Some),
            // A deleted artifact downgrades the entry to a miss; the stale
            // index entry is overwritten on the next store.
            _ => Ok(None),
        }
    }

    /// Memoizes one call of an infallible function.
    ///
    /// On a hit the stored artifact is read and parsed and `func` is not
    /// invoked; a stored-but-unparsable artifact is a fatal
    /// [`CacheError::ResultParse`] for this call. On a miss `func` runs, its
    /// result is written to `<pattern>.json`, and the index is updated in
    /// memory and on disk before the call returns.
    pub fn cached<T, F>(&mut self, func_name: &str, args: &CallArgs, func: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.try_cached(func_name, args, || Ok::<_, Infallible>(func())) {
            Ok(value) => Ok(value),
            Err(MemoError::Cache(e)) => Err(e),
            Err(MemoError::Call(never)) => match never {},
        }
    }

    /// Memoizes one call of a fallible function.
    ///
    /// Identical to [`FileCache::cached`] except that an `Err` from `func`
    /// propagates unchanged as [`MemoError::Call`] and leaves no cache state
    /// behind: neither the artifact nor the index entry is written for a
    /// failed call.
    pub fn try_cached<T, E, F>(
        &mut self,
        func_name: &str,
        args: &CallArgs,
        func: F,
    ) -> Result<T, MemoError<E>>
    where
        T: Serialize + DeserializeOwned,
        E: std::error::Error,
        F: FnOnce() -> Result<T, E>,
    {
        let pattern = self.call_pattern(func_name, args)?;

        if let Some(value) = self.load_cached(&pattern)? {
            return Ok(value);
        }

        let value = func().map_err(MemoError::Call)?;
        self.store_result(&pattern, &value)?;
        Ok(value)
    }

    /// Wraps the engine for sharing between several [`Memoized`] callables.
    pub fn into_shared(self) -> Rc<RefCell<FileCache>> {
        Rc::new(RefCell::new(self))
    }

    fn store_result<T: Serialize>(&mut self, pattern: &str, value: &T) -> Result<(), CacheError> {
        let path = self.result_path(pattern);
        let json = serde_json::to_string_pretty(value).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;
        self.history.record(pattern, &path)
    }
}

fn read_result<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
    let content = std::fs::read_to_string(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| CacheError::ResultParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// A memoizing wrapper around one callable.
///
/// The higher-order counterpart of applying a caching decorator: it pairs a
/// shared engine with a function name and a callable and exposes the same
/// calling convention (`call(&CallArgs)`) with hit/miss behavior. Several
/// wrappers may share one engine via [`FileCache::into_shared`]; the engine
/// stays single-threaded (`Rc`, not `Arc`).
pub struct Memoized<F> {
    cache: Rc<RefCell<FileCache>>,
    func_name: String,
    func: F,
}

impl<F> Memoized<F> {
    /// Binds a callable to a shared engine under the given function name.
    ///
    /// The name becomes the leading segment of every call pattern this
    /// wrapper derives, so it should be unique per wrapped function within
    /// one cache directory.
    pub fn new(cache: Rc<RefCell<FileCache>>, func_name: impl Into<String>, func: F) -> Self {
        Self {
            cache,
            func_name: func_name.into(),
            func,
        }
    }

    /// Invokes the wrapped callable through the cache.
    ///
    /// The engine is only borrowed for the hit check and for storing the
    /// result, never across the wrapped call itself, so the wrapped function
    /// may invoke other wrappers sharing the same engine.
    pub fn call<T>(&self, args: &CallArgs) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&CallArgs) -> T,
    {
        let pattern = self.cache.borrow().call_pattern(&self.func_name, args)?;
        if let Some(value) = self.cache.borrow().load_cached(&pattern)? {
            return Ok(value);
        }

        let value = (self.func)(args);
        self.cache.borrow_mut().store_result(&pattern, &value)?;
        Ok(value)
    }

    /// Invokes the wrapped fallible callable through the cache.
    ///
    /// Borrow discipline as in [`Memoized::call`]; an `Err` from the
    /// wrapped callable propagates unchanged and writes no cache state.
    pub fn try_call<T, E>(&self, args: &CallArgs) -> Result<T, MemoError<E>>
    where
        T: Serialize + DeserializeOwned,
        E: std::error::Error,
        F: Fn(&CallArgs) -> Result<T, E>,
    {
        let pattern = self.cache.borrow().call_pattern(&self.func_name, args)?;
        if let Some(value) = self.cache.borrow().load_cached::<T>(&pattern)? {
            return Ok(value);
        }

        let value = (self.func)(args).map_err(MemoError::Call)?;
        self.cache.borrow_mut().store_result(&pattern, &value)?;
        Ok(value)
    }
}

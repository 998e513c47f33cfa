//! Disk-persisted memoization for expensive function calls.
//!
//! This crate caches the JSON-serializable results of function calls keyed by
//! a human-readable call pattern derived from the function's name and its
//! scalar arguments. Results are stored as one JSON file per distinct call
//! and survive process restarts; deleting a result file forces a refresh on
//! the next call.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod history;
pub mod pattern;

pub use cache::{FileCache, Memoized, DEFAULT_DIR_NAME};
pub use error::{CacheError, MemoError};
pub use history::History;
pub use pattern::{make_call_pattern, ArgValue, CallArgs, KeyDerivation};

//! Error types for the memoization engine.

use std::path::PathBuf;

/// Errors raised by the memoization engine itself.
///
/// The engine performs no retries and no silent recovery: setup failures
/// abort construction, and corruption of the index or of a result artifact
/// is fatal for the affected call rather than auto-repaired.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while creating, reading, or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The index file exists but is not a valid JSON object.
    #[error("failed to parse cache index {path}: {reason}")]
    IndexParse {
        /// The index file path.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A result artifact exists but is not valid JSON.
    #[error("failed to parse cached result {path}: {reason}")]
    ResultParse {
        /// The result artifact path.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A value could not be serialized to JSON for storage.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A non-scalar argument was passed under strict key derivation.
    #[error("non-scalar {position} argument in call to `{func_name}` rejected by strict key derivation")]
    OpaqueArgument {
        /// Name of the function being memoized.
        func_name: String,
        /// Which argument was opaque (e.g. `positional #2` or a keyword name).
        position: String,
    },
}

/// The outcome of memoizing a fallible call: either the engine failed, or
/// the wrapped call itself did.
///
/// A wrapped-call failure propagates unchanged as [`MemoError::Call`]; no
/// cache state is written for that call pattern.
#[derive(Debug, thiserror::Error)]
pub enum MemoError<E: std::error::Error> {
    /// The engine failed (I/O, corruption, or key derivation).
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The wrapped function returned an error.
    #[error(transparent)]
    Call(E),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/file_cache/history.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("history.json"));
    }

    #[test]
    fn index_parse_display() {
        let err = CacheError::IndexParse {
            path: PathBuf::from("history.json"),
            reason: "unexpected EOF".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache index"));
        assert!(msg.contains("unexpected EOF"));
    }

    #[test]
    fn result_parse_display() {
        let err = CacheError::ResultParse {
            path: PathBuf::from("fetch(1).json"),
            reason: "trailing characters".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cached result"));
        assert!(msg.contains("fetch(1).json"));
    }

    #[test]
    fn opaque_argument_display() {
        let err = CacheError::OpaqueArgument {
            func_name: "fetch_orders".to_string(),
            position: "positional #2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fetch_orders"));
        assert!(msg.contains("positional #2"));
    }

    #[test]
    fn memo_error_from_cache_error() {
        let cache_err = CacheError::Serialization {
            reason: "bad value".to_string(),
        };
        let err: MemoError<std::io::Error> = cache_err.into();
        assert!(matches!(err, MemoError::Cache(_)));
        assert!(err.to_string().contains("bad value"));
    }

    #[test]
    fn memo_error_call_is_transparent() {
        let inner = std::io::Error::new(std::io::ErrorKind::TimedOut, "request timed out");
        let err: MemoError<std::io::Error> = MemoError::Call(inner);
        assert_eq!(err.to_string(), "request timed out");
    }
}

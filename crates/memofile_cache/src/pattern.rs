//! Call-pattern key derivation.
//!
//! A call pattern is the human-readable string key for one (function,
//! arguments) pair, e.g. `fetch_order(acme, 42, region=eu)`. It serves both
//! as the index key and as the stem of the result artifact's file name, so
//! an operator can tell from a directory listing which call produced which
//! file.

use std::fmt;

use crate::error::CacheError;

/// A single call argument as seen by key derivation.
///
/// Only scalar values participate in the call pattern. [`ArgValue::Opaque`]
/// stands in for any non-scalar argument (maps, lists, structs): under
/// lenient derivation it is omitted from the pattern entirely, so two calls
/// differing only in an opaque argument share a pattern and collide. This is
/// a documented limitation of the keying scheme, not a defect.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// A string argument, rendered verbatim with no quoting or escaping.
    Str(String),
    /// An integer argument.
    Int(i64),
    /// A floating-point argument.
    Float(f64),
    /// A boolean argument, rendered as `true`/`false`.
    Bool(bool),
    /// A non-scalar argument. Never rendered into the pattern.
    Opaque,
}

impl ArgValue {
    /// Returns `true` for the scalar variants that participate in patterns.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ArgValue::Opaque)
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) => write!(f, "{s}"),
            ArgValue::Int(n) => write!(f, "{n}"),
            ArgValue::Float(x) => write!(f, "{x}"),
            ArgValue::Bool(b) => write!(f, "{b}"),
            // Display is only called on scalars; an opaque value has no
            // textual form by contract.
            ArgValue::Opaque => Ok(()),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Str(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(value as i64)
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Int(value as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

/// The positional and keyword arguments of one memoized call.
///
/// Built fluently; keyword order is preserved as given, and identical
/// argument sequences always derive identical patterns.
///
/// ```
/// use memofile_cache::CallArgs;
///
/// let args = CallArgs::new().arg("acme").arg(42).kwarg("region", "eu");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    keyword: Vec<(String, ArgValue)>,
}

impl CallArgs {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Appends a positional non-scalar argument.
    ///
    /// The argument carries no value: it exists so that call sites passing
    /// complex objects can state so explicitly. Under lenient key derivation
    /// it leaves no trace in the pattern.
    pub fn opaque_arg(mut self) -> Self {
        self.positional.push(ArgValue::Opaque);
        self
    }

    /// Appends a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    /// Appends a keyword non-scalar argument.
    pub fn opaque_kwarg(mut self, name: impl Into<String>) -> Self {
        self.keyword.push((name.into(), ArgValue::Opaque));
        self
    }

    /// The positional arguments, in call order.
    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    /// The keyword arguments, in the order received.
    pub fn keyword(&self) -> &[(String, ArgValue)] {
        &self.keyword
    }

    /// Returns `true` if no arguments were recorded.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Locates the first non-scalar argument, described for error reporting.
    fn first_opaque(&self) -> Option<String> {
        for (i, value) in self.positional.iter().enumerate() {
            if !value.is_scalar() {
                return Some(format!("positional #{}", i + 1));
            }
        }
        for (name, value) in &self.keyword {
            if !value.is_scalar() {
                return Some(format!("keyword `{name}`"));
            }
        }
        None
    }
}

/// How key derivation treats non-scalar arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyDerivation {
    /// Omit non-scalar arguments from the pattern.
    ///
    /// Calls that differ only in a non-scalar argument derive the same key
    /// and therefore share a cache entry. The default.
    #[default]
    Lenient,

    /// Reject calls carrying non-scalar arguments with
    /// [`CacheError::OpaqueArgument`] instead of deriving an ambiguous key.
    Strict,
}

/// Derives the call pattern for a function name and argument list.
///
/// The pattern is `name(arg1, arg2, key=value, ...)`: positional scalars in
/// call order, then keyword pairs in the order received, all joined with
/// `", "`. Argument values are rendered as-is; no escaping is applied, so
/// values containing `(`, `)`, `,`, or `=` produce ambiguous (though not
/// necessarily colliding) keys.
pub fn make_call_pattern(
    func_name: &str,
    args: &CallArgs,
    mode: KeyDerivation,
) -> Result<String, CacheError> {
    if mode == KeyDerivation::Strict {
        if let Some(position) = args.first_opaque() {
            return Err(CacheError::OpaqueArgument {
                func_name: func_name.to_string(),
                position,
            });
        }
    }

    let mut parts: Vec<String> = args
        .positional()
        .iter()
        .filter(|value| value.is_scalar())
        .map(ArgValue::to_string)
        .collect();
    for (name, value) in args.keyword() {
        if value.is_scalar() {
            parts.push(format!("{name}={value}"));
        }
    }

    Ok(format!("{func_name}({})", parts.join(", ")))
}

//! Flattening of nested JSON-like structures into dotted-path maps.
//!
//! Intended for dumping nested API payloads to tabular formats: the value
//! `{"a": {"b": 1}}` becomes the single-level map `{"a.b": 1}`, ready to be
//! written as one CSV row. Pure transform, no state, no files.

#![warn(missing_docs)]

use serde::Serialize;
use serde_json::{Map, Value};

/// Error raised when an input cannot be represented as a JSON structure.
#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    /// The input failed to convert into a JSON value, e.g. a mapping with
    /// non-string keys.
    #[error("unable to flatten value: {reason}")]
    Unsupported {
        /// Description of the conversion failure.
        reason: String,
    },
}

/// Flattens any serializable value into a single-level dotted-path map.
///
/// The input is converted to a JSON value first; anything outside the
/// null/boolean/number/string/sequence/mapping set is a fatal
/// [`FlattenError::Unsupported`].
pub fn flatten<T: Serialize>(value: &T) -> Result<Map<String, Value>, FlattenError> {
    let value = serde_json::to_value(value).map_err(|e| FlattenError::Unsupported {
        reason: e.to_string(),
    })?;
    Ok(flatten_value(&value))
}

/// Flattens an already-parsed JSON value into a single-level dotted-path map.
///
/// Mapping keys extend the dotted path. Sequence elements do NOT extend the
/// path: every element of an array shares its parent's prefix, so later
/// elements overwrite earlier ones in the output (`{"a": [1, 2]}` flattens
/// to `{"a": 2}`). This collision is deliberate: the output feeds
/// fixed-column tabular export. Scalars are written at the
/// dot-joined path of the keys leading to them; a bare top-level scalar
/// lands under the empty key.
pub fn flatten_value(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    walk(value, &mut Vec::new(), &mut out);
    out
}

fn walk(value: &Value, path: &mut Vec<String>, out: &mut Map<String, Value>) {
    match value {
        Value::Object(fields) => {
            for (key, child) in fields {
                path.push(key.clone());
                walk(child, path, out);
                path.pop();
            }
        }
        Value::Array(items) => {
            for child in items {
                walk(child, path, out);
            }
        }
        scalar => {
            out.insert(path.join("."), scalar.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_mappings_become_dotted_paths() {
        let input = json!({"a": {"b": {"c": 1, "d": 2}, "e": {"f": 3, "g": 4}}});
        let out = flatten_value(&input);

        let expected = json!({"a.b.c": 1, "a.b.d": 2, "a.e.f": 3, "a.e.g": 4});
        assert_eq!(Value::Object(out), expected);
    }

    #[test]
    fn sequence_elements_share_a_path_and_last_wins() {
        let out = flatten_value(&json!({"a": [1, 2]}));
        assert_eq!(Value::Object(out), json!({"a": 2}));
    }

    #[test]
    fn sequence_of_mappings_merges_keys() {
        let input = json!({"rows": [{"x": 1}, {"y": 2}, {"x": 3}]});
        let out = flatten_value(&input);
        // Colliding keys under repeated sequence flattening overwrite.
        assert_eq!(Value::Object(out), json!({"rows.x": 3, "rows.y": 2}));
    }

    #[test]
    fn scalars_of_every_kind_pass_through() {
        let input = json!({"n": null, "b": true, "i": 7, "f": 0.5, "s": "text"});
        let out = flatten_value(&input);
        assert_eq!(
            Value::Object(out),
            json!({"n": null, "b": true, "i": 7, "f": 0.5, "s": "text"})
        );
    }

    #[test]
    fn top_level_scalar_lands_under_the_empty_key() {
        let out = flatten_value(&json!(42));
        assert_eq!(out.get(""), Some(&json!(42)));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn empty_structures_flatten_to_nothing() {
        assert!(flatten_value(&json!({})).is_empty());
        assert!(flatten_value(&json!({"a": []})).is_empty());
        assert!(flatten_value(&json!({"a": {}})).is_empty());
    }

    #[test]
    fn serializable_structs_flatten_through_the_front_door() {
        #[derive(Serialize)]
        struct Customer {
            name: String,
            address: Address,
        }
        #[derive(Serialize)]
        struct Address {
            city: String,
            zip: String,
        }

        let customer = Customer {
            name: "Acme".to_string(),
            address: Address {
                city: "Ulm".to_string(),
                zip: "89073".to_string(),
            },
        };
        let out = flatten(&customer).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"name": "Acme", "address.city": "Ulm", "address.zip": "89073"})
        );
    }

    #[test]
    fn unconvertible_input_is_fatal() {
        // Tuple map keys cannot become JSON object keys.
        let mut bad = std::collections::HashMap::new();
        bad.insert((1, 2), "value");

        let err = flatten(&bad).unwrap_err();
        assert!(matches!(err, FlattenError::Unsupported { .. }));
    }
}

//! Deterministic fingerprints of job lists.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::batch::Job;

/// Computes the fingerprint of an item list.
///
/// Two lists share a fingerprint when their canonical JSON forms are equal:
/// object key order is irrelevant, list order is significant.
pub fn fingerprint(items: &[Job]) -> String {
    let canonical = canonical_json(items);
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// Serializes an item list as JSON with object keys sorted at every level.
pub fn canonical_json(items: &[Job]) -> String {
    let mut out = String::new();
    out.push('[');
    for (i, job) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_canonical(job.as_value(), &mut out);
    }
    out.push(']');
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(values) => {
            out.push('[');
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jobs(values: Vec<Value>) -> Vec<Job> {
        values.into_iter().map(Job::new).collect()
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let items = jobs(vec![json!({"source": "a", "destination": "b"}), json!("c")]);
        assert_eq!(fingerprint(&items), fingerprint(&items.clone()));
        assert_eq!(fingerprint(&items).len(), 64);
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"source": "a", "destination": "b"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"destination": "b", "source": "a"}"#).unwrap();
        assert_eq!(fingerprint(&jobs(vec![a])), fingerprint(&jobs(vec![b])));
    }

    #[test]
    fn test_item_order_matters() {
        let forward = jobs(vec![json!("a"), json!("b")]);
        let reversed = jobs(vec![json!("b"), json!("a")]);
        assert_ne!(fingerprint(&forward), fingerprint(&reversed));
    }

    #[test]
    fn test_value_change_matters() {
        let before = jobs(vec![json!({"source": "a", "destination": "b"})]);
        let after = jobs(vec![json!({"source": "a", "destination": "c"})]);
        assert_ne!(fingerprint(&before), fingerprint(&after));
    }

    #[test]
    fn test_canonical_json_nested() {
        let items = jobs(vec![json!({"z": [1, {"b": true, "a": null}], "a": "x"})]);
        assert_eq!(
            canonical_json(&items),
            r#"[{"a":"x","z":[1,{"a":null,"b":true}]}]"#
        );
    }
}

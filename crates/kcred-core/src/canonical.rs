//! # Canonical Serialization — Credential Payload Bytes
//!
//! Defines [`CanonicalBytes`], the sole construction path for bytes used in
//! credential identity computation.
//!
//! ## Canonicalization Scope
//!
//! Only the **top-level** keys of the credential payload are sorted. Nested
//! objects are serialized in the order their keys were received, because
//! `serde_json` is built with `preserve_order`. Two payloads whose nested
//! objects list the same keys in a different order therefore have different
//! identities. Widening the scope would change the identity of every credential
//! already stored, so it stays top-level.
//!
//! Serialization is compact (no whitespace), with `serde_json` string escaping.

use serde_json::{Map, Value};

use crate::record::CredentialData;

/// Bytes produced exclusively by top-level-sorted canonicalization of a
/// credential payload.
///
/// # Invariants
///
/// - The only constructor is [`CanonicalBytes::new()`].
/// - Top-level keys appear in lexicographic (UTF-8 byte) order.
/// - Nested values are serialized exactly as held.
///
/// The inner `Vec<u8>` is private, so digest code that accepts
/// `&CanonicalBytes` cannot be handed arbitrary bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize a credential payload.
    ///
    /// Total over every payload: a `serde_json::Value` always has a JSON
    /// rendering, so there is no error path.
    pub fn new(data: &CredentialData) -> Self {
        let mut keys: Vec<&String> = data.keys().collect();
        keys.sort();

        let mut sorted = Map::with_capacity(data.len());
        for key in keys {
            if let Some(value) = data.get(key) {
                sorted.insert(key.clone(), value.clone());
            }
        }

        Self(Value::Object(sorted).to_string().into_bytes())
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> CredentialData {
        match value {
            Value::Object(map) => map,
            other => panic!("test payload must be an object, got {other}"),
        }
    }

    fn canonical_str(value: Value) -> String {
        String::from_utf8(CanonicalBytes::new(&data(value)).as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn empty_payload_is_empty_object() {
        assert_eq!(canonical_str(json!({})), "{}");
    }

    #[test]
    fn top_level_keys_are_sorted() {
        assert_eq!(
            canonical_str(json!({"name": "A", "degree": "PhD", "year": 2024})),
            r#"{"degree":"PhD","name":"A","year":2024}"#
        );
    }

    #[test]
    fn insertion_order_does_not_matter_at_top_level() {
        let a = CanonicalBytes::new(&data(json!({"name": "A", "degree": "PhD"})));
        let b = CanonicalBytes::new(&data(json!({"degree": "PhD", "name": "A"})));
        assert_eq!(a, b);
    }

    #[test]
    fn nested_objects_keep_received_order() {
        let payload: CredentialData =
            serde_json::from_str(r#"{"meta":{"z":1,"a":2},"id":"x"}"#).unwrap();
        let canonical = CanonicalBytes::new(&payload);
        assert_eq!(canonical.as_bytes(), br#"{"id":"x","meta":{"z":1,"a":2}}"#);
    }

    #[test]
    fn nested_order_changes_canonical_bytes() {
        let a: CredentialData = serde_json::from_str(r#"{"meta":{"z":1,"a":2}}"#).unwrap();
        let b: CredentialData = serde_json::from_str(r#"{"meta":{"a":2,"z":1}}"#).unwrap();
        assert_ne!(CanonicalBytes::new(&a), CanonicalBytes::new(&b));
    }

    #[test]
    fn arrays_keep_element_order() {
        assert_eq!(
            canonical_str(json!({"courses": [3, 1, 2]})),
            r#"{"courses":[3,1,2]}"#
        );
    }

    #[test]
    fn scalars_render_compactly() {
        assert_eq!(
            canonical_str(json!({"t": true, "n": null, "f": false, "s": "x y"})),
            r#"{"f":false,"n":null,"s":"x y","t":true}"#
        );
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        assert_eq!(
            canonical_str(json!({"name": "José Müller"})),
            r#"{"name":"José Müller"}"#
        );
    }

    #[test]
    fn len_and_is_empty() {
        let cb = CanonicalBytes::new(&data(json!({})));
        assert_eq!(cb.len(), 2);
        assert!(!cb.is_empty());
    }
}

//! Canonical JSON encoding, per spec.md §6.1: UTF-8, keys in
//! object-insertion order, no trailing whitespace. `serde_json::to_vec`
//! already satisfies this for `#[derive(Serialize)]` structs, since struct
//! fields serialize in declaration order and `to_vec` emits no extra
//! whitespace; the `preserve_order` feature additionally keeps any
//! `serde_json::Map`/`Value::Object` we build by hand (e.g. metadata blobs)
//! in insertion order rather than sorted, resolving the open question
//! around `serde_json`'s default map ordering.
use serde::Serialize;

/// Serialize `value` to its canonical byte representation — the signing
/// input for any block header or transaction payload.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("canonical serialization is infallible")
}

/// Convenience wrapper returning the canonical bytes as a UTF-8 string.
pub fn to_canonical_string<T: Serialize>(value: &T) -> String {
    String::from_utf8(to_canonical_bytes(value)).expect("canonical JSON is always valid UTF-8")
}

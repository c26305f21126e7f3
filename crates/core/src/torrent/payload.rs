use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use super::TorrentDecodeError;

/// Whether the request carried no torrent at all.
pub fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::String(s) => s.trim().trim_matches('"').is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Decode the `torrent` field of a parse request into raw `.torrent` bytes.
///
/// Accepted forms:
/// - a base64 string
/// - a string holding a space-separated byte list such as `[100 56 ...]`,
///   which is what autobrr templates render for raw bytes
/// - a JSON array of byte values
pub fn decode_payload(payload: &Value) -> Result<Vec<u8>, TorrentDecodeError> {
    match payload {
        Value::String(s) => decode_string(s),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| {
                        TorrentDecodeError::InvalidPayload(format!("not a byte value: {}", item))
                    })
            })
            .collect(),
        other => Err(TorrentDecodeError::InvalidPayload(format!(
            "unsupported payload type: {}",
            json_type(other)
        ))),
    }
}

fn decode_string(raw: &str) -> Result<Vec<u8>, TorrentDecodeError> {
    let trimmed = raw.trim().trim_matches('"');

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return decode_byte_list(&trimmed[1..trimmed.len() - 1]);
    }

    STANDARD
        .decode(trimmed)
        .map_err(|e| TorrentDecodeError::InvalidPayload(e.to_string()))
}

fn decode_byte_list(inner: &str) -> Result<Vec<u8>, TorrentDecodeError> {
    inner
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .map_err(|_| TorrentDecodeError::InvalidPayload(format!("not a byte value: {}", s)))
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_base64() {
        let encoded = STANDARD.encode(b"d4:infod4:name4:testee");
        let bytes = decode_payload(&json!(encoded)).unwrap();
        assert_eq!(bytes, b"d4:infod4:name4:testee");
    }

    #[test]
    fn test_decode_quoted_base64() {
        let encoded = format!("  \"{}\"\n", STANDARD.encode(b"hello"));
        assert_eq!(decode_payload(&json!(encoded)).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_byte_list_string() {
        let bytes = decode_payload(&json!("[100 52 58 105]")).unwrap();
        assert_eq!(bytes, b"d4:i");
    }

    #[test]
    fn test_decode_json_array() {
        let bytes = decode_payload(&json!([100, 101])).unwrap();
        assert_eq!(bytes, b"de");
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        assert!(decode_payload(&json!([100, 256])).is_err());
        assert!(decode_payload(&json!([-1])).is_err());
        assert!(decode_payload(&json!("[100 300]")).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_payload(&json!("not base64 !!!")).is_err());
        assert!(decode_payload(&json!({"a": 1})).is_err());
        assert!(decode_payload(&json!(42)).is_err());
    }

    #[test]
    fn test_is_empty_payload() {
        assert!(is_empty_payload(&Value::Null));
        assert!(is_empty_payload(&json!("")));
        assert!(is_empty_payload(&json!("  \"\" ")));
        assert!(is_empty_payload(&json!([])));
        assert!(!is_empty_payload(&json!("ZGU=")));
        assert!(!is_empty_payload(&json!([100])));
    }
}

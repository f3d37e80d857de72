//! Payload serialization trait

use crate::CacheError;
use serde::{de::DeserializeOwned, Serialize};

/// Trait for the text format cached payloads are stored in.
///
/// Field naming and null-omission are declared on the payload types through
/// serde attributes; the serializer only picks the wire syntax.
pub trait Serializer: Send + Sync + Clone + 'static {
    /// Name of the serializer (for debugging/metrics)
    fn name(&self) -> &str;

    /// Serialize a value to text
    fn serialize<T: Serialize>(&self, value: &T) -> Result<String, CacheError>;

    /// Deserialize text to a value
    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, CacheError>;
}

/// Compact JSON serializer (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<String, CacheError> {
        serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, CacheError> {
        serde_json::from_str(text).map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        display_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    #[test]
    fn test_json_omits_absent_fields() {
        let value = Payload {
            display_name: "Widget".to_string(),
            note: None,
        };

        let text = JsonSerializer.serialize(&value).unwrap();
        assert_eq!(text, r#"{"displayName":"Widget"}"#);

        let decoded: Payload = JsonSerializer.deserialize(&text).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_json_rejects_garbage() {
        let err = JsonSerializer.deserialize::<Payload>("{not json").unwrap_err();
        assert!(matches!(err, CacheError::Deserialization(_)));
    }

    #[test]
    fn test_json_serializer_name() {
        assert_eq!(JsonSerializer.name(), "json");
    }
}

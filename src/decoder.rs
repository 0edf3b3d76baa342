//! JSON decoder used by default

use apistore_interface::{DecodeError, Decoder};
use serde::de::DeserializeOwned;

/// Decodes payloads with serde_json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        serde_json::from_slice(bytes).map_err(DecodeError::new::<T>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apistore_interface::NoContent;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
        name: String,
    }

    #[test]
    fn test_decodes_matching_payload() {
        let item: Item = JsonDecoder.decode(br#"{"id":4,"name":"charmander"}"#).unwrap();
        assert_eq!(
            item,
            Item {
                id: 4,
                name: "charmander".to_string()
            }
        );
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let err = JsonDecoder.decode::<Item>(br#"{"id":"four"}"#).unwrap_err();
        assert!(err.target().ends_with("Item"));
    }

    #[test]
    fn test_empty_body_is_error() {
        assert!(JsonDecoder.decode::<Item>(b"").is_err());
    }

    #[test]
    fn test_no_content_decodes_from_null() {
        let value: NoContent = JsonDecoder.decode(b"null").unwrap();
        assert_eq!(value, NoContent);
    }
}

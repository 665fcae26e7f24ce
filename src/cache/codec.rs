//! Stored-value encoding: JSON text, zlib-compressed past a size threshold.
//!
//! `decode(encode(v)) == v` holds for every JSON-serializable value on both
//! sides of the compression threshold. Decoding is forgiving: bytes that do
//! not decompress are tried as plain JSON, and anything unparseable reads as
//! a miss (`None`), never an error.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

/// Payloads at or below this serialized length are stored uncompressed.
pub(crate) const MIN_COMPRESS_LEN: usize = 15;

const COMPRESS_LEVEL: u32 = 6;

/// JSON-encodes a value for storage, compressing when it pays off.
///
/// Fails only when the value cannot be JSON-serialized; the caller logs and
/// skips the write.
pub(crate) fn encode<T: Serialize>(value: &T, compress: bool) -> serde_json::Result<Vec<u8>> {
    let text = serde_json::to_string(value)?;
    if compress && text.len() > MIN_COMPRESS_LEN {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESS_LEVEL));
        if encoder.write_all(text.as_bytes()).is_ok() {
            if let Ok(bytes) = encoder.finish() {
                return Ok(bytes);
            }
        }
        // fall back to the uncompressed form on any encoder fault
        return Ok(text.into_bytes());
    }
    Ok(text.into_bytes())
}

/// Decodes stored bytes back into a value. Any failure reads as `None`.
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8], compress: bool) -> Option<T> {
    if compress {
        let mut decoder = ZlibDecoder::new(bytes);
        let mut raw = Vec::new();
        if decoder.read_to_end(&mut raw).is_ok() {
            return serde_json::from_slice(&raw).ok();
        }
        // not compressed after all: short payloads are stored as plain JSON
    }
    serde_json::from_slice(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_round_trip_below_threshold() {
        let value = json!(42);
        assert!(serde_json::to_string(&value).unwrap().len() <= MIN_COMPRESS_LEN);
        let bytes = encode(&value, true).unwrap();
        assert_eq!(decode::<Value>(&bytes, true), Some(value));
    }

    #[test]
    fn test_round_trip_above_threshold() {
        let value = json!({"items": ["alpha", "beta", "gamma"], "total": 3});
        let text = serde_json::to_string(&value).unwrap();
        assert!(text.len() > MIN_COMPRESS_LEN);
        let bytes = encode(&value, true).unwrap();
        // stored form is compressed, not the JSON text
        assert_ne!(bytes, text.as_bytes());
        assert_eq!(decode::<Value>(&bytes, true), Some(value));
    }

    #[test]
    fn test_round_trip_compression_disabled() {
        let value = json!({"items": ["alpha", "beta", "gamma"], "total": 3});
        let bytes = encode(&value, false).unwrap();
        assert_eq!(bytes, serde_json::to_string(&value).unwrap().into_bytes());
        assert_eq!(decode::<Value>(&bytes, false), Some(value));
    }

    #[test]
    fn test_decode_garbage_is_none() {
        assert_eq!(decode::<Value>(b"\x01\x02not json", true), None);
        assert_eq!(decode::<Value>(b"", true), None);
    }

    #[test]
    fn test_decode_typed() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Payload {
            name: String,
            count: u32,
        }
        let payload = Payload {
            name: "a-fairly-long-name".to_string(),
            count: 7,
        };
        let bytes = encode(&payload, true).unwrap();
        assert_eq!(decode::<Payload>(&bytes, true), Some(payload));
    }
}

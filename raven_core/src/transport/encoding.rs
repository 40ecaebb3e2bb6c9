/**
 * Payload encoding.
 *
 * `Gzip` compresses the serialized event and adds `Content-Encoding: gzip`.
 * `Text` sends the JSON as-is. `Base64` is accepted for configuration
 * compatibility and behaves exactly like `Text`.
 */
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use flate2::write::GzEncoder;
use flate2::Compression;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Gzip,
    Base64,
    Text,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Base64 => "base64",
            Encoding::Text => "text",
        }
    }

    /// Value of the `Content-Encoding` header, if any.
    pub fn content_encoding(&self) -> Option<&'static str> {
        match self {
            Encoding::Gzip => Some("gzip"),
            Encoding::Base64 | Encoding::Text => None,
        }
    }

    /// Transforms the serialized payload for the wire.
    pub fn encode(&self, payload: Vec<u8>) -> std::io::Result<Vec<u8>> {
        match self {
            Encoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&payload)?;
                encoder.finish()
            }
            Encoding::Base64 | Encoding::Text => Ok(payload),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEncoding(pub String);

impl fmt::Display for UnknownEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown encoding {:?} (expected gzip, base64 or text)", self.0)
    }
}

impl std::error::Error for UnknownEncoding {}

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gzip" => Ok(Encoding::Gzip),
            "base64" => Ok(Encoding::Base64),
            "text" => Ok(Encoding::Text),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_gzip_is_decodable() {
        let payload = br#"{"message":"HELO"}"#.to_vec();
        let encoded = Encoding::Gzip.encode(payload.clone()).unwrap();
        assert_ne!(encoded, payload);

        let mut decoded = Vec::new();
        GzDecoder::new(encoded.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_base64_is_alias_of_text() {
        let payload = b"{}".to_vec();
        assert_eq!(Encoding::Base64.encode(payload.clone()).unwrap(), payload);
        assert_eq!(Encoding::Text.encode(payload.clone()).unwrap(), payload);
        assert_eq!(Encoding::Base64.content_encoding(), None);
        assert_eq!(Encoding::Gzip.content_encoding(), Some("gzip"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("GZIP".parse::<Encoding>(), Ok(Encoding::Gzip));
        assert_eq!("text".parse::<Encoding>(), Ok(Encoding::Text));
        assert!("zstd".parse::<Encoding>().is_err());
    }
}

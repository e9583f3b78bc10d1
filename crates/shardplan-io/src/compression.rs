//! Decompression facade for source files (feature-gated).
//!
//! Only `None`, `Zstd` and `Lz4` (frame format) are known. A codec whose
//! feature is not compiled in is rejected when a file is opened.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    None,
    Zstd,
    Lz4,
}

impl Compression {
    /// Parse a user-supplied compression hint (case-insensitive).
    pub fn parse(hint: Option<&str>) -> Result<Self> {
        let Some(hint) = hint else {
            return Ok(Compression::None);
        };
        match hint.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Compression::None),
            "zstd" => Ok(Compression::Zstd),
            "lz4" => Ok(Compression::Lz4),
            other => Err(Error::UnsupportedCompression(other.to_string())),
        }
    }

    /// Wrap `input` in a decoder for this codec.
    pub fn decoder<'a>(&self, input: Box<dyn Read + 'a>) -> Result<Box<dyn Read + 'a>> {
        match self {
            Compression::None => Ok(input),
            Compression::Zstd => {
                #[cfg(feature = "zstd")]
                {
                    Ok(Box::new(zstd::stream::read::Decoder::new(input)?))
                }
                #[cfg(not(feature = "zstd"))]
                {
                    Err(Error::UnsupportedCompression("zstd".into()))
                }
            }
            Compression::Lz4 => {
                #[cfg(feature = "lz4")]
                {
                    Ok(Box::new(lz4_flex::frame::FrameDecoder::new(input)))
                }
                #[cfg(not(feature = "lz4"))]
                {
                    Err(Error::UnsupportedCompression("lz4".into()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_hints() {
        assert_eq!(Compression::parse(None).unwrap(), Compression::None);
        assert_eq!(Compression::parse(Some("ZSTD")).unwrap(), Compression::Zstd);
        assert_eq!(Compression::parse(Some("lz4")).unwrap(), Compression::Lz4);
    }

    #[test]
    fn rejects_unknown_hints() {
        let err = Compression::parse(Some("gzip")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCompression(ref c) if c == "gzip"));
    }

    #[test]
    fn none_passes_bytes_through() {
        let mut out = String::new();
        Compression::None
            .decoder(Box::new(&b"{\"a\":1}\n"[..]))
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "{\"a\":1}\n");
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn zstd_roundtrip() {
        let compressed = zstd::stream::encode_all(&b"line\n"[..], 3).unwrap();
        let mut out = Vec::new();
        Compression::Zstd
            .decoder(Box::new(std::io::Cursor::new(compressed)))
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"line\n");
    }
}

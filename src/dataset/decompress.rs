//! Decompression with format fallback.
//!
//! Published files are gzip, but some mirrors serve zlib or raw deflate
//! streams under the same name. Formats are tried in a fixed order and the
//! first one that decodes the whole buffer wins.

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use std::fmt;
use std::io::Read;

/// Container format that successfully decoded a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Gzip,
    Zlib,
    Deflate,
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Codec::Gzip => "gzip",
            Codec::Zlib => "zlib",
            Codec::Deflate => "deflate",
        };
        f.write_str(name)
    }
}

/// Every decoder rejected the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Decompression failed (gzip: {gzip}; inflate: {inflate})")]
pub struct DecompressError {
    /// Why the gzip decoder failed.
    pub gzip: String,
    /// Why the last inflate fallback failed.
    pub inflate: String,
}

/// Decompresses `bytes`, returning the output and the codec that worked.
pub fn decompress(bytes: &[u8]) -> Result<(Vec<u8>, Codec), DecompressError> {
    if bytes.is_empty() {
        return Err(DecompressError {
            gzip: "empty input".to_string(),
            inflate: "empty input".to_string(),
        });
    }

    let gzip = match read_all(GzDecoder::new(bytes)) {
        Ok(out) => return Ok((out, Codec::Gzip)),
        Err(e) => e,
    };
    log::debug!("gzip decode failed ({}), trying inflate", gzip);

    if let Ok(out) = read_all(ZlibDecoder::new(bytes)) {
        return Ok((out, Codec::Zlib));
    }

    match read_all(DeflateDecoder::new(bytes)) {
        Ok(out) => Ok((out, Codec::Deflate)),
        Err(inflate) => Err(DecompressError { gzip, inflate }),
    }
}

fn read_all(mut decoder: impl Read) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| e.to_string())?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    const PAYLOAD: &[u8] = br#"{"type":"FeatureCollection","features":[]}"#;

    #[test]
    fn test_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(PAYLOAD).unwrap();
        let bytes = encoder.finish().unwrap();

        let (out, codec) = decompress(&bytes).unwrap();
        assert_eq!(out, PAYLOAD);
        assert_eq!(codec, Codec::Gzip);
    }

    #[test]
    fn test_zlib_fallback() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(PAYLOAD).unwrap();
        let bytes = encoder.finish().unwrap();

        let (out, codec) = decompress(&bytes).unwrap();
        assert_eq!(out, PAYLOAD);
        assert_eq!(codec, Codec::Zlib);
    }

    #[test]
    fn test_raw_deflate_fallback() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(PAYLOAD).unwrap();
        let bytes = encoder.finish().unwrap();

        let (out, codec) = decompress(&bytes).unwrap();
        assert_eq!(out, PAYLOAD);
        assert_eq!(codec, Codec::Deflate);
    }

    #[test]
    fn test_garbage_fails_with_both_reasons() {
        // 0xFF is a reserved deflate block type and an invalid zlib header
        let err = decompress(&[0xFF; 32]).unwrap_err();
        assert!(!err.gzip.is_empty());
        assert!(!err.inflate.is_empty());
        assert!(err.to_string().starts_with("Decompression failed"));
    }

    #[test]
    fn test_empty_input() {
        assert!(decompress(&[]).is_err());
    }

    #[test]
    fn test_codec_display() {
        assert_eq!(Codec::Gzip.to_string(), "gzip");
        assert_eq!(Codec::Deflate.to_string(), "deflate");
    }
}

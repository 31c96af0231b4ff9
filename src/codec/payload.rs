//! Compressed payload and audio-metadata tags.
//!
//! The CSV text travels inside the audio file's AUTHOR tag as zlib-deflated,
//! base64-encoded bytes. The remaining tags identify the composition to the
//! device.

use std::io::{Read, Write};
use std::sync::LazyLock;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::CodecError;

/// `AUTHOR : <payload>` as printed by metadata dumps.
static AUTHOR_DUMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*AUTHOR\s*:\s*([A-Za-z0-9+/=]+)\s*$").expect("valid AUTHOR pattern")
});

/// `AUTHOR=<payload>` as written in ffmetadata files or `TAG:` listings.
static AUTHOR_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*(?:TAG:)?AUTHOR\s*=\s*([A-Za-z0-9+/=]+)\s*$")
        .expect("valid AUTHOR pattern")
});

/// Default CUSTOM1 tag (an empty compressed blob).
pub const DEFAULT_CUSTOM1: &str = "eNoDAAAAAAE=";

/// Deflate at maximum level and base64-encode.
pub fn compress_payload(text: &str) -> Result<String, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(9));
    encoder.write_all(text.as_bytes())?;
    let bytes = encoder.finish()?;
    Ok(STANDARD.encode(bytes))
}

/// Inverse of [`compress_payload`].
///
/// Accepts unpadded base64 and raw deflate streams without a zlib header.
pub fn decompress_payload(payload: &str) -> Result<String, CodecError> {
    let trimmed: String = payload.split_whitespace().collect();
    let bytes = match STANDARD.decode(&trimmed) {
        Ok(bytes) => bytes,
        Err(err) => STANDARD_NO_PAD.decode(trimmed.trim_end_matches('=')).map_err(|_| err)?,
    };

    let mut text = String::new();
    if ZlibDecoder::new(bytes.as_slice())
        .read_to_string(&mut text)
        .is_ok()
    {
        return Ok(text);
    }

    log::debug!("payload has no zlib header, trying raw deflate");
    let mut raw = Vec::new();
    DeflateDecoder::new(bytes.as_slice()).read_to_end(&mut raw)?;
    Ok(String::from_utf8(raw)?)
}

/// Find the AUTHOR payload in a metadata dump.
pub fn extract_author(metadata: &str) -> Option<String> {
    [&*AUTHOR_DUMP, &*AUTHOR_ASSIGN]
        .into_iter()
        .find_map(|re| re.captures(metadata))
        .map(|caps| caps[1].to_string())
}

/// Tags written alongside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub composer: String,
    pub album: String,
    pub custom1: String,
    /// Device layout marker, `"<columns>cols"`.
    pub custom2: String,
    /// Compressed CSV payload.
    pub author: String,
}

impl ExportMetadata {
    pub fn new(columns: usize, author: String) -> Self {
        Self {
            composer: String::from("Glyph Timeline"),
            album: String::from("Glyph Composition"),
            custom1: DEFAULT_CUSTOM1.to_string(),
            custom2: format!("{}cols", columns),
            author,
        }
    }

    /// Number of zones named by CUSTOM2, if it is well formed.
    pub fn columns(&self) -> Option<usize> {
        self.custom2.strip_suffix("cols")?.parse().ok()
    }

    /// Render as an ffmetadata file.
    pub fn to_ffmetadata(&self) -> String {
        format!(
            ";FFMETADATA1\nCOMPOSER={}\nALBUM={}\nCUSTOM1={}\nCUSTOM2={}\nAUTHOR={}\n",
            self.composer, self.album, self.custom1, self.custom2, self.author
        )
    }
}

use encoding_rs::UTF_8;
use serde::{Deserialize, Serialize};

/// Best-effort text decoding for incoming serial chunks. Invalid byte
/// sequences are replaced, never fatal: one bad byte must not abort the
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Auto,
    Utf8,
    Ascii,
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::Utf8
    }
}

impl TextEncoding {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Auto => detect_and_decode(bytes),
            // Without-BOM variant: a stray FF FE / FE FF in line noise must
            // not flip the whole chunk into UTF-16.
            Self::Utf8 => UTF_8.decode_without_bom_handling(bytes).0.into_owned(),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b < 128 { b as char } else { '?' })
                .collect(),
        }
    }
}

fn detect_and_decode(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    encoding.decode_without_bom_handling(bytes).0.into_owned()
}

#[cfg(test)]
mod tests {
    use super::TextEncoding;

    #[test]
    fn utf8_replaces_invalid_sequences() {
        let decoded = TextEncoding::Utf8.decode(b"BINS:\xFF[1]");
        assert!(decoded.starts_with("BINS:"));
        assert!(decoded.ends_with("[1]"));
    }

    #[test]
    fn ascii_masks_high_bytes() {
        assert_eq!(TextEncoding::Ascii.decode(b"ok\x80"), "ok?");
    }

    #[test]
    fn bom_bytes_never_flip_the_chunk_to_utf16() {
        let decoded = TextEncoding::Utf8.decode(b"\xFF\xFEBINS:[1]");
        assert!(decoded.contains("BINS:[1]"));

        let decoded = TextEncoding::Auto.decode(b"\xFF\xFE BINS:[1]");
        assert!(decoded.contains("BINS:[1]"));
    }

    #[test]
    fn empty_input_decodes_empty() {
        assert_eq!(TextEncoding::Auto.decode(b""), "");
    }
}

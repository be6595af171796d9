use thiserror::Error;

use crate::text::TextEncoding;

/// Literal token that opens a spectrum frame on the wire.
pub const START_MARKER: &str = "BINS:[";

/// Byte that closes a spectrum frame. The payload itself never contains it.
pub const END_MARKER: char = ']';

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("malformed frame payload: {detail}")]
    Malformed { detail: String },
    #[error("expected {expected} bands, got {actual}")]
    BandCountMismatch { expected: usize, actual: usize },
}

/// Per-frame result of [`FrameExtractor::ingest`]. A rejected frame has
/// already been consumed from the buffer; the stream resynchronizes at the
/// next start marker.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Reading(Vec<f32>),
    Rejected(FrameError),
}

/// Pulls delimited `BINS:[..]` frames out of an unbounded byte stream.
///
/// The extractor owns its accumulation buffer exclusively; callers push
/// chunks in via [`ingest`](Self::ingest) and never touch the buffer
/// directly. It performs no I/O and expects a single caller.
pub struct FrameExtractor {
    buffer: String,
    expected_bands: usize,
    encoding: TextEncoding,
}

impl FrameExtractor {
    pub fn new(expected_bands: usize, encoding: TextEncoding) -> Self {
        Self {
            buffer: String::new(),
            expected_bands,
            encoding,
        }
    }

    /// Appends a chunk of raw bytes and drains every complete frame it can.
    ///
    /// Returns one [`FrameOutcome`] per complete frame found, in arrival
    /// order; an empty `Vec` means no frame completed yet. A frame is only
    /// produced once both its start and end markers are buffered; a partial
    /// tail is retained untouched for the next call.
    pub fn ingest(&mut self, bytes: &[u8]) -> Vec<FrameOutcome> {
        if !bytes.is_empty() {
            self.buffer.push_str(&self.encoding.decode(bytes));
        }

        let mut outcomes = Vec::new();
        loop {
            let Some(start) = self.buffer.find(START_MARKER) else {
                break;
            };
            let Some(close) = self.buffer[start + START_MARKER.len()..].find(END_MARKER) else {
                break;
            };
            let end = start + START_MARKER.len() + close;

            // Payload is the bracketed array; "BINS:" is marker dressing.
            let payload = self.buffer[start + START_MARKER.len() - 1..=end].to_string();
            if start > 0 {
                log::debug!("dropping {} noise bytes before frame marker", start);
            }
            // Consume noise and frame together so stale garbage is never
            // re-scanned on the next call.
            self.buffer.drain(..=end);

            match self.parse_payload(&payload) {
                Ok(reading) => outcomes.push(FrameOutcome::Reading(reading)),
                Err(err) => {
                    log::warn!("skipping frame: {err}");
                    outcomes.push(FrameOutcome::Rejected(err));
                }
            }
        }
        outcomes
    }

    fn parse_payload(&self, payload: &str) -> Result<Vec<f32>, FrameError> {
        let values: Vec<f32> = serde_json::from_str(payload).map_err(|e| FrameError::Malformed {
            detail: e.to_string(),
        })?;
        if values.len() != self.expected_bands {
            return Err(FrameError::BandCountMismatch {
                expected: self.expected_bands,
                actual: values.len(),
            });
        }
        Ok(values)
    }

    /// Characters buffered but not yet attributed to a frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(n: usize) -> FrameExtractor {
        FrameExtractor::new(n, TextEncoding::Utf8)
    }

    #[test]
    fn decodes_a_complete_frame() {
        let mut ex = extractor(3);
        let out = ex.ingest(b"BINS:[1,2.5,3]");
        assert_eq!(out, vec![FrameOutcome::Reading(vec![1.0, 2.5, 3.0])]);
        assert_eq!(ex.pending(), 0);
    }

    #[test]
    fn integers_and_floats_both_parse() {
        let mut ex = extractor(4);
        let out = ex.ingest(b"BINS:[12.0,34.5,7,0]");
        assert_eq!(out, vec![FrameOutcome::Reading(vec![12.0, 34.5, 7.0, 0.0])]);
    }

    #[test]
    fn band_count_mismatch_is_rejected() {
        let mut ex = extractor(3);
        let out = ex.ingest(b"BINS:[1,2]");
        assert_eq!(
            out,
            vec![FrameOutcome::Rejected(FrameError::BandCountMismatch {
                expected: 3,
                actual: 2,
            })]
        );
        assert_eq!(ex.pending(), 0);
    }

    #[test]
    fn malformed_payload_is_rejected_and_consumed() {
        let mut ex = extractor(3);
        let out = ex.ingest(b"BINS:[1,2,oops]");
        assert!(matches!(
            out.as_slice(),
            [FrameOutcome::Rejected(FrameError::Malformed { .. })]
        ));
        assert_eq!(ex.pending(), 0);
    }

    #[test]
    fn invalid_bytes_inside_noise_do_not_poison_the_frame() {
        let mut ex = extractor(2);
        let mut chunk = vec![0xFF, 0xFE];
        chunk.extend_from_slice(b"BINS:[4,5]");
        let out = ex.ingest(&chunk);
        assert_eq!(out, vec![FrameOutcome::Reading(vec![4.0, 5.0])]);
    }
}

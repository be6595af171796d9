//! Decoding of the mel-spectrum serial wire format.

pub mod bins;
pub mod text;

pub use bins::{FrameError, FrameExtractor, FrameOutcome, START_MARKER};
pub use text::TextEncoding;

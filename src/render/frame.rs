// Frame decoder
// Turns a wire message into an ordered set of bin magnitudes

use std::ops::Deref;

use crate::error::{Error, Result};
use crate::network::WireMessage;

/// One decoded spectrum frame: a magnitude per bin, indexed by position
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleFrame {
    samples: Vec<u8>,
}

impl SampleFrame {
    pub fn new(samples: Vec<u8>) -> Self {
        Self { samples }
    }

    /// Number of bins in the frame
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Magnitudes paired with their bin index
    pub fn bins(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.samples.iter().copied().enumerate()
    }
}

impl Deref for SampleFrame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.samples
    }
}

impl From<Vec<u8>> for SampleFrame {
    fn from(samples: Vec<u8>) -> Self {
        Self::new(samples)
    }
}

/// Decode a wire message into a frame.
///
/// Binary payloads carry no header: every byte is the magnitude of the bin at
/// its offset. Text messages are rejected with [`Error::MalformedFrame`].
pub fn decode(message: &WireMessage) -> Result<SampleFrame> {
    match message {
        WireMessage::Binary(data) => Ok(SampleFrame::new(data.clone())),
        WireMessage::Text(text) => Err(Error::MalformedFrame(format!(
            "expected a binary frame, got {} bytes of text",
            text.len()
        ))),
    }
}

use serde_json::Value;
use sm_core::StreamEvent;
use tracing::{debug, trace};

use super::utf8::Utf8Decoder;

/// Blank line separating two frames.
pub const FRAME_DELIMITER: &str = "\n\n";

/// Prefix of a frame carrying a JSON payload.
pub const DATA_PREFIX: &str = "data:";

const EXCERPT_CHARS: usize = 200;

/// Turns raw body chunks into events.
///
/// Text after the last delimiter stays buffered until a later chunk completes it.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    utf8: Utf8Decoder,
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let text = self.utf8.decode(chunk);
        self.buffer.push_str(&text);

        let Some(last) = self.buffer.rfind(FRAME_DELIMITER) else {
            return Vec::new();
        };
        let complete: String = self.buffer.drain(..last + FRAME_DELIMITER.len()).collect();
        complete.split(FRAME_DELIMITER).filter_map(parse_frame).collect()
    }

    /// End of input. Whatever is left never saw its delimiter and is dropped; it is
    /// returned only so the caller can log it.
    pub fn finish(&mut self) -> String {
        let tail = self.utf8.finish();
        self.buffer.push_str(&tail);
        std::mem::take(&mut self.buffer)
    }

    pub fn buffered(&self) -> &str {
        &self.buffer
    }
}

/// Parse one delimiter-free segment. `None` for anything that is not a usable event.
pub fn parse_frame(segment: &str) -> Option<StreamEvent> {
    let line = segment.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix(DATA_PREFIX) else {
        trace!("Skipping non-data frame: {}", excerpt(line));
        return None;
    };
    let payload = rest.trim_start();

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            debug!("Failed to parse SSE frame: {}, data: {}", e, excerpt(payload));
            return None;
        }
    };

    let event = StreamEvent::from_payload(value);
    if event.is_none() {
        debug!("Skipping frame without a known step: {}", excerpt(payload));
    }
    event
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(EXCERPT_CHARS).collect();
        cut.push('…');
        cut
    }
}

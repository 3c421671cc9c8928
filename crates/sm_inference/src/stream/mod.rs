//! Server-sent event decoding for the search stream.

pub mod frame;
pub mod reader;
pub mod utf8;

pub use frame::{parse_frame, FrameDecoder, DATA_PREFIX, FRAME_DELIMITER};
pub use reader::{ByteStream, StreamEventReader, TIMEOUT_MESSAGE};
pub use utf8::Utf8Decoder;

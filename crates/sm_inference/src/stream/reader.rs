use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use sm_core::{Result, StreamEvent, GENERIC_ERROR_MESSAGE};
use std::collections::VecDeque;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::frame::FrameDecoder;

/// Message of the synthetic `error` event emitted when the body goes silent.
pub const TIMEOUT_MESSAGE: &str = "Timed out waiting for the search stream";

pub type ByteStream = BoxStream<'static, Result<Bytes>>;

enum ChunkRead {
    Bytes(Bytes),
    End,
    Failed(String),
    Cancelled,
}

/// Pull-based reader over a search response body.
///
/// Yields events in arrival order and stops for good after the first `final` or
/// `error` event, leaving any remaining bytes unread. Transport failures and idle
/// timeouts become one synthetic `error` event. A body that simply ends without a
/// terminal event yields nothing more. Cancellation drops the body and yields
/// nothing more either.
pub struct StreamEventReader {
    source: Option<ByteStream>,
    decoder: FrameDecoder,
    pending: VecDeque<StreamEvent>,
    idle_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl StreamEventReader {
    pub fn new<S>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            source: Some(body.boxed()),
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            idle_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// A reader that yields a single synthetic `error` event, for requests that
    /// could not be opened.
    pub fn failed(message: impl Into<String>) -> Self {
        let mut reader = Self::closed();
        reader.pending.push_back(StreamEvent::synthetic_error(message));
        reader
    }

    /// A reader that is already finished and yields nothing, for searches cancelled
    /// before their body arrived.
    pub fn closed() -> Self {
        let mut reader = Self::new(stream::empty::<Result<Bytes>>());
        reader.source = None;
        reader
    }

    /// Bound the wait for each chunk.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// `true` once no further event can be produced.
    pub fn is_closed(&self) -> bool {
        self.source.is_none() && self.pending.is_empty()
    }

    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if event.is_terminal() {
                    self.close();
                }
                return Some(event);
            }

            let cancel = self.cancel.clone();
            let idle_timeout = self.idle_timeout;
            let read = {
                let source = self.source.as_mut()?;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => ChunkRead::Cancelled,
                    read = read_chunk(source, idle_timeout) => read,
                }
            };

            match read {
                ChunkRead::Bytes(chunk) => {
                    let events = self.decoder.push(&chunk);
                    self.pending.extend(events);
                }
                ChunkRead::End => {
                    let tail = self.decoder.finish();
                    if !tail.trim().is_empty() {
                        debug!("Discarding {} bytes of unterminated frame", tail.len());
                    }
                    self.close();
                    return None;
                }
                ChunkRead::Failed(message) => {
                    self.close();
                    return Some(StreamEvent::synthetic_error(message));
                }
                ChunkRead::Cancelled => {
                    debug!("Search stream cancelled");
                    self.close();
                    return None;
                }
            }
        }
    }

    /// Adapt into a `Stream` of events.
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send {
        stream::unfold(self, |mut reader| async move {
            reader.next_event().await.map(|event| (event, reader))
        })
    }

    fn close(&mut self) {
        self.source = None;
        self.pending.clear();
    }
}

async fn read_chunk(source: &mut ByteStream, idle_timeout: Option<Duration>) -> ChunkRead {
    let next = match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, source.next()).await {
            Ok(next) => next,
            Err(_) => {
                warn!("No data on the search stream for {:?}", limit);
                return ChunkRead::Failed(TIMEOUT_MESSAGE.to_string());
            }
        },
        None => source.next().await,
    };

    match next {
        Some(Ok(chunk)) => ChunkRead::Bytes(chunk),
        Some(Err(e)) => {
            warn!("Search stream failed: {}", e);
            ChunkRead::Failed(GENERIC_ERROR_MESSAGE.to_string())
        }
        None => ChunkRead::End,
    }
}

//! Client side of the remote retrieval service: corpus upload and the streaming
//! search with its event decoder.

pub mod client;
pub mod config;
pub mod stream;

pub use client::RemoteClient;
pub use config::ClientConfig;
pub use stream::StreamEventReader;

pub mod prelude {
    pub use super::client::RemoteClient;
    pub use super::config::ClientConfig;
    pub use super::stream::StreamEventReader;
    pub use sm_core::{Error, Result, Step, StreamEvent, UploadFlag};
}

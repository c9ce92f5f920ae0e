//! Error types for the pulse-client crate.

use thiserror::Error;

/// Errors that can occur when constructing or configuring the client.
///
/// The operational API (`connect`, `send`, `on`/`off`, `disconnect`) never
/// returns these; operational failures are reported through the event
/// channel instead.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Proto(#[from] pulse_proto::ProtoError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

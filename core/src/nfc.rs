//! Reaching the remote endpoint over the ISO-DEP link.

use std::error::Error as StdError;

/// Failures raised by the transport collaborator.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport never reached (or lost) the connected state.
    /// Fatal to the session; no exchanges are attempted over it.
    #[error("tag connection failed: {0}")]
    Connection(#[source] Box<dyn StdError + Send + Sync>),

    /// One round trip failed at the I/O level. Local to a single attempt.
    #[error("transceive failed: {0}")]
    Io(#[source] Box<dyn StdError + Send + Sync>),
}

impl TransportError {
    pub fn connection(cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Connection(cause.into())
    }

    pub fn io(cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Io(cause.into())
    }

    /// Whether the whole session is lost, as opposed to one attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// The three transport primitives the reader relies on. Implementations
/// own the physical link; tag discovery happens outside this crate.
pub trait Target {
    /// Brings the link up. Called once per session, before any exchange.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Whether the link is currently usable.
    fn is_connected(&self) -> bool;

    /// Writes one command and blocks until the response octets (possibly
    /// none) or a transport fault come back. Never retried by callers.
    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError>;
}

//! Long-lived reader wiring tag discovery to exchange sessions.

use std::sync::{Arc, Weak};

use crate::nfc::{Target, TransportError};
use crate::session::{ExchangeObserver, ExchangeSession, HapticFeedback, ReaderConfig};
use crate::transceiver::Transceiver;

#[cfg(feature = "tracing")]
use tracing::debug;

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {};
}

/// Drives one exchange session per discovered tag. The reader outlives
/// any number of tags; each discovery gets its own transceiver around
/// the transport handed in by the discovery source.
pub struct CardReader {
    config: ReaderConfig,
    observer: Weak<dyn ExchangeObserver + Send + Sync>,
    haptic: Option<Arc<dyn HapticFeedback + Send + Sync>>,
}

impl CardReader {
    pub fn new(config: ReaderConfig, observer: Weak<dyn ExchangeObserver + Send + Sync>) -> Self {
        Self {
            config,
            observer,
            haptic: None,
        }
    }

    pub fn with_feedback(mut self, haptic: Arc<dyn HapticFeedback + Send + Sync>) -> Self {
        self.haptic = Some(haptic);
        self
    }

    /// Runs one full session against a freshly discovered tag: bring the
    /// link up, verify it, then select every configured application. A
    /// connection failure is reported to the observer once and returned;
    /// no exchange is attempted over a link that never came up.
    pub fn on_tag_discovered<T: Target>(&self, target: T) -> Result<(), TransportError> {
        debug!("Tag discovered, starting a session");

        let transceiver = Transceiver::new(target);
        let session = ExchangeSession::new(
            &transceiver,
            &self.config,
            self.observer.clone(),
            self.haptic.as_deref(),
        );

        if let Err(e) = establish(&transceiver) {
            session.fail(&e);

            return Err(e);
        }

        session.run();

        Ok(())
    }
}

fn establish<T: Target>(transceiver: &Transceiver<T>) -> Result<(), TransportError> {
    // Any connect failure is session-fatal, whichever class the
    // transport chose for it.
    transceiver.connect().map_err(|e| {
        if e.is_fatal() {
            e
        } else {
            TransportError::connection(e)
        }
    })?;

    if !transceiver.is_connected() {
        return Err(TransportError::connection(
            "transport reports no link after connect",
        ));
    }

    Ok(())
}

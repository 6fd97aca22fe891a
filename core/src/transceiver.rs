//! Serialized round trips over a shared half-duplex transport.

use std::sync::{Mutex, MutexGuard};

use crate::nfc::{Target, TransportError};

#[cfg(feature = "tracing")]
use tracing::debug;

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {};
}

/// Owns the transport for one tag presentation and funnels every round
/// trip through a single lock. The link is half duplex, so a command and
/// its response must never interleave with another exchange.
pub struct Transceiver<T> {
    target: Mutex<T>,
}

impl<T: Target> Transceiver<T> {
    pub fn new(target: T) -> Self {
        Self {
            target: Mutex::new(target),
        }
    }

    /// Brings the underlying link up.
    pub fn connect(&self) -> Result<(), TransportError> {
        self.lock().connect()
    }

    /// Whether the underlying link is usable.
    pub fn is_connected(&self) -> bool {
        self.lock().is_connected()
    }

    /// Writes one command and waits for the full response. The transport
    /// lock is held for the whole round trip; concurrent callers queue.
    pub fn transceive(&self, command: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let mut target = self.lock();

        debug!("TX({}): {}", command.len(), hex::encode_upper(&command));

        let response = target.transceive(&command)?;

        debug!("RX({}): {}", response.len(), hex::encode_upper(&response));

        Ok(response)
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        // The transport holds no partial exchange state, so a guard
        // recovered from a poisoned lock is still sound to use.
        self.target.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    struct Echo;

    impl Target for Echo {
        fn connect(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
            Ok(command.to_vec())
        }
    }

    struct Faulty;

    impl Target for Faulty {
        fn connect(&mut self) -> Result<(), TransportError> {
            Err(TransportError::connection("no field"))
        }

        fn is_connected(&self) -> bool {
            false
        }

        fn transceive(&mut self, _: &[u8]) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::io("link dropped"))
        }
    }

    struct Overlapping {
        in_flight: Arc<AtomicUsize>,
        max_seen: Arc<AtomicUsize>,
    }

    impl Target for Overlapping {
        fn connect(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);

            thread::sleep(Duration::from_millis(2));

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(command.to_vec())
        }
    }

    #[test]
    fn passes_command_through_and_returns_response() {
        let transceiver = Transceiver::new(Echo);
        let response = transceiver.transceive(vec![0x00, 0xA4, 0x04, 0x00]).unwrap();

        assert_eq!(vec![0x00, 0xA4, 0x04, 0x00], response);
    }

    #[test]
    fn reports_link_state_of_the_target() {
        let transceiver = Transceiver::new(Echo);

        assert!(transceiver.connect().is_ok());
        assert!(transceiver.is_connected());
    }

    #[test]
    fn propagates_transport_faults() {
        let transceiver = Transceiver::new(Faulty);

        assert!(matches!(
            transceiver.connect(),
            Err(TransportError::Connection(_))
        ));
        assert!(matches!(
            transceiver.transceive(vec![0x00]),
            Err(TransportError::Io(_))
        ));
    }

    #[test]
    fn serializes_concurrent_exchanges() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let transceiver = Arc::new(Transceiver::new(Overlapping {
            in_flight: Arc::clone(&in_flight),
            max_seen: Arc::clone(&max_seen),
        }));

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let transceiver = Arc::clone(&transceiver);

                thread::spawn(move || transceiver.transceive(vec![i]).unwrap())
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(1, max_seen.load(Ordering::SeqCst));
        assert_eq!(0, in_flight.load(Ordering::SeqCst));
    }
}

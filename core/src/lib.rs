//! A crate to select applications on contactless cards over ISO-DEP and
//! relay their account payloads to an observer.

#[cfg(feature = "pcsc")]
pub mod pcsc;

pub mod apdu;
pub mod nfc;
pub mod reader;
pub mod session;
pub mod transceiver;

pub use reader::CardReader;
pub use transceiver::Transceiver;

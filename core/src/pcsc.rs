//! PC/SC backend for reaching contactless cards from desktop hosts.
//! Can be enabled by turning `pcsc` feature on.
//!
//! ## What is PC/SC?
//! PC/SC (Personal Computer/Smart Card) is an abstraction layer for communicating with smart
//! cards. Applications talk to any reader that supports PC/SC without depending on its driver
//! implementation. Windows and macOS support PC/SC by themselves, Linux does by installing the
//! pcsc-lite shared library.
//!
//! The backend is built on pcsc-rust; refer to its documentation for platform details:
//! <https://github.com/bluetech/pcsc-rust>
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tapcard::apdu::{ApplicationId, SelectProfiles, SELECT_HEADER};
//! use tapcard::pcsc::Context;
//! use tapcard::session::{ExchangeObserver, ReaderConfig};
//! use tapcard::CardReader;
//!
//! struct Printer;
//!
//! impl ExchangeObserver for Printer {
//!     fn on_result(&self, text: &str, kind: usize) {
//!         println!("[{}] {}", kind, text);
//!     }
//! }
//!
//! let profiles = SelectProfiles::new().with("", SELECT_HEADER);
//! let config = ReaderConfig::new(vec![ApplicationId::from("E000000000")], profiles);
//! let observer: Arc<dyn ExchangeObserver + Send + Sync> = Arc::new(Printer);
//! let reader = CardReader::new(config, Arc::downgrade(&observer));
//!
//! let ctx = Context::try_new().unwrap();
//! let target = ctx.open().unwrap();
//!
//! reader.on_tag_discovered(target).unwrap();
//! ```

use std::ffi::CString;
use std::thread::sleep;
use std::time::Duration;

use pcsc::{Card, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

use crate::nfc::{Target, TransportError};

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! info {
    ($($t: tt)*) => {};
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("PC/SC communication failed: {0}")]
    Pcsc(#[from] pcsc::Error),

    #[error("No reader found on the PC/SC service")]
    ReaderNotFound,
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// PC/SC context.
pub struct Context {
    ctx: pcsc::Context,
}

impl Context {
    /// Creates a PC/SC context in user scope.
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            ctx: pcsc::Context::establish(Scope::User)?,
        })
    }

    /// Finds the first PC/SC reader and wraps it as an exchange target.
    /// The card itself is reached later, through [`Target::connect`].
    pub fn open(&self) -> Result<PcscTarget> {
        let mut buf = [0u8; 2048];
        let reader = self
            .ctx
            .list_readers(&mut buf)?
            .next()
            .ok_or(Error::ReaderNotFound)?;

        debug!("Using device: {}", reader.to_str().unwrap_or_default());

        Ok(PcscTarget {
            ctx: self.ctx.clone(),
            reader: reader.to_owned(),
            card: None,
        })
    }
}

/// A contactless card reached through a PC/SC reader.
pub struct PcscTarget {
    ctx: pcsc::Context,
    reader: CString,
    card: Option<Card>,
}

impl Target for PcscTarget {
    /// Waits for a card to enter the field, polling once per second.
    fn connect(&mut self) -> Result<(), TransportError> {
        debug!("Waiting for a card");

        loop {
            match self
                .ctx
                .connect(&self.reader, ShareMode::Shared, Protocols::ANY)
            {
                Ok(card) => {
                    debug!("Connected to the card");
                    self.card = Some(card);

                    return Ok(());
                }
                Err(pcsc::Error::NoSmartcard) => {
                    info!("Still waiting for a card...");
                    sleep(Duration::from_secs(1));
                }
                Err(e) => return Err(TransportError::connection(Error::Pcsc(e))),
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.card.is_some()
    }

    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        let card = self
            .card
            .as_ref()
            .ok_or_else(|| TransportError::connection("no card in the field"))?;

        let mut buf = [0u8; MAX_BUFFER_SIZE];
        let received = card
            .transmit(command, &mut buf)
            .map_err(|e| TransportError::io(Error::Pcsc(e)))?;

        Ok(Vec::from(received))
    }
}

//! ISO 7816-4 APDU framing for application selection.

mod command;
mod response;

pub use command::{Command, SelectHeader, SelectProfiles, SELECT_HEADER, SELECT_VARIANT_HEADER};
pub use response::{Response, StatusWord};

use std::fmt::{Display, Formatter};

/// Status word a remote application answers to a successful SELECT.
pub const SELECTED_OK: StatusWord = StatusWord::new([0x90, 0x00]);

/// Largest AID that fits the one-byte Lc field of a short APDU.
const LC_MAX: usize = 0xFF;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The identifier is not a non-empty, even-length hex string that
    /// fits a one-byte Lc field.
    #[error("malformed application identifier {0:?}")]
    MalformedIdentifier(String),

    /// No configured header profile covers the identifier's family.
    #[error("no header profile configured for application {0:?}")]
    UnknownApplication(String),

    /// The response is too short to carry the two-byte status word.
    #[error("truncated response of {0} byte(s)")]
    TruncatedResponse(usize),
}

/// Identifies a selectable application on the remote endpoint, as an
/// even-length string of hex digits. Supplied by configuration and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ApplicationId(String);

impl ApplicationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the identifier into the raw AID octets.
    pub fn decode(&self) -> Result<Vec<u8>, Error> {
        let bytes =
            hex::decode(&self.0).map_err(|_| Error::MalformedIdentifier(self.0.clone()))?;

        if bytes.is_empty() || bytes.len() > LC_MAX {
            return Err(Error::MalformedIdentifier(self.0.clone()));
        }

        Ok(bytes)
    }
}

impl Display for ApplicationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_sample_identifier() {
        assert_eq!(
            vec![0xE0, 0x00, 0x00, 0x00, 0x00],
            ApplicationId::new("E000000000").decode().unwrap(),
        );
    }

    #[test]
    fn empty_identifier_is_malformed() {
        assert!(matches!(
            ApplicationId::new("").decode().unwrap_err(),
            Error::MalformedIdentifier(_),
        ));
    }

    #[test]
    fn odd_length_identifier_is_malformed() {
        assert!(matches!(
            ApplicationId::new("E00").decode().unwrap_err(),
            Error::MalformedIdentifier(_),
        ));
    }

    #[test]
    fn non_hex_identifier_is_malformed() {
        assert!(matches!(
            ApplicationId::new("NOTHEX").decode().unwrap_err(),
            Error::MalformedIdentifier(_),
        ));
    }

    #[test]
    fn identifier_wider_than_lc_is_malformed() {
        assert!(matches!(
            ApplicationId::new("00".repeat(256)).decode().unwrap_err(),
            Error::MalformedIdentifier(_),
        ));
    }
}

use std::fmt::{Display, Formatter};

use crate::apdu::{Error, SELECTED_OK};

/// Two-byte trailer of a response APDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StatusWord([u8; 2]);

impl StatusWord {
    pub const fn new(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        self.0
    }

    /// Whether the remote application reported a successful selection.
    pub fn is_selected_ok(self) -> bool {
        self == SELECTED_OK
    }
}

impl Display for StatusWord {
    /// Uppercase hex without separator, e.g. `6A82`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let [sw1, sw2] = self.to_bytes();

        write!(f, "{:02X}{:02X}", sw1, sw2)
    }
}

impl From<[u8; 2]> for StatusWord {
    fn from(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }
}

/// A response received from the remote endpoint, split exactly once into
/// its payload and status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    payload: Vec<u8>,
    status: StatusWord,
}

impl Response {
    /// Splits a raw transceive result. An empty input is the valid
    /// "nothing returned" outcome and yields `None`; a single octet cannot
    /// carry a status word and is rejected.
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Option<Self>, Error> {
        if bytes.is_empty() {
            return Ok(None);
        }
        if bytes.len() < 2 {
            return Err(Error::TruncatedResponse(bytes.len()));
        }

        let split = bytes.len() - 2;
        let status = StatusWord::new([bytes[split], bytes[split + 1]]);
        bytes.truncate(split);

        Ok(Some(Self {
            payload: bytes,
            status,
        }))
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn status(&self) -> StatusWord {
        self.status
    }

    /// Short form of `status().is_selected_ok()`.
    pub fn is_selected_ok(&self) -> bool {
        self.status.is_selected_ok()
    }

    /// Consumes the response into its payload and status word.
    pub fn into_parts(self) -> (Vec<u8>, StatusWord) {
        let Self { payload, status } = self;

        (payload, status)
    }
}

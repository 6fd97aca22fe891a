use crate::apdu::{ApplicationId, Error};

/// Header for plain application selection (`00 A4 04 00`).
pub const SELECT_HEADER: SelectHeader = SelectHeader::new(0x00, 0xA4, 0x04, 0x00);

/// Header for the select-variant family (`00 C4 04 00`).
pub const SELECT_VARIANT_HEADER: SelectHeader = SelectHeader::new(0x00, 0xC4, 0x04, 0x00);

/// Header octets of a SELECT-family command: `[CLA, INS, P1, P2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SelectHeader {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
}

impl SelectHeader {
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self { cla, ins, p1, p2 }
    }
}

/// Ordered mapping from identifier prefixes to the header used for the
/// matching family. The first matching entry wins, so new families can be
/// registered without touching any call site.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SelectProfiles {
    entries: Vec<(String, SelectHeader)>,
}

impl SelectProfiles {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a family by its identifier prefix.
    pub fn with(mut self, prefix: impl Into<String>, header: SelectHeader) -> Self {
        self.entries.push((prefix.into(), header));
        self
    }

    /// Finds the header configured for the identifier's family.
    pub fn resolve(&self, id: &ApplicationId) -> Option<SelectHeader> {
        self.entries
            .iter()
            .find(|(prefix, _)| id.as_str().starts_with(prefix.as_str()))
            .map(|(_, header)| *header)
    }
}

/// A SELECT command assembled for one application, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    header: SelectHeader,
    aid: Vec<u8>,
}

impl Command {
    /// Builds the SELECT command for the identifier, using the header its
    /// family is mapped to.
    pub fn select(profiles: &SelectProfiles, id: &ApplicationId) -> Result<Self, Error> {
        let aid = id.decode()?;
        let header = profiles
            .resolve(id)
            .ok_or_else(|| Error::UnknownApplication(id.as_str().to_owned()))?;

        Ok(Self { header, aid })
    }

    /// Converts the command into octets: `[CLA, INS, P1, P2, Lc, AID...]`.
    pub fn into_bytes(self) -> Vec<u8> {
        let Self { header, mut aid } = self;

        // Lc fits one byte; ApplicationId::decode enforces it.
        let mut buffer = vec![header.cla, header.ins, header.p1, header.p2, aid.len() as u8];
        buffer.append(&mut aid);

        buffer
    }
}

//! Sequencing application selects across one tag presentation.

use std::sync::Weak;
use std::time::Duration;

use crate::apdu::{ApplicationId, Command, Response, SelectProfiles, StatusWord};
use crate::nfc::{Target, TransportError};
use crate::transceiver::Transceiver;

#[cfg(feature = "tracing")]
use tracing::debug;

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {};
}

/// Observer text for an exchange that came back with no octets at all.
pub const NO_DATA: &str = "no data";

/// Feedback pulse length used unless the configuration overrides it.
pub const DEFAULT_HAPTIC: Duration = Duration::from_secs(10);

/// Receives one line of text per selection attempt.
///
/// Held weakly by the reader: when the owner drops the observer, pending
/// results are discarded instead of keeping the owner alive.
pub trait ExchangeObserver {
    /// Called once per attempted application, in configuration order,
    /// with `kind` the position of the application in the configured
    /// list. A session that fails before any exchange reports the
    /// failure text once, with `kind` 0.
    fn on_result(&self, text: &str, kind: usize);
}

/// Physical confirmation that an exchange completed.
pub trait HapticFeedback {
    /// Pulses for the given duration. Implementations swallow their own
    /// failures; feedback never disturbs the exchange sequence.
    fn vibrate(&self, duration: Duration);
}

/// Construction-time settings for a reader: which applications to select,
/// which header each family uses, and how long the feedback pulse lasts.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ReaderConfig {
    application_ids: Vec<ApplicationId>,
    profiles: SelectProfiles,
    haptic_duration: Duration,
}

impl ReaderConfig {
    pub fn new(application_ids: Vec<ApplicationId>, profiles: SelectProfiles) -> Self {
        Self {
            application_ids,
            profiles,
            haptic_duration: DEFAULT_HAPTIC,
        }
    }

    pub fn with_haptic_duration(mut self, duration: Duration) -> Self {
        self.haptic_duration = duration;
        self
    }

    pub fn application_ids(&self) -> &[ApplicationId] {
        &self.application_ids
    }

    pub fn profiles(&self) -> &SelectProfiles {
        &self.profiles
    }

    pub fn haptic_duration(&self) -> Duration {
        self.haptic_duration
    }
}

/// One completed exchange. Whether the status word matched the
/// selected-OK word is decided here, once, and read thereafter.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ExchangeResult {
    application_id: ApplicationId,
    status: StatusWord,
    payload: Vec<u8>,
    matched_ok: bool,
}

impl ExchangeResult {
    pub fn new(application_id: ApplicationId, response: Response) -> Self {
        let matched_ok = response.is_selected_ok();
        let (payload, status) = response.into_parts();

        Self {
            application_id,
            status,
            payload,
            matched_ok,
        }
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    pub fn status(&self) -> StatusWord {
        self.status
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn matched_ok(&self) -> bool {
        self.matched_ok
    }
}

enum Outcome {
    Completed(ExchangeResult),
    Empty,
    Failed(String),
}

/// Walks the configured applications over one connected transceiver and
/// reports one observer line per attempt. A failed attempt never stops
/// the attempts after it.
pub struct ExchangeSession<'a, T> {
    transceiver: &'a Transceiver<T>,
    config: &'a ReaderConfig,
    observer: Weak<dyn ExchangeObserver + Send + Sync>,
    haptic: Option<&'a (dyn HapticFeedback + Send + Sync)>,
}

impl<'a, T: Target> ExchangeSession<'a, T> {
    pub fn new(
        transceiver: &'a Transceiver<T>,
        config: &'a ReaderConfig,
        observer: Weak<dyn ExchangeObserver + Send + Sync>,
        haptic: Option<&'a (dyn HapticFeedback + Send + Sync)>,
    ) -> Self {
        Self {
            transceiver,
            config,
            observer,
            haptic,
        }
    }

    /// Selects every configured application in order. The observer hears
    /// about each attempt before the feedback pulse for it fires.
    pub fn run(&self) {
        for (kind, id) in self.config.application_ids().iter().enumerate() {
            let outcome = self.attempt(id);
            let text = match &outcome {
                Outcome::Completed(result) => render(result),
                Outcome::Empty => NO_DATA.to_owned(),
                Outcome::Failed(text) => text.clone(),
            };

            self.notify(&text, kind);

            if let Outcome::Completed(_) = outcome {
                self.ring_haptic();
            }
        }
    }

    /// Reports a failure that ended the session before any exchange.
    pub fn fail(&self, error: &TransportError) {
        self.notify(&error.to_string(), 0);
    }

    fn attempt(&self, id: &ApplicationId) -> Outcome {
        debug!("Selecting application {}", id);

        let command = match Command::select(self.config.profiles(), id) {
            Ok(command) => command,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        let received = match self.transceiver.transceive(command.into_bytes()) {
            Ok(received) => received,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        match Response::from_bytes(received) {
            Ok(Some(response)) => Outcome::Completed(ExchangeResult::new(id.clone(), response)),
            Ok(None) => Outcome::Empty,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    fn notify(&self, text: &str, kind: usize) {
        match self.observer.upgrade() {
            Some(observer) => observer.on_result(text, kind),
            None => {
                debug!("Observer has gone, discarding a result");
            }
        }
    }

    fn ring_haptic(&self) {
        if let Some(haptic) = self.haptic {
            haptic.vibrate(self.config.haptic_duration());
        }
    }
}

fn render(result: &ExchangeResult) -> String {
    let text = String::from_utf8_lossy(result.payload());

    if result.matched_ok() {
        text.into_owned()
    } else {
        format!("{} -- {}", result.status(), text)
    }
}

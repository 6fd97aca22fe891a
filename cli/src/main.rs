use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tapcard::apdu::{ApplicationId, SelectProfiles, SELECT_HEADER, SELECT_VARIANT_HEADER};
use tapcard::pcsc::Context;
use tapcard::session::{ExchangeObserver, HapticFeedback, ReaderConfig};
use tapcard::CardReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Error occurred on the PC/SC reader: {0}")]
    Reader(#[from] tapcard::pcsc::Error),

    #[error("The session failed before any exchange: {0}")]
    Session(#[from] tapcard::nfc::TransportError),
}

type Result<T> = std::result::Result<T, Error>;

/// Selects the configured applications on the next card presented to the
/// first PC/SC reader, printing one line per application.
#[derive(Parser)]
#[command(name = "tapcard", version)]
struct Args {
    /// Application identifier to select, in hex; repeatable, tried in order
    #[arg(
        long = "aid",
        default_values_t = [String::from("E000000000"), String::from("F111111111")],
    )]
    aids: Vec<String>,

    /// Identifier prefix of a family selected with the variant header
    #[arg(long = "variant-prefix", default_values_t = [String::from("F1")])]
    variant_prefixes: Vec<String>,

    /// Feedback pulse length in milliseconds
    #[arg(long, default_value_t = 10_000)]
    vibrate_ms: u64,

    /// Ring the terminal bell when an exchange completes
    #[arg(long)]
    bell: bool,

    /// Print results as JSON lines instead of plain text
    #[arg(long)]
    json: bool,
}

impl Args {
    fn config(&self) -> ReaderConfig {
        let mut profiles = SelectProfiles::new();

        for prefix in &self.variant_prefixes {
            profiles = profiles.with(prefix, SELECT_VARIANT_HEADER);
        }

        let ids = self.aids.iter().map(ApplicationId::new).collect();

        ReaderConfig::new(ids, profiles.with("", SELECT_HEADER))
            .with_haptic_duration(Duration::from_millis(self.vibrate_ms))
    }
}

struct Console {
    json: bool,
}

impl ExchangeObserver for Console {
    fn on_result(&self, text: &str, kind: usize) {
        if self.json {
            println!("{}", serde_json::json!({ "kind": kind, "text": text }));
        } else {
            println!("[{}] {}", kind, text);
        }
    }
}

/// Rings the terminal bell instead of a vibrator motor.
struct Bell;

impl HapticFeedback for Bell {
    fn vibrate(&self, _: Duration) {
        let mut out = std::io::stdout();

        out.write_all(b"\x07").and_then(|_| out.flush()).ok();
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let observer: Arc<dyn ExchangeObserver + Send + Sync> =
        Arc::new(Console { json: args.json });

    let mut reader = CardReader::new(args.config(), Arc::downgrade(&observer));
    if args.bell {
        reader = reader.with_feedback(Arc::new(Bell));
    }

    let ctx = Context::try_new()?;
    let target = ctx.open()?;

    info!("Waiting for a card on the first PC/SC reader");

    reader.on_tag_discovered(target)?;

    Ok(())
}

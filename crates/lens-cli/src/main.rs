//! Lens CLI - question token tooling
//!
//! Encodes cards into URL tokens, decodes tokens back into cards, and
//! inspects the classification and dirty state of saved questions.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ClassifyCommand, DecodeCommand, DirtyCommand, EncodeCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "LENS_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "LENS_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a card JSON document into a URL token
    Encode(EncodeCommand),
    /// Decode a URL token into card JSON
    Decode(DecodeCommand),
    /// Show how a card's dataset query is classified
    Classify(ClassifyCommand),
    /// Compare a card against its saved original
    Dirty(DirtyCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins when set; otherwise only the lens crates log at the chosen level
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .expect("Invalid RUST_LOG environment variable")
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "lens_cli={level},lens_query={level},lens_question={level}",
            level = cli.log_level
        ))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default subscriber");

    match cli.command {
        Commands::Encode(encode_cmd) => encode_cmd.execute(),
        Commands::Decode(decode_cmd) => decode_cmd.execute(),
        Commands::Classify(classify_cmd) => classify_cmd.execute(),
        Commands::Dirty(dirty_cmd) => dirty_cmd.execute(),
    }
}

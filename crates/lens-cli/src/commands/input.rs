use anyhow::Context;
use lens_question::{Card, InMemoryMetadata, Metadata, Question};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Read a file, or stdin when no path (or `-`) is given
pub fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            debug!("Reading {}", path.display());
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

pub fn parse_card(json: &str) -> anyhow::Result<Card> {
    serde_json::from_str(json).context("Input is not a valid card JSON document")
}

/// Questions built by the CLI have no catalog to consult
pub fn question(card: Card) -> Question {
    let metadata: Arc<dyn Metadata> = Arc::new(InMemoryMetadata::new());
    Question::new(metadata, card)
}

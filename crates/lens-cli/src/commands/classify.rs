use super::input::{parse_card, question, read_input};
use clap::Args;
use colored::Colorize;
use lens_question::decode_card;
use std::path::PathBuf;

#[derive(Args)]
pub struct ClassifyCommand {
    /// Card JSON file (reads stdin when omitted or `-`)
    pub input: Option<PathBuf>,

    /// Treat the input as a URL token instead of card JSON
    #[arg(long)]
    pub token: bool,
}

/// What the CLI reports about a classified question
#[derive(Debug, PartialEq)]
struct Classification {
    kind: String,
    atomic: Vec<String>,
    can_run: bool,
}

impl ClassifyCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let raw = read_input(self.input.as_deref())?;
        let report = self.classify(&raw)?;

        println!("{} {}", "Kind:".bright_white().bold(), report.kind.bright_cyan());
        println!(
            "{} {}",
            "Runnable:".bright_white().bold(),
            if report.can_run {
                "yes".bright_green()
            } else {
                "no".bright_yellow()
            }
        );
        for (index, kind) in report.atomic.iter().enumerate() {
            println!("  {} {}", format!("#{}", index).dimmed(), kind);
        }
        Ok(())
    }

    fn classify(&self, raw: &str) -> anyhow::Result<Classification> {
        let card = if self.token {
            decode_card(raw)?
        } else {
            parse_card(raw)?
        };
        let question = question(card);
        let query = question.query()?;

        Ok(Classification {
            kind: query.kind().to_string(),
            atomic: query
                .atomic_queries()?
                .iter()
                .map(|atomic| atomic.kind().to_string())
                .collect(),
            can_run: question.can_run(),
        })
    }
}

use super::input::{parse_card, question, read_input};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct DirtyCommand {
    /// Card JSON file holding the edited question (reads stdin when omitted or `-`)
    pub input: Option<PathBuf>,

    /// Card JSON file holding the saved original
    #[arg(long)]
    pub original: Option<PathBuf>,
}

impl DirtyCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let candidate = read_input(self.input.as_deref())?;
        let original = match self.original.as_deref() {
            Some(path) => Some(read_input(Some(path))?),
            None => None,
        };

        if is_dirty(&candidate, original.as_deref())? {
            println!("{}", "dirty".bright_yellow().bold());
        } else {
            println!("{}", "clean".bright_green().bold());
        }
        Ok(())
    }
}

fn is_dirty(candidate: &str, original: Option<&str>) -> anyhow::Result<bool> {
    let candidate = question(parse_card(candidate)?);
    let original = original.map(parse_card).transpose()?.map(question);
    Ok(candidate.is_dirty_compared_to(original.as_ref()))
}

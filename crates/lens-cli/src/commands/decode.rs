use super::input::read_input;
use clap::Args;
use lens_question::decode_card;
use std::path::PathBuf;

#[derive(Args)]
pub struct DecodeCommand {
    /// File holding the token (reads stdin when omitted or `-`)
    pub input: Option<PathBuf>,

    /// Print compact JSON instead of pretty-printed JSON
    #[arg(long)]
    pub compact: bool,
}

impl DecodeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let token = read_input(self.input.as_deref())?;
        println!("{}", self.decode(&token)?);
        Ok(())
    }

    fn decode(&self, token: &str) -> anyhow::Result<String> {
        let card = decode_card(token)?;
        let json = if self.compact {
            serde_json::to_string(&card)?
        } else {
            serde_json::to_string_pretty(&card)?
        };
        Ok(json)
    }
}

use super::input::{parse_card, read_input};
use clap::{ArgAction, Args};
use lens_question::{encode_card, UrlOptions};
use std::path::PathBuf;
use tracing::debug;

#[derive(Args)]
pub struct EncodeCommand {
    /// Card JSON file (reads stdin when omitted or `-`)
    pub input: Option<PathBuf>,

    /// Keep the lineage identifier (`original_card_id`) in the token
    #[arg(
        long,
        env = "LENS_INCLUDE_ORIGINAL_CARD_ID",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub include_original_card_id: bool,
}

impl EncodeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let json = read_input(self.input.as_deref())?;
        println!("{}", self.encode(&json)?);
        Ok(())
    }

    fn encode(&self, json: &str) -> anyhow::Result<String> {
        let card = parse_card(json)?;
        let options = UrlOptions {
            include_original_card_id: self.include_original_card_id,
        };
        debug!("Encoding card {:?} with {:?}", card.id, options);
        Ok(encode_card(&card, options)?)
    }
}

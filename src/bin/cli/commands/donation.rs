use clap::Subcommand;

use crate::client::ElevraClient;
use crate::output::{self, OutputConfig};

/// Donation commands
#[derive(Subcommand, Debug)]
pub enum DonationCommands {
    /// Quote the processing fee for a donation
    Quote {
        /// Donation amount in cents
        amount_cents: i64,
        /// Donor pays the fee on top of the amount
        #[clap(long)]
        cover_fee: bool,
    },
}

/// Executes a donation command
pub async fn execute(
    client: &ElevraClient,
    cmd: DonationCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        DonationCommands::Quote { amount_cents, cover_fee } => {
            let quote = client.fee_quote(amount_cents, cover_fee).await?;
            output::print_fee_quote(&quote, config);
        }
    }
    Ok(())
}

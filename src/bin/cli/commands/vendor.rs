use clap::Subcommand;
use elevra::dto::VendorQueryDto;

use crate::client::ElevraClient;
use crate::output::{self, OutputConfig};

/// Vendor marketplace commands
#[derive(Subcommand, Debug)]
pub enum VendorCommands {
    /// List vendor listings
    List {
        #[clap(long)]
        search: Option<String>,
        #[clap(long)]
        city: Option<String>,
        #[clap(long)]
        state: Option<String>,
        #[clap(long)]
        category: Option<String>,
        #[clap(long)]
        limit: Option<i64>,
    },
    /// Get a vendor listing by ID
    Get {
        /// The vendor ID
        id: String,
    },
}

/// Executes a vendor command
pub async fn execute(
    client: &ElevraClient,
    cmd: VendorCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        VendorCommands::List { search, city, state, category, limit } => {
            let query = VendorQueryDto { search, city, state, category, limit, offset: None };
            let vendors = client.list_vendors(&query).await?;
            output::print_vendors(&vendors, config);
        }
        VendorCommands::Get { id } => {
            let vendor = client.get_vendor(&id).await?;
            output::print_vendor(&vendor, config);
        }
    }
    Ok(())
}

use clap::Subcommand;
use elevra::dto::ElectionQueryDto;

use crate::client::ElevraClient;
use crate::output::{self, OutputConfig};

/// Election commands
#[derive(Subcommand, Debug)]
pub enum ElectionCommands {
    /// List elections, soonest first
    List {
        #[clap(long)]
        city: Option<String>,
        #[clap(long)]
        state: Option<String>,
        /// Only elections dated today or later
        #[clap(long)]
        upcoming: bool,
        #[clap(long)]
        limit: Option<i64>,
    },
    /// Get an election by ID
    Get {
        /// The election ID
        id: String,
    },
    /// List the candidates on an election's ballot
    Ballot {
        /// The election ID
        id: String,
    },
}

/// Executes an election command
pub async fn execute(
    client: &ElevraClient,
    cmd: ElectionCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ElectionCommands::List { city, state, upcoming, limit } => {
            let query = ElectionQueryDto {
                city,
                state,
                upcoming: upcoming.then_some(true),
                limit,
                offset: None,
            };
            let elections = client.list_elections(&query).await?;
            output::print_elections(&elections, config);
        }
        ElectionCommands::Get { id } => {
            let election = client.get_election(&id).await?;
            output::print_election(&election, config);
        }
        ElectionCommands::Ballot { id } => {
            let ballot = client.list_election_candidates(&id).await?;
            output::print_ballot(&ballot, config);
        }
    }
    Ok(())
}

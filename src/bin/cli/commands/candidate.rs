use clap::Subcommand;
use elevra::dto::{CandidateQueryDto, CreateCandidateDto};

use crate::client::ElevraClient;
use crate::output::{self, OutputConfig};

/// Candidate profile commands
#[derive(Subcommand, Debug)]
pub enum CandidateCommands {
    /// List candidates, optionally filtered
    List {
        /// Match against name, position and party
        #[clap(long)]
        search: Option<String>,
        /// Filter by city
        #[clap(long)]
        city: Option<String>,
        /// Filter by two-letter state code
        #[clap(long)]
        state: Option<String>,
        /// Only verified (or only unverified) profiles
        #[clap(long)]
        verified: Option<bool>,
        /// Restrict to these IDs (repeatable)
        #[clap(long = "id")]
        ids: Vec<i32>,
        /// Page size
        #[clap(long)]
        limit: Option<i64>,
        /// Rows to skip
        #[clap(long)]
        offset: Option<i64>,
    },
    /// Get a candidate by ID, or by slug with --slug
    Get {
        /// The candidate ID or slug
        id: String,
        /// Treat the argument as a slug
        #[clap(long)]
        slug: bool,
    },
    /// Create a candidate profile
    Create {
        /// Full name
        #[clap(long)]
        name: String,
        #[clap(long)]
        party: Option<String>,
        /// Office sought
        #[clap(long)]
        position: Option<String>,
        #[clap(long)]
        city: Option<String>,
        #[clap(long)]
        state: Option<String>,
        #[clap(long)]
        website: Option<String>,
    },
}

/// Executes a candidate command
pub async fn execute(
    client: &ElevraClient,
    cmd: CandidateCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        CandidateCommands::List { search, city, state, verified, ids, limit, offset } => {
            let query = CandidateQueryDto { search, city, state, verified, ids, limit, offset };
            let candidates = client.list_candidates(&query).await?;
            output::print_candidates(&candidates, config);
        }
        CandidateCommands::Get { id, slug } => {
            let candidate = if slug {
                client.get_candidate_by_slug(&id).await?
            } else {
                client.get_candidate(&id).await?
            };
            output::print_candidate(&candidate, config);
        }
        CandidateCommands::Create { name, party, position, city, state, website } => {
            let dto = CreateCandidateDto {
                name,
                party,
                position,
                city,
                state,
                website,
                ..Default::default()
            };
            let candidate = client.create_candidate(&dto).await?;
            output::print_candidate(&candidate, config);
        }
    }
    Ok(())
}

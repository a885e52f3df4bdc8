use clap::ValueEnum;
use elevra::dto::ElectionCandidateDto;
use elevra::models::{Candidate, Election, Vendor};
use elevra::services::admin_tasks::TaskOutcome;
use elevra::services::fees::FeeBreakdown;
use elevra::services::resolver::RouteMatch;
use serde::Serialize;

use crate::client::TaskInfo;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs or counts)
    pub quiet: bool,
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("Failed to encode output: {}", err),
    }
}

fn dollars(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}

fn place(city: Option<&str>, state: Option<&str>) -> String {
    match (city, state) {
        (Some(city), Some(state)) => format!("{}, {}", city, state),
        (Some(city), None) => city.to_string(),
        (None, Some(state)) => state.to_string(),
        (None, None) => "-".to_string(),
    }
}

/// Prints a list of candidates in the specified format
pub fn print_candidates(candidates: &[Candidate], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if candidates.is_empty() {
                if !config.quiet {
                    println!("No candidates found.");
                }
                return;
            }
            if config.quiet {
                for candidate in candidates {
                    println!("{}", candidate.id);
                }
                return;
            }
            let max_name = candidates.iter().map(|c| c.name.len()).max().unwrap_or(4).max(4);
            println!("{:<6}  {:<name_w$}  {:<24}  PLACE", "ID", "NAME", "POSITION", name_w = max_name);
            for candidate in candidates {
                let name = if candidate.verified {
                    format!("{} *", candidate.name)
                } else {
                    candidate.name.clone()
                };
                println!(
                    "{:<6}  {:<name_w$}  {:<24}  {}",
                    candidate.id,
                    name,
                    candidate.position.as_deref().unwrap_or("-"),
                    place(candidate.city.as_deref(), candidate.state.as_deref()),
                    name_w = max_name + 2,
                );
            }
        }
        OutputFormat::Json => print_json(candidates),
    }
}

/// Prints a single candidate in the specified format
pub fn print_candidate(candidate: &Candidate, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", candidate.id);
                return;
            }
            println!("ID:       {}", candidate.id);
            println!("Name:     {}", candidate.name);
            println!("Slug:     {}", candidate.slug);
            println!("Party:    {}", candidate.party.as_deref().unwrap_or("-"));
            println!("Position: {}", candidate.position.as_deref().unwrap_or("-"));
            println!("Place:    {}", place(candidate.city.as_deref(), candidate.state.as_deref()));
            println!("Verified: {}", candidate.verified);
            if let Some(ref website) = candidate.website {
                println!("Website:  {}", website);
            }
        }
        OutputFormat::Json => print_json(candidate),
    }
}

/// Prints a list of elections in the specified format
pub fn print_elections(elections: &[Election], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if elections.is_empty() {
                if !config.quiet {
                    println!("No elections found.");
                }
                return;
            }
            if config.quiet {
                for election in elections {
                    println!("{}", election.id);
                }
                return;
            }
            println!("{:<6}  {:<10}  {:<32}  PLACE", "ID", "DATE", "POSITION");
            for election in elections {
                println!(
                    "{:<6}  {:<10}  {:<32}  {}, {}",
                    election.id, election.election_date, election.position, election.city, election.state,
                );
            }
        }
        OutputFormat::Json => print_json(elections),
    }
}

/// Prints a single election in the specified format
pub fn print_election(election: &Election, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", election.id);
                return;
            }
            println!("ID:       {}", election.id);
            println!("Position: {}", election.position);
            println!("Date:     {}", election.election_date);
            println!("Place:    {}, {}", election.city, election.state);
            println!("Type:     {}", election.election_type);
            println!("Seats:    {}", election.seats);
            if !election.description.is_empty() {
                println!("\n{}", election.description);
            }
        }
        OutputFormat::Json => print_json(election),
    }
}

/// Prints the candidates on a ballot
pub fn print_ballot(ballot: &[ElectionCandidateDto], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if ballot.is_empty() {
                if !config.quiet {
                    println!("No candidates on this ballot.");
                }
                return;
            }
            for entry in ballot {
                if config.quiet {
                    println!("{}", entry.candidate.id);
                    continue;
                }
                let party = if entry.link.party.is_empty() { "-" } else { entry.link.party.as_str() };
                println!("{:<6}  {}  ({})", entry.candidate.id, entry.candidate.name, party);
            }
        }
        OutputFormat::Json => print_json(ballot),
    }
}

/// Prints a list of vendor listings in the specified format
pub fn print_vendors(vendors: &[Vendor], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if vendors.is_empty() {
                if !config.quiet {
                    println!("No vendors found.");
                }
                return;
            }
            if config.quiet {
                for vendor in vendors {
                    println!("{}", vendor.id);
                }
                return;
            }
            println!("{:<6}  {:<32}  {:<20}  PLACE", "ID", "NAME", "CATEGORY");
            for vendor in vendors {
                println!(
                    "{:<6}  {:<32}  {:<20}  {}",
                    vendor.id,
                    vendor.name,
                    vendor.category.as_deref().unwrap_or("-"),
                    place(vendor.city.as_deref(), vendor.state.as_deref()),
                );
            }
        }
        OutputFormat::Json => print_json(vendors),
    }
}

/// Prints a single vendor listing in the specified format
pub fn print_vendor(vendor: &Vendor, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", vendor.id);
                return;
            }
            println!("ID:       {}", vendor.id);
            println!("Name:     {}", vendor.name);
            println!("Slug:     {}", vendor.slug);
            println!("Category: {}", vendor.category.as_deref().unwrap_or("-"));
            println!("Place:    {}", place(vendor.city.as_deref(), vendor.state.as_deref()));
            println!("Status:   {}", vendor.status);
            println!("Plan:     {}", vendor.subscription);
        }
        OutputFormat::Json => print_json(vendor),
    }
}

/// Prints a fee quote
pub fn print_fee_quote(quote: &FeeBreakdown, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", quote.total_cents);
                return;
            }
            println!("Donation: {}", dollars(quote.amount_cents));
            println!("Fee:      {}", dollars(quote.fee_cents));
            println!("Charged:  {}", dollars(quote.total_cents));
            println!("Received: {}", dollars(quote.net_cents));
        }
        OutputFormat::Json => print_json(quote),
    }
}

/// Prints where a query resolved to
pub fn print_route(route: &RouteMatch, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", route.href);
                return;
            }
            println!("{} ({:?}, confidence {:.2})", route.href, route.kind, route.confidence);
        }
        OutputFormat::Json => print_json(route),
    }
}

/// Prints the maintenance task registry
pub fn print_tasks(tasks: &[TaskInfo], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            for task in tasks {
                if config.quiet {
                    println!("{}", task.key);
                    continue;
                }
                let marker = if task.admin_only { " [admin]" } else { "" };
                println!("{}{}", task.key, marker);
                println!("    {}", task.description);
                for param in &task.params {
                    println!("    --param {}=<n>  {} (default {})", param.name, param.description, param.default);
                }
            }
        }
        OutputFormat::Json => print_json(tasks),
    }
}

/// Prints the result of a task run
pub fn print_task_outcome(outcome: &TaskOutcome, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", outcome.affected);
                return;
            }
            println!("{}: {}", outcome.key, outcome.message);
        }
        OutputFormat::Json => print_json(outcome),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollars() {
        assert_eq!(dollars(0), "$0.00");
        assert_eq!(dollars(1005), "$10.05");
        assert_eq!(dollars(250_000), "$2500.00");
    }

    #[test]
    fn test_place() {
        assert_eq!(place(Some("Austin"), Some("TX")), "Austin, TX");
        assert_eq!(place(None, Some("TX")), "TX");
        assert_eq!(place(None, None), "-");
    }
}

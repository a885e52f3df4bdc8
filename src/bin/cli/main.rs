mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use client::ElevraClient;
use elevra::config;
use output::{OutputConfig, OutputFormat};
use std::process;

/// CLI for the Elevra civic engagement API
#[derive(Parser, Debug)]
#[clap(name = "elevra-cli", about = "CLI for the Elevra API")]
struct Cli {
    /// Server URL to connect to
    #[clap(
        long,
        env = "ELEVRA_URL",
        global = true
    )]
    server_url: Option<String>,

    /// Identity token for staff and owner commands
    #[clap(long, env = "ELEVRA_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs or counts)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse and create candidate profiles
    #[command(subcommand)]
    Candidate(commands::candidate::CandidateCommands),
    /// Browse elections and their ballots
    #[command(subcommand)]
    Election(commands::election::ElectionCommands),
    /// Browse the vendor marketplace
    #[command(subcommand)]
    Vendor(commands::vendor::VendorCommands),
    /// Donation helpers
    #[command(subcommand)]
    Donation(commands::donation::DonationCommands),
    /// Resolve a free-text query to a page
    Resolve {
        /// The query, e.g. "donate to jane rivera"
        #[clap(required = true)]
        query: Vec<String>,
    },
    /// Run maintenance tasks
    #[command(subcommand)]
    Admin(commands::admin::AdminCommands),
}

/// Resolves the server URL from CLI args, config file, or defaults
///
/// Precedence: CLI flag / env var > config file > default (port based on debug/release)
fn resolve_server_url(cli_url: Option<String>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    let config_dir = config::get_config_dir_path();
    if let Some(ref dir) = config_dir {
        let config_path = dir.join("config.toml");
        if let Ok(update) = config::config_from_file(Some(config_path)) {
            if let Some(url) = update.server_url {
                return url;
            }
        }
    }

    // Default: port 3001 in debug builds, 3000 in release
    let port = if cfg!(debug_assertions) { 3001 } else { 3000 };
    format!("http://localhost:{}", port)
}

/// Formats an error for human-readable stderr output
fn format_error(err: &dyn std::error::Error) -> String {
    let err_string = err.to_string();

    if err_string.contains("error sending request")
        || err_string.contains("connection refused")
        || err_string.contains("Connection refused")
        || err_string.contains("tcp connect error")
    {
        return format!(
            "Could not connect to server. Is elevra running?\n  {}",
            err_string
        );
    }

    err_string
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server_url = resolve_server_url(cli.server_url);
    let client = ElevraClient::new(server_url, cli.token);
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Candidate(cmd) => commands::candidate::execute(&client, cmd, &output_config).await,
        Commands::Election(cmd) => commands::election::execute(&client, cmd, &output_config).await,
        Commands::Vendor(cmd) => commands::vendor::execute(&client, cmd, &output_config).await,
        Commands::Donation(cmd) => commands::donation::execute(&client, cmd, &output_config).await,
        Commands::Resolve { query } => commands::resolve::execute(&client, query, &output_config).await,
        Commands::Admin(cmd) => commands::admin::execute(&client, cmd, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}

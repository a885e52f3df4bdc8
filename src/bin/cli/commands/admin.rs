use clap::Subcommand;
use elevra::dto::RunTaskDto;

use crate::client::ElevraClient;
use crate::output::{self, OutputConfig};

/// Maintenance task commands (staff only)
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// List the maintenance tasks
    Tasks,
    /// Run a maintenance task
    Run {
        /// The task key
        key: String,
        /// Task parameter as name=value (repeatable)
        #[clap(long = "param", value_parser = parse_param)]
        params: Vec<(String, i64)>,
    },
}

/// Parses a `name=value` task parameter
fn parse_param(raw: &str) -> Result<(String, i64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {}", raw))?;
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("{} must be an integer", name))?;
    Ok((name.trim().to_string(), value))
}

/// Executes an admin command
pub async fn execute(
    client: &ElevraClient,
    cmd: AdminCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AdminCommands::Tasks => {
            let tasks = client.list_tasks().await?;
            output::print_tasks(&tasks, config);
        }
        AdminCommands::Run { key, params } => {
            let dto = RunTaskDto {
                params: params
                    .into_iter()
                    .map(|(name, value)| (name, serde_json::Value::from(value)))
                    .collect(),
            };
            let outcome = client.run_task(&key, &dto).await?;
            output::print_task_outcome(&outcome, config);
        }
    }
    Ok(())
}

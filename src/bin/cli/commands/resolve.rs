use crate::client::ElevraClient;
use crate::output::{self, OutputConfig};

/// Resolves a free-text query to the page it should open
pub async fn execute(
    client: &ElevraClient,
    query: Vec<String>,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let route = client.resolve(&query.join(" ")).await?;
    output::print_route(&route, config);
    Ok(())
}

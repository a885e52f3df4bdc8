use elevra::dto::{CandidateQueryDto, CreateCandidateDto, ElectionCandidateDto, ElectionQueryDto, FeeQuoteDto, RunTaskDto, VendorQueryDto};
use elevra::models::{Candidate, Election, Vendor};
use elevra::services::admin_tasks::TaskOutcome;
use elevra::services::fees::FeeBreakdown;
use elevra::services::resolver::RouteMatch;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;

/// Error type for CLI client operations
#[derive(Debug)]
pub enum ClientError {
    /// Server returned an error status with a message body
    Server { status: reqwest::StatusCode, message: String },
    /// Network/connection/request error
    Request(reqwest::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status.as_u16(), message)
            }
            ClientError::Request(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(err) => Some(err),
            ClientError::Server { .. } => None,
        }
    }
}

/// Extension trait for checking HTTP responses and extracting server error messages
trait ResponseExt {
    /// Checks for error status and extracts the server's error message body
    async fn check(self) -> Result<reqwest::Response, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        let message = match self.json::<serde_json::Value>().await {
            Ok(body) => body.get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
            Err(_) => format!("HTTP {}", status),
        };
        Err(ClientError::Server { status, message })
    }
}

/// A maintenance task as listed by the server
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct TaskInfo {
    pub key: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub params: Vec<TaskParamInfo>,
    pub admin_only: bool,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct TaskParamInfo {
    pub name: String,
    pub description: String,
    pub default: i64,
}

/// HTTP client wrapper for communicating with the Elevra API
pub struct ElevraClient {
    /// The base URL of the server (e.g. "http://localhost:3000")
    base_url: String,
    /// Bearer token sent with every request, when set
    token: Option<String>,
    /// The underlying HTTP client
    client: Client,
}

/// Builds query parameters for the candidate listing
///
/// `ids` is sent as a repeated parameter, which the form serializer can't express.
fn build_candidate_params(query: &CandidateQueryDto) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = Vec::new();

    if let Some(ref search) = query.search {
        params.push(("search", search.clone()));
    }
    if let Some(ref city) = query.city {
        params.push(("city", city.clone()));
    }
    if let Some(ref state) = query.state {
        params.push(("state", state.clone()));
    }
    if let Some(verified) = query.verified {
        params.push(("verified", verified.to_string()));
    }
    for id in &query.ids {
        params.push(("ids", id.to_string()));
    }
    if let Some(limit) = query.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(offset) = query.offset {
        params.push(("offset", offset.to_string()));
    }

    params
}

impl ElevraClient {
    /// Creates a new ElevraClient
    ///
    /// ### Arguments
    ///
    /// * `base_url` - The base URL of the Elevra server
    /// * `token` - Identity token for endpoints that need a signed-in caller
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Candidate endpoints ──────────────────────────────────────────

    /// Lists candidates matching the query
    pub async fn list_candidates(&self, query: &CandidateQueryDto) -> Result<Vec<Candidate>, ClientError> {
        let params = build_candidate_params(query);
        Self::send(self.request(Method::GET, "/candidates").query(&params)).await
    }

    /// Gets a candidate by numeric ID
    pub async fn get_candidate(&self, id: &str) -> Result<Candidate, ClientError> {
        Self::send(self.request(Method::GET, &format!("/candidates/{}", id))).await
    }

    /// Gets a candidate by slug
    pub async fn get_candidate_by_slug(&self, slug: &str) -> Result<Candidate, ClientError> {
        Self::send(self.request(Method::GET, &format!("/candidates/slug/{}", slug))).await
    }

    /// Creates a candidate profile
    pub async fn create_candidate(&self, dto: &CreateCandidateDto) -> Result<Candidate, ClientError> {
        Self::send(self.request(Method::POST, "/candidates").json(dto)).await
    }

    // ── Election endpoints ───────────────────────────────────────────

    /// Lists elections matching the query
    pub async fn list_elections(&self, query: &ElectionQueryDto) -> Result<Vec<Election>, ClientError> {
        Self::send(self.request(Method::GET, "/elections").query(query)).await
    }

    /// Gets an election by ID
    pub async fn get_election(&self, id: &str) -> Result<Election, ClientError> {
        Self::send(self.request(Method::GET, &format!("/elections/{}", id))).await
    }

    /// Lists the candidates on an election's ballot
    pub async fn list_election_candidates(&self, id: &str) -> Result<Vec<ElectionCandidateDto>, ClientError> {
        Self::send(self.request(Method::GET, &format!("/elections/{}/candidates", id))).await
    }

    // ── Vendor endpoints ─────────────────────────────────────────────

    /// Lists vendor listings matching the query
    pub async fn list_vendors(&self, query: &VendorQueryDto) -> Result<Vec<Vendor>, ClientError> {
        Self::send(self.request(Method::GET, "/vendors").query(query)).await
    }

    /// Gets a vendor listing by ID
    pub async fn get_vendor(&self, id: &str) -> Result<Vendor, ClientError> {
        Self::send(self.request(Method::GET, &format!("/vendors/{}", id))).await
    }

    // ── Donation endpoints ───────────────────────────────────────────

    /// Quotes the processing fee for a donation
    pub async fn fee_quote(&self, amount_cents: i64, cover_fee: bool) -> Result<FeeBreakdown, ClientError> {
        let dto = FeeQuoteDto { amount_cents, cover_fee };
        Self::send(self.request(Method::POST, "/donations/fee-quote").json(&dto)).await
    }

    // ── Routing ──────────────────────────────────────────────────────

    /// Resolves a free-text query to a page
    pub async fn resolve(&self, query: &str) -> Result<RouteMatch, ClientError> {
        Self::send(self.request(Method::GET, "/resolve").query(&[("q", query)])).await
    }

    // ── Admin task endpoints ─────────────────────────────────────────

    /// Lists the maintenance tasks
    pub async fn list_tasks(&self) -> Result<Vec<TaskInfo>, ClientError> {
        Self::send(self.request(Method::GET, "/admin/tasks")).await
    }

    /// Runs a maintenance task
    pub async fn run_task(&self, key: &str, dto: &RunTaskDto) -> Result<TaskOutcome, ClientError> {
        Self::send(self.request(Method::POST, &format!("/admin/tasks/{}", key)).json(dto)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_params_repeat_ids() {
        let query = CandidateQueryDto {
            search: Some("rivera".to_string()),
            ids: vec![3, 7],
            ..Default::default()
        };
        let params = build_candidate_params(&query);
        assert_eq!(
            params,
            vec![
                ("search", "rivera".to_string()),
                ("ids", "3".to_string()),
                ("ids", "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = ElevraClient::new("http://localhost:3000/".to_string(), None);
        assert_eq!(client.base_url, "http://localhost:3000");
    }
}

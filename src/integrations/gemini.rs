use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::{IntegrationError, ResponseExt};
use crate::models::{JobSnapshot, JobStatus};
use crate::services::batch::{BatchPrompt, BatchProvider, SubmittedBatch};

const SERVICE: &str = "Batch processing";

/// Client for the LLM batch API
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_base: String,
    api_key: String,
    default_model: String,
}

/// Builds the inline batch request body
pub fn batch_request_body(display_name: &str, prompts: &[BatchPrompt]) -> Value {
    let requests: Vec<Value> = prompts
        .iter()
        .map(|prompt| {
            json!({
                "request": {
                    "contents": [{ "role": "user", "parts": [{ "text": prompt.text }] }]
                },
                "metadata": { "key": prompt.key }
            })
        })
        .collect();

    json!({
        "batch": {
            "display_name": display_name,
            "input_config": {
                "requests": { "requests": requests }
            }
        }
    })
}

/// Reads the provider's name and status out of a batch or operation resource
///
/// Status fields show up either at the top level or under `metadata`
/// depending on the endpoint, so both are checked.
pub fn parse_batch_resource(body: &Value) -> Result<(String, JobSnapshot), String> {
    let metadata = body.get("metadata");

    let name = metadata
        .and_then(|m| m.get("name"))
        .or_else(|| body.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| "batch resource has no name".to_string())?
        .to_string();

    let state = metadata
        .and_then(|m| m.get("state"))
        .or_else(|| body.get("state"))
        .and_then(Value::as_str)
        .unwrap_or("BATCH_STATE_PENDING");
    let mut status = JobStatus::from_provider_state(state);

    let output = metadata
        .and_then(|m| m.get("output"))
        .or_else(|| body.get("response"))
        .or_else(|| body.get("output"));
    let result_file = output
        .and_then(|o| o.get("responsesFile"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let error_message = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);
    if error_message.is_some() && !status.is_terminal() {
        status = JobStatus::Failed;
    }

    Ok((name, JobSnapshot { status, result_file, error_message }))
}

impl GeminiClient {
    pub fn new(http: Client, api_base: String, api_key: String, default_model: String) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            default_model,
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn decode(response: reqwest::Response) -> Result<(String, JobSnapshot), IntegrationError> {
        let body: Value = response.check(SERVICE).await?.json().await?;
        parse_batch_resource(&body).map_err(|message| IntegrationError::Decode { service: SERVICE, message })
    }
}

impl BatchProvider for GeminiClient {
    #[instrument(skip(self, prompts), fields(count = prompts.len()))]
    async fn submit(&self, display_name: &str, model: &str, prompts: &[BatchPrompt]) -> Result<SubmittedBatch, IntegrationError> {
        let url = format!("{}/v1beta/models/{}:batchGenerateContent", self.api_base, model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&batch_request_body(display_name, prompts))
            .send()
            .await?;
        let (provider_name, snapshot) = Self::decode(response).await?;

        info!("Submitted batch {} with {} requests", provider_name, prompts.len());
        Ok(SubmittedBatch { provider_name, snapshot })
    }

    #[instrument(skip(self))]
    async fn poll(&self, provider_name: &str) -> Result<JobSnapshot, IntegrationError> {
        let url = format!("{}/v1beta/{}", self.api_base, provider_name);
        let response = self
            .http
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let (_, snapshot) = Self::decode(response).await?;

        debug!("Batch {} is {}", provider_name, snapshot.status);
        Ok(snapshot)
    }
}

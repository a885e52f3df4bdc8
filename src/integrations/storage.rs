use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{IntegrationError, ResponseExt};

const SERVICE: &str = "File storage";

/// A signed URL the browser uploads the file to directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTicket {
    pub upload_url: String,
    /// Where the file is served from once uploaded
    pub public_url: String,
    pub pathname: String,
}

#[derive(Serialize)]
struct UploadUrlRequest<'a> {
    pathname: &'a str,
    content_type: &'a str,
    maximum_size_in_bytes: u64,
}

#[derive(Deserialize)]
struct UploadUrlResponse {
    #[serde(alias = "uploadUrl")]
    upload_url: String,
    #[serde(alias = "url")]
    public_url: String,
}

/// Client for the blob storage upload API
#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    api_url: String,
    token: String,
}

impl StorageClient {
    pub fn new(http: Client, api_url: String, token: String) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Requests a signed upload URL for `pathname`
    #[instrument(skip(self))]
    pub async fn issue_upload_url(&self, pathname: &str, content_type: &str, max_bytes: u64) -> Result<UploadTicket, IntegrationError> {
        let url = format!("{}/upload-url", self.api_url);
        let body = UploadUrlRequest {
            pathname,
            content_type,
            maximum_size_in_bytes: max_bytes,
        };

        let response: UploadUrlResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?
            .check(SERVICE)
            .await?
            .json()
            .await?;

        info!("Issued upload URL for {}", pathname);
        Ok(UploadTicket {
            upload_url: response.upload_url,
            public_url: response.public_url,
            pathname: pathname.to_string(),
        })
    }
}

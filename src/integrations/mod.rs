/// Third-party HTTP integrations
///
/// Each client is a thin call-through to a vendor API. A client only exists
/// when its credentials are configured; handlers that need a missing client
/// answer 503.

pub mod payments;
pub mod storage;
pub mod email;
pub mod gemini;
pub mod telemetry;

use reqwest::Client;
use thiserror::Error;

use crate::config::Config;

pub use email::EmailClient;
pub use gemini::GeminiClient;
pub use payments::PaymentsClient;
pub use storage::StorageClient;

#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("Unexpected response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

/// Extension trait turning non-success responses into `IntegrationError`
pub(crate) trait ResponseExt {
    /// Checks the status and keeps the body of failed responses for the error
    async fn check(self, service: &'static str) -> Result<reqwest::Response, IntegrationError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self, service: &'static str) -> Result<reqwest::Response, IntegrationError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status().as_u16();
        let message = match self.text().await {
            Ok(body) if !body.is_empty() => body.chars().take(500).collect(),
            _ => format!("HTTP {}", status),
        };
        Err(IntegrationError::Upstream { service, status, message })
    }
}

/// The configured integration clients
#[derive(Clone, Default)]
pub struct Integrations {
    pub payments: Option<PaymentsClient>,
    pub email: Option<EmailClient>,
    pub storage: Option<StorageClient>,
    pub batch: Option<GeminiClient>,
}

impl Integrations {
    /// Builds a client for every integration whose credentials are present
    pub fn from_config(config: &Config) -> Self {
        let http = Client::new();

        let payments = config
            .stripe_secret_key
            .as_ref()
            .map(|key| PaymentsClient::new(http.clone(), config.stripe_api_base.clone(), key.clone()));

        let email = config.resend_api_key.as_ref().map(|key| {
            EmailClient::new(
                http.clone(),
                config.resend_api_base.clone(),
                key.clone(),
                config.email_from.clone(),
            )
        });

        let storage = match (&config.blob_api_url, &config.blob_token) {
            (Some(url), Some(token)) => Some(StorageClient::new(http.clone(), url.clone(), token.clone())),
            _ => None,
        };

        let batch = config.gemini_api_key.as_ref().map(|key| {
            GeminiClient::new(
                http.clone(),
                config.gemini_api_base.clone(),
                key.clone(),
                config.gemini_model.clone(),
            )
        });

        Self { payments, email, storage, batch }
    }

    pub fn payments(&self) -> Result<&PaymentsClient, IntegrationError> {
        self.payments.as_ref().ok_or(IntegrationError::NotConfigured("Payments"))
    }

    pub fn storage(&self) -> Result<&StorageClient, IntegrationError> {
        self.storage.as_ref().ok_or(IntegrationError::NotConfigured("File storage"))
    }

    pub fn batch(&self) -> Result<&GeminiClient, IntegrationError> {
        self.batch.as_ref().ok_or(IntegrationError::NotConfigured("Batch processing"))
    }
}

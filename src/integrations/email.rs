use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{IntegrationError, ResponseExt};
use crate::services::email_templates::RenderedEmail;

const SERVICE: &str = "Email";

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SentEmail {
    pub id: String,
}

/// Client for the transactional email API
#[derive(Clone)]
pub struct EmailClient {
    http: Client,
    api_base: String,
    api_key: String,
    from: String,
}

impl EmailClient {
    pub fn new(http: Client, api_base: String, api_key: String, from: String) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            from,
        }
    }

    /// Sends a rendered email to a single recipient
    #[instrument(skip(self, email), fields(subject = %email.subject))]
    pub async fn send(&self, to: &str, email: &RenderedEmail) -> Result<SentEmail, IntegrationError> {
        let url = format!("{}/emails", self.api_base);
        let body = SendEmailRequest {
            from: &self.from,
            to: [to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let sent: SentEmail = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .check(SERVICE)
            .await?
            .json()
            .await?;

        info!("Sent email {}", sent.id);
        Ok(sent)
    }
}

/// Sends an email if the integration is configured, logging any failure
///
/// Returns whether the email was accepted.
pub async fn send_best_effort(client: Option<&EmailClient>, to: &str, email: &RenderedEmail) -> bool {
    let Some(client) = client else {
        warn!("Email is not configured; skipping \"{}\"", email.subject);
        return false;
    };
    match client.send(to, email).await {
        Ok(_) => true,
        Err(err) => {
            warn!("Failed to send \"{}\": {}", email.subject, err);
            false
        }
    }
}

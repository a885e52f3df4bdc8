use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{IntegrationError, ResponseExt};

const SERVICE: &str = "Payments";

/// What to charge for a donation checkout
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub donation_id: i32,
    pub candidate_name: String,
    pub total_cents: i64,
    pub donor_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// The subset of a checkout session the server relies on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    /// `open`, `complete` or `expired`
    #[serde(default)]
    pub status: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`
    #[serde(default)]
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Paid,
    Expired,
    Open,
}

impl CheckoutSession {
    pub fn outcome(&self) -> SessionOutcome {
        if self.payment_status.as_deref() == Some("paid") {
            SessionOutcome::Paid
        } else if self.status.as_deref() == Some("expired") {
            SessionOutcome::Expired
        } else {
            SessionOutcome::Open
        }
    }
}

/// Encodes a checkout request as the nested form fields the payments API expects
pub fn checkout_form_params(request: &CheckoutRequest) -> Vec<(String, String)> {
    let donation_id = request.donation_id.to_string();
    vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("customer_email".to_string(), request.donor_email.clone()),
        ("client_reference_id".to_string(), donation_id.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("line_items[0][price_data][currency]".to_string(), "usd".to_string()),
        ("line_items[0][price_data][unit_amount]".to_string(), request.total_cents.to_string()),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            format!("Donation to {}", request.candidate_name),
        ),
        ("metadata[donation_id]".to_string(), donation_id),
    ]
}

/// Client for hosted checkout sessions
#[derive(Clone)]
pub struct PaymentsClient {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl PaymentsClient {
    pub fn new(http: Client, api_base: String, secret_key: String) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    /// Creates a hosted checkout session for a pending donation
    #[instrument(skip(self, request), fields(donation_id = request.donation_id))]
    pub async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, IntegrationError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);
        let session: CheckoutSession = self
            .http
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&checkout_form_params(request))
            .send()
            .await?
            .check(SERVICE)
            .await?
            .json()
            .await?;

        if session.url.is_none() {
            return Err(IntegrationError::Decode {
                service: SERVICE,
                message: "checkout session has no URL".to_string(),
            });
        }

        info!("Created checkout session {}", session.id);
        Ok(session)
    }

    /// Fetches the current state of a checkout session
    #[instrument(skip(self))]
    pub async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, IntegrationError> {
        let url = format!("{}/v1/checkout/sessions/{}", self.api_base, session_id);
        let session: CheckoutSession = self
            .http
            .get(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?
            .check(SERVICE)
            .await?
            .json()
            .await?;

        debug!("Session {} status={:?} payment_status={:?}", session.id, session.status, session.payment_status);
        Ok(session)
    }
}

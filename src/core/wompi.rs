//! Wompi payment gateway primitives.
//!
//! Two signatures are involved: the checkout integrity signature, a plain
//! SHA-256 over `reference + amount_in_cents + currency + integrity_secret`,
//! and the webhook event signature, an HMAC-SHA256 of the raw body keyed
//! with the events secret and sent hex-encoded in `X-Event-Signature`.

use crate::config::WompiConfig;
use crate::errors::{Error, Result};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "x-event-signature";

/// Event name of transaction status changes
pub const TRANSACTION_UPDATED: &str = "transaction.updated";

/// Computes the integrity signature the checkout widget requires.
#[must_use]
pub fn integrity_signature(
    reference: &str,
    amount_in_cents: i64,
    currency: &str,
    integrity_secret: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(amount_in_cents.to_string().as_bytes());
    hasher.update(currency.as_bytes());
    hasher.update(integrity_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn event_mac(events_secret: &str) -> Result<HmacSha256> {
    if events_secret.is_empty() {
        return Err(Error::Config {
            message: "WOMPI_EVENTS_SECRET is not configured".to_string(),
        });
    }
    HmacSha256::new_from_slice(events_secret.as_bytes())
        .map_err(|e| Error::internal(format!("Invalid HMAC key: {e}")))
}

/// Signs a webhook body the way the gateway does.
pub fn sign_event(events_secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = event_mac(events_secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a webhook signature in constant time.
///
/// # Errors
/// Returns [`Error::Unauthorized`] if the signature is missing, not hex or does not match.
pub fn verify_event_signature(events_secret: &str, body: &[u8], signature: &str) -> Result<()> {
    let mut mac = event_mac(events_secret)?;
    mac.update(body);

    let provided = hex::decode(signature.trim())
        .map_err(|_| Error::unauthorized("Invalid webhook signature"))?;
    mac.verify_slice(&provided)
        .map_err(|_| Error::unauthorized("Invalid webhook signature"))
}

/// Transaction status as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Approved,
    Declined,
    Voided,
    Error,
    Pending,
    #[serde(other)]
    Unknown,
}

/// Webhook body: `{event, data: {transaction: {...}}}`
///
/// Only `transaction.updated` events carry a transaction; other event kinds
/// keep their own payload under `data`, which is not modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    pub transaction: Option<EventTransaction>,
}

/// Transaction snapshot carried by an event
#[derive(Debug, Clone, Deserialize)]
pub struct EventTransaction {
    /// Gateway transaction id
    pub id: String,
    pub status: TransactionStatus,
    /// Our payment reference
    pub reference: String,
    pub amount_in_cents: Option<i64>,
}

/// Minimal REST client for the gateway's transaction lookups.
#[derive(Debug, Clone)]
pub struct WompiClient {
    http: reqwest::Client,
    api_url: String,
    private_key: String,
}

impl WompiClient {
    /// Creates a client from the configured credentials.
    #[must_use]
    pub fn new(config: &WompiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            private_key: config.private_key.clone(),
        }
    }

    /// Fetches a transaction by its gateway id, returning the `data` object.
    ///
    /// # Errors
    /// Returns [`Error::Gateway`] if the request fails or the gateway answers with an error status.
    pub async fn get_transaction(&self, transaction_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/transactions/{transaction_id}", self.api_url);
        tracing::debug!(%url, "Querying gateway transaction");

        let mut body: serde_json::Value = self
            .http
            .get(&url)
            .bearer_auth(&self.private_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(match body.get_mut("data") {
            Some(data) => data.take(),
            None => body,
        })
    }
}

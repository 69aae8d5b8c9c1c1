// src/gateway.rs
//
// Client for the hosted payment checkout (Paystack-style REST API).
// Authorization: `Authorization: Bearer <secret key>`.
//
// Amounts cross this boundary in minor currency units; everything internal
// is whole units, so the conversion lives here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug)]
pub enum GatewayError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidResponse(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Http(e) => write!(f, "http error: {e}"),
            GatewayError::Api { status, body } => {
                write!(f, "gateway api error status={status} body={body}")
            }
            GatewayError::InvalidResponse(e) => write!(f, "invalid response: {e}"),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

pub fn to_minor_units(amount: i64) -> i64 {
    amount * 100
}

#[derive(Debug, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct InitializeData {
    #[serde(rename = "authorization_url")]
    pub authorization_url: String,
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyData {
    pub status: String,
    /// Minor currency units as captured by the gateway.
    pub amount: i64,
    pub reference: String,
    pub channel: Option<String>,
    pub paid_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
    pub currency: String,
}

impl PaymentGateway {
    pub fn new(base_url: String, secret_key: String, currency: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            secret_key,
            currency,
        }
    }

    /// POST /transaction/initialize -> checkout URL for the pilgrim.
    pub async fn initialize(&self, req: &InitializeRequest) -> Result<InitializeData, GatewayError> {
        let resp = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<InitializeData> = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("{e}; body={body}")))?;

        if !envelope.status {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body: envelope.message.unwrap_or(body),
            });
        }

        envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("missing data".to_string()))
    }

    /// GET /transaction/verify/{reference} — the authoritative capture state.
    pub async fn verify(&self, reference: &str) -> Result<VerifyData, GatewayError> {
        let resp = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<VerifyData> = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("{e}; body={body}")))?;

        envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("missing data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_unit_conversion() {
        assert_eq!(to_minor_units(1), 100);
        assert_eq!(to_minor_units(500_000), 50_000_000);
    }

    #[test]
    fn verify_envelope_parses() {
        let body = r#"{
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "amount": 50000000,
                "reference": "MNSK-abc",
                "channel": "card",
                "paid_at": "2024-02-05T09:38:27.000Z"
            }
        }"#;

        let envelope: Envelope<VerifyData> = serde_json::from_str(body).unwrap();
        assert!(envelope.status);
        let data = envelope.data.unwrap();
        assert_eq!(data.status, "success");
        assert_eq!(data.amount, 50_000_000);
        assert_eq!(data.reference, "MNSK-abc");
        assert_eq!(data.channel.as_deref(), Some("card"));
    }
}

use booking_core::StoreError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";
const TOKEN_LIFETIME_SECS: u64 = 3600;
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The parts of a Google service-account JSON key this backend needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Parses the credential blob as downloaded from the cloud console.
    pub fn from_json(blob: &str) -> Result<Self, StoreError> {
        serde_json::from_str(blob)
            .map_err(|e| StoreError::Connection(format!("invalid service account key: {e}")))
    }

    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub(crate) fn new(key: &ServiceAccountKey, now: u64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: SCOPES.to_string(),
            aud: key.token_uri.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        }
    }
}

pub(crate) fn sign_assertion(key: &ServiceAccountKey, now: u64) -> Result<String, StoreError> {
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| StoreError::Connection(format!("unusable private key: {e}")))?;
    encode(&Header::new(Algorithm::RS256), &Claims::new(key, now), &signing_key)
        .map_err(StoreError::connection)
}

pub(crate) fn fetch_access_token(http: &Client, key: &ServiceAccountKey) -> Result<String, StoreError> {
    #[derive(Deserialize)]
    struct TokenResponse {
        access_token: String,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let assertion = sign_assertion(key, now)?;

    let response = http
        .post(&key.token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .map_err(StoreError::connection)?;
    let token: TokenResponse = crate::checked(response)
        .map_err(|e| StoreError::Connection(format!("token exchange rejected: {e}")))?
        .json()
        .map_err(StoreError::connection)?;

    debug!(client = %key.client_email, "Obtained access token");
    Ok(token.access_token)
}

//! OAuth token payloads, grants and access token claims.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{KapError, Result};

/// Environment variable carrying service credentials for automation.
pub const CREDENTIALS_TOKEN_ENV: &str = "KAP_CREDENTIALS_TOKEN";

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Successful answer from the token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenResponse {
    /// Epoch millis at which this token goes stale, given when it was issued.
    ///
    /// Falls back to the access token's `exp` claim, then to `issued_at`.
    pub fn expire_time(&self, issued_at: i64) -> i64 {
        if let Some(seconds) = self.expires_in {
            return issued_at.saturating_add(seconds.saturating_mul(1000));
        }

        decode_claims(&self.access_token)
            .ok()
            .and_then(|c| c.exp)
            .map(|exp| exp.saturating_mul(1000))
            .unwrap_or(issued_at)
    }
}

/// A way of obtaining tokens from the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    DeviceCode { device_code: String },
    RefreshToken { refresh_token: String },
    JwtBearer { assertion: String },
}

impl Grant {
    /// Form fields for this grant, excluding the client id.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Grant::DeviceCode { device_code } => vec![
                ("grant_type", DEVICE_CODE_GRANT),
                ("device_code", device_code.as_str()),
            ],
            Grant::RefreshToken { refresh_token } => vec![
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ],
            Grant::JwtBearer { assertion } => vec![
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ],
        }
    }
}

/// Claims read from an access token. The signature is not verified.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,

    #[serde(default)]
    pub exp: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decode the payload segment of a JWT.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| KapError::transport("access token is not a JWT"))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| KapError::transport(format!("access token payload: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| KapError::transport(format!("access token claims: {}", e)))
}

/// Credentials for non-interactive sign-in.
///
/// Supplied as base-64 encoded JSON in [`CREDENTIALS_TOKEN_ENV`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceCredentials {
    /// Signed assertion exchanged through the JWT-bearer grant.
    pub token: String,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,
}

impl ServiceCredentials {
    /// Read credentials from the environment, if set.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(CREDENTIALS_TOKEN_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::decode(&value).map(Some),
            _ => Ok(None),
        }
    }

    /// Decode the base-64 JSON form.
    pub fn decode(value: &str) -> Result<Self> {
        let invalid = |message: String| {
            KapError::Other(anyhow::anyhow!(
                "Invalid {}: {}",
                CREDENTIALS_TOKEN_ENV,
                message
            ))
        };

        let bytes = STANDARD
            .decode(value.trim())
            .map_err(|e| invalid(e.to_string()))?;
        let credentials: Self =
            serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))?;

        if credentials.token.trim().is_empty() {
            return Err(invalid("token is empty".to_string()));
        }

        Ok(credentials)
    }
}

#[cfg(test)]
pub(crate) fn make_jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

//! Unverified JWT claim decoding
//!
//! Claims only personalize the console. The signature is never checked, so
//! nothing here is an authorization decision.

use crate::error::{ClientError, ClientResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chargeops_core::{FieldValue, RecordId, Role};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Claims read from a token payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User id from `id`, `user_id` or `sub`
    pub user_id: RecordId,
    /// Raw `role` claim
    pub role: Option<String>,
    /// Expiry from `exp`, seconds since the epoch
    pub exp: Option<i64>,
}

impl Claims {
    /// Parsed role claim
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }

    /// Expiry as an instant
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Whether the token has expired at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

/// Decode the payload segment of a token
///
/// # Errors
///
/// Returns [`ClientError::InvalidToken`] when the token is not three
/// segments, the payload is not base64url JSON, or no user id is present.
pub fn decode_claims(token: &str) -> ClientResult<Claims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(ClientError::invalid_token("expected three segments")),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ClientError::invalid_token(format!("payload is not base64url: {e}")))?;
    let claims: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::invalid_token(format!("payload is not JSON: {e}")))?;

    let user_id = ["id", "user_id", "sub"]
        .iter()
        .filter_map(|key| claims.get(key))
        .find_map(|v| FieldValue::from(v.clone()).as_id())
        .ok_or_else(|| ClientError::invalid_token("user id not found in token"))?;

    Ok(Claims {
        user_id,
        role: claims.get("role").and_then(Value::as_str).map(str::to_string),
        exp: claims.get("exp").and_then(Value::as_i64),
    })
}

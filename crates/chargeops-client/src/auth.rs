//! Login, registration and session lookup
//!
//! Role gating happens here, on the client. It keeps end users out of the
//! console UI but is not an authorization boundary; the services must
//! enforce roles themselves.

use crate::api_client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::jwt::{Claims, decode_claims};
use chargeops_core::{EntityKind, Record, RecordId, Role};
use chargeops_view::Intent;
use chargeops_view::validate::validate;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret, SecretString};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

/// Who is logged in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// User id from the token
    pub user_id: RecordId,
    /// Role, when known
    pub role: Option<Role>,
    /// Token expiry
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionInfo {
    fn from_claims(claims: &Claims, role: Option<Role>) -> Self {
        Self {
            user_id: claims.user_id.clone(),
            role,
            expires_at: claims.expires_at(),
        }
    }
}

/// New account details
#[derive(Debug, Clone)]
pub struct Registration {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Initial password
    pub password: SecretString,
    /// Vehicle type
    pub car_type: Option<String>,
}

/// Authentication flows against the users service
#[derive(Debug, Clone)]
pub struct Authenticator {
    api: ApiClient,
}

impl Authenticator {
    /// Create an authenticator over a client
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Log in and store the token
    ///
    /// The role comes from the token's `role` claim, then the login
    /// response's `user` object, then `GET /api/users/{id}`. Only admins and
    /// operators are admitted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidToken`] when no usable token comes back,
    /// [`ClientError::AccessDenied`] for other roles, or the request error.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> ClientResult<SessionInfo> {
        let body = json!({ "email": email, "password": password.expose_secret() });
        let response = self
            .api
            .post_anonymous(&self.api.auth_url("login"), &body)
            .await?
            .unwrap_or(Value::Null);

        let token = ["token", "access_token"]
            .iter()
            .find_map(|key| response.get(key).and_then(Value::as_str))
            .filter(|t| !t.is_empty())
            .map(|t| Secret::new(t.to_string()))
            .ok_or_else(|| ClientError::invalid_token("login response carried no token"))?;

        let claims = decode_claims(token.expose_secret())?;
        let role = self.resolve_role(&claims, &response, &token).await?;

        if !role.can_access_console() {
            warn!(user = %claims.user_id, %role, "Rejected login for non-console role");
            return Err(ClientError::access_denied(role.as_str()));
        }

        self.api.credentials().set(token)?;
        info!(user = %claims.user_id, %role, "Logged in");
        Ok(SessionInfo::from_claims(&claims, Some(role)))
    }

    async fn resolve_role(
        &self,
        claims: &Claims,
        response: &Value,
        token: &SecretString,
    ) -> ClientResult<Role> {
        let raw = match claims.role.clone() {
            Some(role) => role,
            None => match response.get("user").and_then(|u| u.get("role")).and_then(Value::as_str) {
                Some(role) => role.to_string(),
                None => {
                    let url = self.api.record_url(EntityKind::User, &claims.user_id);
                    let user = self
                        .api
                        .get_with_token(&url, token)
                        .await?
                        .and_then(Record::from_json)
                        .ok_or_else(|| ClientError::not_found(claims.user_id.clone()))?;
                    let role = user.text("role");
                    if role.is_empty() { "user".to_string() } else { role.to_string() }
                }
            },
        };

        Role::parse(&raw).ok_or_else(|| ClientError::access_denied(raw))
    }

    /// Register a new end-user account
    ///
    /// No role is sent; the service fixes it to `user`. The session is not
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns a validation error before dispatch, or the request error.
    #[instrument(skip_all, fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> ClientResult<Option<Record>> {
        let mut record = Record::new()
            .with("name", registration.name.as_str())
            .with("email", registration.email.as_str())
            .with("password", registration.password.expose_secret().as_str());
        if let Some(car_type) = &registration.car_type {
            record.set("car_type", car_type.as_str());
        }
        validate(EntityKind::User, &record, Intent::Create)?;

        let created = self
            .api
            .post_anonymous(&self.api.auth_url("register"), &record.to_json())
            .await?;
        info!("Registered account");
        Ok(created.and_then(Record::from_json))
    }

    /// Forget the stored token
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state cannot be removed.
    pub fn logout(&self) -> ClientResult<()> {
        self.api.credentials().clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Session described by the stored token, without a network call
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCredential`] when logged out,
    /// [`ClientError::InvalidToken`] for an undecodable token, or
    /// [`ClientError::Unauthorized`] once it has expired.
    pub fn session(&self, now: DateTime<Utc>) -> ClientResult<SessionInfo> {
        let token = self
            .api
            .credentials()
            .bearer()
            .ok_or(ClientError::MissingCredential)?;
        let claims = decode_claims(token.expose_secret())?;
        if claims.is_expired(now) {
            return Err(ClientError::Unauthorized);
        }
        Ok(SessionInfo::from_claims(&claims, claims.role()))
    }
}

//! HTTP client for the users, chargers, feedback and command services

use crate::credentials::CredentialProvider;
use crate::error::{ClientError, ClientResult};
use crate::normalize::normalize;
use chargeops_core::config::ServicesConfig;
use chargeops_core::types::CommandEnvelope;
use chargeops_core::{Config, EntityKind, Record, RecordId};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// REST client shared by every screen
///
/// The bearer header is attached per request from the injected
/// [`CredentialProvider`], and only when a token is present.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    services: ServicesConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config, credentials: Arc<dyn CredentialProvider>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.http.request_timeout())
            .connect_timeout(config.http.connect_timeout())
            .user_agent(config.http.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            services: config.services.clone(),
            credentials,
        })
    }

    /// Credential provider in use
    #[must_use]
    pub const fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    /// Collection URL of an entity kind
    #[must_use]
    pub fn collection_url(&self, kind: EntityKind) -> String {
        format!("{}{}", trim_base(self.services.base_for(kind)), kind.path())
    }

    /// URL of one record
    #[must_use]
    pub fn record_url(&self, kind: EntityKind, id: &RecordId) -> String {
        format!(
            "{}/{}",
            self.collection_url(kind),
            urlencoding::encode(id.as_str())
        )
    }

    /// URL of an auth action on the users service
    #[must_use]
    pub fn auth_url(&self, action: &str) -> String {
        format!("{}/api/auth/{action}", trim_base(&self.services.users))
    }

    /// URL of the charger command endpoint
    #[must_use]
    pub fn command_url(&self) -> String {
        format!("{}/api/charger/command", trim_base(&self.services.command))
    }

    /// Fetch and normalize a collection
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx status. An
    /// unrecognized body is an empty collection, not an error.
    #[instrument(skip_all, fields(kind = %kind))]
    pub async fn list(&self, kind: EntityKind) -> ClientResult<Vec<Record>> {
        let url = self.collection_url(kind);
        let body = self.execute(self.request(Method::GET, &url)).await?;
        let records = body.map_or_else(Vec::new, |body| normalize(body, kind));
        debug!(count = records.len(), "Fetched collection");
        Ok(records)
    }

    /// Fetch one record
    ///
    /// # Errors
    ///
    /// Returns an error on failure, or [`ClientError::NotFound`] when the
    /// body is not an object.
    #[instrument(skip_all, fields(kind = %kind, id = %id))]
    pub async fn get(&self, kind: EntityKind, id: &RecordId) -> ClientResult<Record> {
        let url = self.record_url(kind, id);
        self.execute(self.request(Method::GET, &url))
            .await?
            .and_then(Record::from_json)
            .ok_or_else(|| ClientError::not_found(id.clone()))
    }

    /// Create a record, returning the server's copy when it sent one
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx status.
    #[instrument(skip_all, fields(kind = %kind))]
    pub async fn create(&self, kind: EntityKind, record: &Record) -> ClientResult<Option<Record>> {
        let url = self.collection_url(kind);
        let body = self
            .execute(self.request(Method::POST, &url).json(&record.to_json()))
            .await?;
        info!("Created record");
        Ok(body.and_then(Record::from_json))
    }

    /// Replace a record, returning the server's copy when it sent one
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx status.
    #[instrument(skip_all, fields(kind = %kind, id = %id))]
    pub async fn update(
        &self,
        kind: EntityKind,
        id: &RecordId,
        record: &Record,
    ) -> ClientResult<Option<Record>> {
        let url = self.record_url(kind, id);
        let body = self
            .execute(self.request(Method::PUT, &url).json(&record.to_json()))
            .await?;
        info!("Updated record");
        Ok(body.and_then(Record::from_json))
    }

    /// Delete a record
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx status.
    #[instrument(skip_all, fields(kind = %kind, id = %id))]
    pub async fn delete(&self, kind: EntityKind, id: &RecordId) -> ClientResult<()> {
        let url = self.record_url(kind, id);
        self.execute(self.request(Method::DELETE, &url)).await?;
        info!("Deleted record");
        Ok(())
    }

    /// Send a start or stop command to a charger
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx status.
    #[instrument(skip_all, fields(charger = %envelope.charger_id, command = %envelope.command))]
    pub async fn send_command(&self, envelope: &CommandEnvelope) -> ClientResult<Option<Value>> {
        let url = self.command_url();
        let body = self
            .execute(self.request(Method::POST, &url).json(envelope))
            .await?;
        info!("Command accepted");
        Ok(body)
    }

    /// POST without a bearer header, for login and registration
    ///
    /// A 401 here is a rejected credential, so it keeps the server message
    /// instead of mapping to [`ClientError::Unauthorized`].
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx status.
    pub async fn post_anonymous(&self, url: &str, body: &Value) -> ClientResult<Option<Value>> {
        let response = self.client.post(url).json(body).send().await?;
        read_response(response, false).await
    }

    /// GET with an explicit token, before it is stored
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx status.
    pub async fn get_with_token(
        &self,
        url: &str,
        token: &SecretString,
    ) -> ClientResult<Option<Value>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        read_response(response, true).await
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        match self.credentials.bearer() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> ClientResult<Option<Value>> {
        let response = request.send().await?;
        read_response(response, true).await
    }
}

fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}

async fn read_response(
    response: reqwest::Response,
    authenticated: bool,
) -> ClientResult<Option<Value>> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(status_error(status, &text, authenticated));
    }
    Ok(parse_body(&text))
}

/// Parse a success body; empty or non-JSON text is an absent body
fn parse_body(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "Response body is not JSON");
            None
        }
    }
}

/// Map a non-2xx response to an error carrying the server's message
fn status_error(status: StatusCode, text: &str, authenticated: bool) -> ClientError {
    if authenticated && status == StatusCode::UNAUTHORIZED {
        return ClientError::Unauthorized;
    }

    let body_message = serde_json::from_str::<Value>(text).ok().and_then(|body| {
        ["error", "message"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str).map(str::to_string))
    });

    let message = body_message
        .or_else(|| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    ClientError::status(status.as_u16(), message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentials;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn client() -> ApiClient {
        let mut config = Config::default();
        config.services.chargers = "http://chargers.local:8081/".to_string();
        ApiClient::new(&config, Arc::new(MemoryCredentials::new())).unwrap()
    }

    #[test]
    fn test_urls() {
        let api = client();
        assert_eq!(
            api.collection_url(EntityKind::Charger),
            "http://chargers.local:8081/api/cps"
        );
        assert_eq!(
            api.record_url(EntityKind::User, &RecordId::from("a b")),
            "http://localhost:8080/api/users/a%20b"
        );
        assert_eq!(api.auth_url("login"), "http://localhost:8080/api/auth/login");
        assert_eq!(api.command_url(), "http://localhost:9000/api/charger/command");
    }

    #[rstest]
    #[case(r#"{"error": "Email already registered"}"#, "Email already registered")]
    #[case(r#"{"message": "Charger offline"}"#, "Charger offline")]
    #[case(r#"{"error": "first", "message": "second"}"#, "first")]
    #[case("plain failure", "plain failure")]
    #[case("", "Request failed with status 409")]
    fn test_status_message(#[case] body: &str, #[case] expected: &str) {
        let err = status_error(StatusCode::CONFLICT, body, true);
        assert_eq!(err.user_message(), expected);
    }

    #[test]
    fn test_unauthorized_only_when_authenticated() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "", true),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, r#"{"error":"Invalid credentials"}"#, false),
            ClientError::Status { status: 401, .. }
        ));
    }

    #[rstest]
    #[case("", None)]
    #[case("   ", None)]
    #[case("OK", None)]
    #[case(r#"{"id": 1}"#, Some(serde_json::json!({"id": 1})))]
    fn test_parse_body(#[case] text: &str, #[case] expected: Option<Value>) {
        assert_eq!(parse_body(text), expected);
    }
}

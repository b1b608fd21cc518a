//! Shared fixtures for client integration tests

#![allow(dead_code, clippy::unwrap_used)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chargeops_client::{ApiClient, CredentialProvider, MemoryCredentials};
use chargeops_core::Config;
use serde_json::Value;
use std::sync::Arc;
use wiremock::{Match, MockServer, Request};

/// Token accepted by every authenticated mock
pub const TOKEN: &str = "header.eyJpZCI6MX0.sig";

/// Configuration pointing every service at the mock server
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.services.users = server.uri();
    config.services.chargers = server.uri();
    config.services.feedback = server.uri();
    config.services.command = server.uri();
    config
}

/// Client holding `TOKEN`
pub fn logged_in(server: &MockServer) -> ApiClient {
    client_with(server, Arc::new(MemoryCredentials::with_token(TOKEN)))
}

/// Client without a token
pub fn logged_out(server: &MockServer) -> ApiClient {
    client_with(server, Arc::new(MemoryCredentials::new()))
}

/// Client over a given provider
pub fn client_with(server: &MockServer, credentials: Arc<dyn CredentialProvider>) -> ApiClient {
    ApiClient::new(&config_for(server), credentials).unwrap()
}

/// Unsigned token around a payload
pub fn token_for(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

/// Matches requests that carry no `Authorization` header
pub struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

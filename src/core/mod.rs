#[cfg(feature = "firestore")]
pub mod middleware;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FirebaseErrorResponse {
    pub error: FirebaseErrorDetails,
}

#[derive(Debug, Deserialize)]
pub struct FirebaseErrorDetails {
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
    pub errors: Option<Vec<FirebaseSubError>>,
}

#[derive(Debug, Deserialize)]
pub struct FirebaseSubError {
    pub message: String,
    pub domain: Option<String>,
    pub reason: Option<String>,
}

impl FirebaseErrorResponse {
    pub fn display_message(&self) -> String {
        match &self.error.status {
            Some(status) => format!("{} ({}, code: {})", self.error.message, status, self.error.code),
            None => format!("{} (code: {})", self.error.message, self.error.code),
        }
    }
}

/// Turns a failed response into a readable message.
///
/// Google APIs answer with `{"error": {"code", "message", "status"}}`; anything
/// else (the Realtime Database uses `{"error": "..."}`) falls back to
/// `default_msg` plus the HTTP status.
pub async fn parse_error_response(response: reqwest::Response, default_msg: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<FirebaseErrorResponse>(&body) {
        Ok(error_resp) => error_resp.display_message(),
        Err(_) if body.is_empty() => format!("{}: {}", default_msg, status),
        Err(_) => format!("{}: {}: {}", default_msg, status, body),
    }
}

/// A `reqwest` client with transient-failure retries, before any service specific middleware.
pub(crate) fn client_builder() -> ClientBuilder {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

    ClientBuilder::new(Client::new()).with(RetryTransientMiddleware::new_with_policy(retry_policy))
}

pub(crate) fn build_client() -> ClientWithMiddleware {
    client_builder().build()
}

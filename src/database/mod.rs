//! Firebase Realtime Database module.
//!
//! Nodes are addressed by slash-separated paths under the database root and read or
//! written through the REST API (`{root}/{path}.json`). When a user is signed in, the
//! ID token from the shared [`Session`] is passed as the `auth` query parameter.

mod reference;

#[cfg(test)]
mod tests;

pub use self::reference::DatabaseReference;

use crate::auth::Session;
use crate::config::{ConfigError, FirebaseConfig};
use crate::core::{build_client, parse_error_response};
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    /// The database rules rejected the caller (HTTP 401).
    #[error("You are not authorized to access the database")]
    Unauthorized,
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),
}

/// Client for the Realtime Database.
#[derive(Clone)]
pub struct FirebaseDatabase {
    client: ClientWithMiddleware,
    base_url: Url,
    session: Session,
}

impl FirebaseDatabase {
    /// Creates a new `FirebaseDatabase` sharing `session` with the other clients.
    ///
    /// This is typically called via `FirebaseApp::new()`.
    pub fn new(config: &FirebaseConfig, session: Session) -> Result<Self, ConfigError> {
        let base_url = config.database_url()?;
        Ok(Self::with_client(build_client(), base_url, session))
    }

    pub(crate) fn with_client(client: ClientWithMiddleware, base_url: Url, session: Session) -> Self {
        Self {
            client,
            base_url,
            session,
        }
    }

    /// Gets a reference to the node at `path`; empty segments are ignored.
    pub fn reference(&self, path: &str) -> DatabaseReference<'_> {
        DatabaseReference::new(self, normalize(path))
    }

    /// Gets a reference to the database root.
    pub fn root(&self) -> DatabaseReference<'_> {
        DatabaseReference::new(self, String::new())
    }

    /// The database root URL.
    pub fn url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }

    pub(crate) fn auth_query(&self) -> Vec<(&'static str, String)> {
        self.session
            .id_token()
            .map(|token| vec![("auth", token)])
            .unwrap_or_default()
    }
}

pub(crate) fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) async fn ensure_success(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, DatabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        log::warn!("{}: unauthorized", context);
        return Err(DatabaseError::Unauthorized);
    }

    let message = parse_error_response(response, context).await;
    log::warn!("{}", message);
    Err(DatabaseError::ApiError(message))
}

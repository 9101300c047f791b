//! Cloud Firestore module.
//!
//! This module talks to the Firestore REST API on behalf of the signed-in end user:
//! validated references to collections and documents, document reads and writes,
//! and transactions.
//!
//! Field values use the typed [`value::Value`] and its wire codec; paths are checked
//! by the [`path`] helpers before any request is made.

pub mod models;
pub mod path;
pub mod reference;
pub mod transaction;
pub mod value;


use self::models::{
    BeginTransactionRequest, BeginTransactionResponse, CollectionIds, ListCollectionIdsRequest,
};
use self::reference::{CollectionReference, DocumentReference};
use self::transaction::{Transaction, TransactionOptions};
use crate::auth::Session;
use crate::config::{ConfigError, FirebaseConfig};
use crate::core::middleware::BearerTokenMiddleware;
use crate::core::{client_builder, parse_error_response};
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use url::Url;

/// Errors that can occur during Firestore operations.
#[derive(Error, Debug)]
pub enum FirestoreError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Errors returned by the Firestore API.
    #[error("API error: {0}")]
    ApiError(String),
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// A path does not name a document or collection as required.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    /// A payload cannot represent the requested value kind.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// An array or map operation was applied to another kind of value.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Wire JSON is not a well-formed Firestore value.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Client for interacting with Cloud Firestore.
pub struct Firestore {
    client: ClientWithMiddleware,
    database: String,
    documents_url: Url,
}

impl Firestore {
    /// Creates a new `Firestore` instance.
    ///
    /// This is typically called via `FirebaseApp::new()`.
    pub fn new(config: &FirebaseConfig, session: Session) -> Result<Self, ConfigError> {
        if config.project_id.trim().is_empty() {
            return Err(ConfigError::Missing("projectId"));
        }

        let client = client_builder()
            .with(BearerTokenMiddleware::new(session))
            .build();

        Self::with_client(client, config.firestore_host(), &config.project_id)
    }

    pub(crate) fn with_client(
        client: ClientWithMiddleware,
        host: &str,
        project_id: &str,
    ) -> Result<Self, ConfigError> {
        let database = format!("projects/{}/databases/(default)", project_id);
        let invalid_url = |source: url::ParseError| ConfigError::InvalidUrl {
            field: "firestoreUrl",
            source,
        };

        let documents_url =
            Url::parse(&format!("{}/v1/{}/documents", host, database)).map_err(invalid_url)?;
        if documents_url.cannot_be_a_base() {
            return Err(invalid_url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        Ok(Self {
            client,
            database,
            documents_url,
        })
    }

    /// Gets a `CollectionReference` for a collection path such as `"users"` or
    /// `"users/alice/posts"`.
    pub fn collection(&self, path: &str) -> Result<CollectionReference<'_>, FirestoreError> {
        path::validate_collection_path(path)?;
        Ok(CollectionReference::new(self, path.to_string()))
    }

    /// Gets a `DocumentReference` for a document path such as `"users/alice"`.
    pub fn doc(&self, path: &str) -> Result<DocumentReference<'_>, FirestoreError> {
        path::validate_document_path(path)?;
        Ok(DocumentReference::new(self, path.to_string()))
    }

    /// Lists the ids of the root collections, one page at a time.
    pub async fn list_collection_ids(
        &self,
        page_size: Option<i32>,
        page_token: Option<&str>,
    ) -> Result<CollectionIds, FirestoreError> {
        let url = self.method_url("", "listCollectionIds")?;
        self.post_list_collection_ids(url, page_size, page_token)
            .await
    }

    /// Begins a new transaction.
    ///
    /// Without options Firestore starts a read-write transaction.
    pub async fn begin_transaction(
        &self,
        options: Option<TransactionOptions>,
    ) -> Result<Transaction<'_>, FirestoreError> {
        let url = self.method_url("", "beginTransaction")?;
        let request = BeginTransactionRequest { options };

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        let response = ensure_success(response, "Begin transaction failed").await?;
        let result: BeginTransactionResponse = response.json().await?;
        log::debug!("began transaction {}", result.transaction);

        Ok(Transaction::new(self, result.transaction))
    }

    /// The database resource name, `projects/{project_id}/databases/(default)`.
    pub fn database(&self) -> &str {
        &self.database
    }

    pub(crate) fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }

    /// `{documents}/{path}`, one percent-encoded URL segment per path segment.
    pub(crate) fn document_url(&self, path: &str) -> Result<Url, FirestoreError> {
        self.request_url(path, None)
    }

    /// `{documents}/{path}:{method}`; an empty path addresses the database root.
    pub(crate) fn method_url(&self, path: &str, method: &str) -> Result<Url, FirestoreError> {
        self.request_url(path, Some(method))
    }

    fn request_url(&self, path: &str, method: Option<&str>) -> Result<Url, FirestoreError> {
        let mut url = self.documents_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                FirestoreError::InvalidPath(format!(
                    "cannot address {:?} under {}",
                    path, self.documents_url
                ))
            })?;

            let mut parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            match method {
                Some(method) => {
                    let last = match parts.pop() {
                        Some(last) => last,
                        None => {
                            segments.pop();
                            "documents"
                        }
                    };
                    segments.extend(parts);
                    segments.push(&format!("{}:{}", last, method));
                }
                None => {
                    segments.extend(parts);
                }
            }
        }
        Ok(url)
    }

    /// Full resource name of a document, as used in write requests and reference values.
    pub fn resource_name(&self, path: &str) -> String {
        format!("{}/documents/{}", self.database, path)
    }

    pub(crate) async fn post_list_collection_ids(
        &self,
        url: Url,
        page_size: Option<i32>,
        page_token: Option<&str>,
    ) -> Result<CollectionIds, FirestoreError> {
        let request = ListCollectionIdsRequest {
            page_size,
            page_token: page_token.map(str::to_string),
        };

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        let response = ensure_success(response, "List collections failed").await?;
        Ok(response.json().await?)
    }
}

pub(crate) async fn ensure_success(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, FirestoreError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let message = parse_error_response(response, context).await;
    log::warn!("{}", message);
    Err(FirestoreError::ApiError(message))
}

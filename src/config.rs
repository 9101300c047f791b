//! Client configuration.
//!
//! A [`FirebaseConfig`] carries the two values every Firebase web app is given in
//! the console (the project id and the Web API key) plus optional endpoint
//! overrides. The overrides exist for emulators and tests; production code
//! normally only sets `project_id`, `api_key` and, for non-default database
//! instances, `database_url`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

pub(crate) const IDENTITY_TOOLKIT_HOST: &str = "https://identitytoolkit.googleapis.com";
pub(crate) const SECURE_TOKEN_HOST: &str = "https://securetoken.googleapis.com";
pub(crate) const FIRESTORE_HOST: &str = "https://firestore.googleapis.com";

/// Errors raised while building clients from a [`FirebaseConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required value is missing or empty.
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
    /// A URL in the configuration could not be parsed.
    #[error("Invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    /// Wrapper for `std::io::Error` when reading a config file.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for `serde_json::Error` when parsing a config file.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings shared by the Auth, Realtime Database and Firestore clients.
///
/// Deserializes from the web config object shown in the Firebase console
/// (`projectId`, `apiKey`, `databaseURL`); unknown keys are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_key: String,
    #[serde(default, rename = "databaseURL", alias = "databaseUrl")]
    pub database_url: Option<String>,
    #[serde(default)]
    pub identity_toolkit_url: Option<String>,
    #[serde(default)]
    pub secure_token_url: Option<String>,
    #[serde(default)]
    pub firestore_url: Option<String>,
}

impl FirebaseConfig {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            database_url: None,
            identity_toolkit_url: None,
            secure_token_url: None,
            firestore_url: None,
        }
    }

    /// Reads a web config JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Reads `FIREBASE_PROJECT_ID`, `FIREBASE_API_KEY` and the optional
    /// `FIREBASE_DATABASE_URL` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let project_id =
            std::env::var("FIREBASE_PROJECT_ID").map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?;
        let api_key =
            std::env::var("FIREBASE_API_KEY").map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?;

        let mut config = Self::new(project_id, api_key);
        config.database_url = std::env::var("FIREBASE_DATABASE_URL").ok();
        Ok(config)
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn with_identity_toolkit_url(mut self, url: impl Into<String>) -> Self {
        self.identity_toolkit_url = Some(url.into());
        self
    }

    pub fn with_secure_token_url(mut self, url: impl Into<String>) -> Self {
        self.secure_token_url = Some(url.into());
        self
    }

    pub fn with_firestore_url(mut self, url: impl Into<String>) -> Self {
        self.firestore_url = Some(url.into());
        self
    }

    /// Checks that the project id and API key are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Missing("projectId"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("apiKey"));
        }
        Ok(())
    }

    /// The Realtime Database root, `https://{project_id}.firebaseio.com/` unless overridden.
    ///
    /// The returned URL always ends with `/` so that child paths can be joined onto it.
    pub fn database_url(&self) -> Result<Url, ConfigError> {
        let mut raw = match &self.database_url {
            Some(url) => url.clone(),
            None => {
                if self.project_id.trim().is_empty() {
                    return Err(ConfigError::Missing("projectId"));
                }
                format!("https://{}.firebaseio.com/", self.project_id)
            }
        };
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
            field: "databaseURL",
            source,
        })
    }

    pub(crate) fn identity_toolkit_host(&self) -> &str {
        trim_host(self.identity_toolkit_url.as_deref().unwrap_or(IDENTITY_TOOLKIT_HOST))
    }

    pub(crate) fn secure_token_host(&self) -> &str {
        trim_host(self.secure_token_url.as_deref().unwrap_or(SECURE_TOKEN_HOST))
    }

    pub(crate) fn firestore_host(&self) -> &str {
        trim_host(self.firestore_url.as_deref().unwrap_or(FIRESTORE_HOST))
    }
}

fn trim_host(host: &str) -> &str {
    host.trim_end_matches('/')
}

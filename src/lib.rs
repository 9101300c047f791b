//! Client for Firebase's end-user REST APIs: Authentication, the Realtime Database
//! and Cloud Firestore.
//!
//! A [`FirebaseApp`] is built from a [`FirebaseConfig`] (project id and Web API key).
//! Its three clients share one [`Session`](auth::Session), so after
//! [`FirebaseAuth::sign_in_with_password`](auth::FirebaseAuth::sign_in_with_password)
//! database and Firestore requests are made as the signed-in user.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use firebase_rest::{FirebaseApp, FirebaseConfig};
//! use firebase_rest::firestore::models::Document;
//!
//! let app = FirebaseApp::new(FirebaseConfig::new("my-project", "my-api-key"))?;
//! app.auth().sign_in_with_password("alice@example.com", "secret").await?;
//!
//! let doc = Document::builder().field("score", 42).build();
//! app.firestore().doc("scores/alice")?.set(&doc).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod core;
#[cfg(feature = "database")]
pub mod database;
#[cfg(feature = "firestore")]
pub mod firestore;

pub use config::{ConfigError, FirebaseConfig};

use auth::{FirebaseAuth, Session};
#[cfg(feature = "database")]
use database::FirebaseDatabase;
#[cfg(feature = "firestore")]
use firestore::Firestore;
use once_cell::sync::OnceCell;

static APP: OnceCell<FirebaseApp> = OnceCell::new();

pub struct FirebaseApp {
    config: FirebaseConfig,
    auth: FirebaseAuth,
    #[cfg(feature = "database")]
    database: FirebaseDatabase,
    #[cfg(feature = "firestore")]
    firestore: Firestore,
}

impl FirebaseApp {
    /// Validates `config` and creates the service clients.
    pub fn new(config: FirebaseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let session = Session::new();

        Ok(Self {
            auth: FirebaseAuth::new(&config, session.clone())?,
            #[cfg(feature = "database")]
            database: FirebaseDatabase::new(&config, session.clone())?,
            #[cfg(feature = "firestore")]
            firestore: Firestore::new(&config, session)?,
            config,
        })
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    pub fn auth(&self) -> &FirebaseAuth {
        &self.auth
    }

    #[cfg(feature = "database")]
    pub fn database(&self) -> &FirebaseDatabase {
        &self.database
    }

    #[cfg(feature = "firestore")]
    pub fn firestore(&self) -> &Firestore {
        &self.firestore
    }
}

/// Initializes the process-wide app on the first call and returns it.
///
/// Later calls return the existing app and ignore their `config`.
pub fn initialize_app(config: FirebaseConfig) -> Result<&'static FirebaseApp, ConfigError> {
    APP.get_or_try_init(|| {
        log::debug!("initializing Firebase app for project {}", config.project_id);
        FirebaseApp::new(config)
    })
}

/// The process-wide app, if [`initialize_app`] has succeeded.
pub fn app() -> Option<&'static FirebaseApp> {
    APP.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_incomplete_config() {
        assert!(matches!(
            FirebaseApp::new(FirebaseConfig::new("", "key")),
            Err(ConfigError::Missing("projectId"))
        ));
        assert!(matches!(
            FirebaseApp::new(FirebaseConfig::new("project", " ")),
            Err(ConfigError::Missing("apiKey"))
        ));
    }

    #[test]
    fn test_clients_share_session() {
        let app = FirebaseApp::new(FirebaseConfig::new("project", "key")).unwrap();
        app.auth().session().set(auth::FirebaseUser {
            local_id: "uid-1".to_string(),
            id_token: "token".to_string(),
            ..Default::default()
        });
        assert!(app.auth().is_signed_in());
        #[cfg(feature = "database")]
        assert_eq!(
            app.database().auth_query(),
            vec![("auth", "token".to_string())]
        );
        #[cfg(feature = "firestore")]
        assert_eq!(
            app.firestore().database(),
            "projects/project/databases/(default)"
        );
        app.auth().sign_out();
        assert!(!app.auth().is_signed_in());
    }

    #[test]
    fn test_initialize_app_keeps_first_config() {
        let first = initialize_app(FirebaseConfig::new("first", "key")).unwrap();
        let second = initialize_app(FirebaseConfig::new("second", "key")).unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(second.config().project_id, "first");
        assert!(app().is_some());
    }
}

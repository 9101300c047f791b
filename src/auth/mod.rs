//! Email and password authentication against the Identity Toolkit and Secure Token APIs.
//!
//! Every call is keyed by the project's Web API key. A successful sign-in stores the
//! returned [`FirebaseUser`] in the shared [`Session`], whose ID token the Realtime
//! Database and Firestore clients then attach to their requests.

pub mod models;
mod session;


pub use self::models::FirebaseUser;
pub use self::session::Session;

use self::models::{
    PasswordAuthRequest, RefreshTokenRequest, RefreshTokenResponse, SendOobCodeRequest,
    UpdateProfileRequest, UpdateProfileResponse,
};
use crate::config::{ConfigError, FirebaseConfig};
use crate::core::{build_client, parse_error_response};
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct FirebaseAuth {
    client: ClientWithMiddleware,
    api_key: String,
    identity_url: String,
    token_url: String,
    session: Session,
}

impl FirebaseAuth {
    /// Creates a new `FirebaseAuth` sharing `session` with the other clients.
    ///
    /// This is typically called via `FirebaseApp::new()`. Fails if the API key is empty.
    pub fn new(config: &FirebaseConfig, session: Session) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("apiKey"));
        }

        Ok(Self::with_client(build_client(), config, session))
    }

    pub(crate) fn with_client(
        client: ClientWithMiddleware,
        config: &FirebaseConfig,
        session: Session,
    ) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            identity_url: format!("{}/v1/accounts", config.identity_toolkit_host()),
            token_url: format!("{}/v1/token", config.secure_token_host()),
            session,
        }
    }

    /// Signs a user in and makes it the current user.
    ///
    /// On failure the session is cleared, so a previous user does not linger.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<FirebaseUser, AuthError> {
        let url = format!("{}:signInWithPassword", self.identity_url);
        let request = PasswordAuthRequest {
            email,
            password,
            return_secure_token: true,
        };

        match self.post::<_, FirebaseUser>(&url, &request, "Sign in failed").await {
            Ok(user) => {
                log::debug!("signed in user {}", user.local_id);
                self.session.set(user.clone());
                Ok(user)
            }
            Err(e) => {
                self.session.clear();
                Err(e)
            }
        }
    }

    /// Creates a new email/password account. The current user is left unchanged.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<FirebaseUser, AuthError> {
        let url = format!("{}:signUp", self.identity_url);
        let request = PasswordAuthRequest {
            email,
            password,
            return_secure_token: true,
        };

        self.post(&url, &request, "Sign up failed").await
    }

    pub async fn send_password_reset_email(&self, email: &str) -> Result<(), AuthError> {
        let url = format!("{}:sendOobCode", self.identity_url);
        let request = SendOobCodeRequest {
            request_type: "PASSWORD_RESET",
            email,
        };

        let _: IgnoredAny = self
            .post(&url, &request, "Send password reset email failed")
            .await?;
        Ok(())
    }

    /// Exchanges a refresh token for a fresh ID token and makes that user current.
    pub async fn sign_in_with_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<FirebaseUser, AuthError> {
        let request = RefreshTokenRequest {
            grant_type: "refresh_token",
            refresh_token,
        };

        let response = match self
            .post::<_, RefreshTokenResponse>(&self.token_url, &request, "Token refresh failed")
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.session.clear();
                return Err(e);
            }
        };

        let mut user = self
            .session
            .current_user()
            .filter(|user| user.local_id == response.user_id)
            .unwrap_or_default();
        user.local_id = response.user_id;
        user.id_token = response.id_token;
        user.refresh_token = response.refresh_token;
        user.expires_in = response.expires_in;

        self.session.set(user.clone());
        Ok(user)
    }

    /// Sets the display name of the current user.
    pub async fn update_profile(&self, display_name: &str) -> Result<FirebaseUser, AuthError> {
        let id_token = self.session.id_token().ok_or(AuthError::NotSignedIn)?;

        let url = format!("{}:update", self.identity_url);
        let request = UpdateProfileRequest {
            id_token: &id_token,
            display_name,
            return_secure_token: true,
        };

        let response: UpdateProfileResponse =
            self.post(&url, &request, "Update profile failed").await?;

        self.session
            .update(|user| {
                user.display_name = response.display_name;
                if response.email.is_some() {
                    user.email = response.email;
                }
                if let Some(token) = response.id_token {
                    user.id_token = token;
                }
                if let Some(token) = response.refresh_token {
                    user.refresh_token = token;
                }
                if response.expires_in.is_some() {
                    user.expires_in = response.expires_in;
                }
            })
            .ok_or(AuthError::NotSignedIn)
    }

    pub fn current_user(&self) -> Option<FirebaseUser> {
        self.session.current_user()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_signed_in()
    }

    pub fn sign_out(&self) {
        self.session.clear();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        context: &str,
    ) -> Result<R, AuthError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = parse_error_response(response, context).await;
            log::warn!("{}", message);
            return Err(AuthError::ApiError(message));
        }

        Ok(response.json().await?)
    }
}

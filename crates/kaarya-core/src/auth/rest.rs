use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{AuthProvider, SignUp};
use crate::backend::{BackendClient, ServiceError};
use crate::error::AuthError;
use crate::session::{Identity, Session};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        Session {
            user: self.user,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(Identity),
}

/// Auth client for the hosted service's `auth/v1` endpoints.
#[derive(Debug, Clone)]
pub struct RestAuth {
    client: BackendClient,
}

impl RestAuth {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        method: Method,
        url: reqwest::Url,
        bearer: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<Response, AuthError> {
        let mut request = self.client.request(method, url, bearer);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AuthError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let parsed = ServiceError::parse(status, &text);
        if parsed.is_email_not_confirmed() {
            return Err(AuthError::EmailNotConfirmed);
        }
        warn!(status = parsed.status, code = ?parsed.code, "auth service rejected request");
        Err(AuthError::Rejected {
            status: parsed.status,
            message: parsed.message,
        })
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, AuthError> {
        self.client
            .endpoint(path)
            .map_err(|err| AuthError::Transport(err.to_string()))
    }

    async fn token(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, AuthError> {
        let mut url = self.url("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let token: TokenResponse = self
            .send(Method::POST, url, None, Some(body))
            .await?
            .json()
            .await
            .map_err(|err| AuthError::Decode(err.to_string()))?;
        Ok(token.into_session(Utc::now()))
    }
}

#[async_trait]
impl AuthProvider for RestAuth {
    #[tracing::instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .token("password", json!({ "email": email, "password": password }))
            .await?;
        debug!(user = %session.user_id(), "password grant accepted");
        Ok(session)
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        let url = self.url("auth/v1/signup")?;
        let response: SignUpResponse = self
            .send(
                Method::POST,
                url,
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await?
            .json()
            .await
            .map_err(|err| AuthError::Decode(err.to_string()))?;

        Ok(match response {
            SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now());
                SignUp {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            SignUpResponse::User(user) => SignUp {
                user,
                session: None,
            },
        })
    }

    #[tracing::instrument(skip(self))]
    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let mut url = self.url("auth/v1/recover")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        self.send(Method::POST, url, None, Some(json!({ "email": email })))
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(user = %session.user_id()))]
    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let url = self.url("auth/v1/logout")?;
        self.send(Method::POST, url, Some(&session.access_token), None)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(user = %session.user_id()))]
    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let refresh_token = session.refresh_token.as_deref().ok_or_else(|| {
            AuthError::Rejected {
                status: 400,
                message: "session has no refresh token".to_string(),
            }
        })?;
        self.token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::{SignUpResponse, TokenResponse};

    #[test]
    fn token_response_prefers_absolute_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": now.timestamp() + 60,
            "refresh_token": "r",
            "user": { "id": "0b0f3a43-8a8e-4b8b-9f6c-0e5b1a2d3c4e", "email": "a@example.com", "aud": "authenticated" }
        }))
        .unwrap();

        let session = token.into_session(now);
        assert_eq!(session.email(), "a@example.com");
        assert_eq!(session.expires_at.unwrap().timestamp(), now.timestamp() + 60);
    }

    #[test]
    fn signup_without_confirmation_returns_bare_user() {
        let pending: SignUpResponse = serde_json::from_value(json!({
            "id": "0b0f3a43-8a8e-4b8b-9f6c-0e5b1a2d3c4e",
            "email": "a@example.com",
            "confirmation_sent_at": "2026-02-16T05:00:00Z"
        }))
        .unwrap();
        assert!(matches!(pending, SignUpResponse::User(_)));

        let confirmed: SignUpResponse = serde_json::from_value(json!({
            "access_token": "a",
            "expires_in": 3600,
            "user": { "id": "0b0f3a43-8a8e-4b8b-9f6c-0e5b1a2d3c4e", "email": "a@example.com" }
        }))
        .unwrap();
        assert!(matches!(confirmed, SignUpResponse::Session(_)));
    }
}

//! HTTP plumbing shared by the hosted auth and row-store clients.

use std::time::Duration;

use anyhow::{Context, anyhow};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub url: String,
    pub anon_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> anyhow::Result<Self> {
        let trimmed = settings.url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            anyhow::bail!("backend URL is empty");
        }
        let base = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("invalid backend URL: {trimmed}"))?;
        if settings.anon_key.trim().is_empty() {
            anyhow::bail!("backend API key is empty");
        }

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed building HTTP client for backend")?;

        debug!(base = %base, timeout_s = settings.timeout.as_secs(), "backend client ready");
        Ok(Self {
            http,
            base,
            anon_key: settings.anon_key.trim().to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| anyhow!("invalid endpoint path {path}: {err}"))
    }

    /// Builds a request carrying the API key, authorised as `bearer` or, when
    /// absent, as the anonymous role.
    pub fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Code and human message pulled out of an error response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl ServiceError {
    pub fn parse(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        let code = parsed.error_code.or(match parsed.code {
            Some(serde_json::Value::String(code)) => Some(code),
            _ => None,
        });

        let message = parsed
            .message
            .or(parsed.msg)
            .or(parsed.error_description)
            .or(parsed.error)
            .unwrap_or_else(|| {
                let raw = body.trim();
                if raw.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    raw.to_string()
                }
            });

        Self {
            status: status.as_u16(),
            code,
            message,
        }
    }

    pub fn is_email_not_confirmed(&self) -> bool {
        self.code.as_deref() == Some("email_not_confirmed")
            || self
                .message
                .to_ascii_lowercase()
                .contains("email not confirmed")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;

    use super::{BackendClient, BackendSettings, ServiceError};

    #[test]
    fn recognises_unconfirmed_email_by_code_or_message() {
        let by_code = ServiceError::parse(
            StatusCode::BAD_REQUEST,
            r#"{"code":400,"error_code":"email_not_confirmed","msg":"Email not confirmed"}"#,
        );
        assert!(by_code.is_email_not_confirmed());
        assert_eq!(by_code.message, "Email not confirmed");

        let by_message = ServiceError::parse(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#,
        );
        assert!(by_message.is_email_not_confirmed());
    }

    #[test]
    fn bad_credentials_are_not_unconfirmed_email() {
        let err = ServiceError::parse(
            StatusCode::BAD_REQUEST,
            r#"{"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        assert!(!err.is_email_not_confirmed());
        assert_eq!(err.status, 400);
        assert_eq!(err.code.as_deref(), Some("invalid_credentials"));
    }

    #[test]
    fn postgrest_errors_and_plain_bodies() {
        let rest = ServiceError::parse(
            StatusCode::CONFLICT,
            r#"{"code":"23505","message":"duplicate key value","details":null,"hint":null}"#,
        );
        assert_eq!(rest.code.as_deref(), Some("23505"));
        assert_eq!(rest.message, "duplicate key value");

        let plain = ServiceError::parse(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(plain.message, "upstream down");

        let empty = ServiceError::parse(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(empty.message, "Service Unavailable");
    }

    #[test]
    fn endpoints_join_under_the_base_url() {
        let client = BackendClient::new(&BackendSettings {
            url: "https://example.supabase.co/".to_string(),
            anon_key: "anon".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let url = client.endpoint("/rest/v1/tasks").unwrap();
        assert_eq!(url.as_str(), "https://example.supabase.co/rest/v1/tasks");
    }

    #[test]
    fn rejects_missing_settings() {
        let missing_key = BackendClient::new(&BackendSettings {
            url: "https://example.supabase.co".to_string(),
            anon_key: " ".to_string(),
            timeout: Duration::from_secs(5),
        });
        assert!(missing_key.is_err());
    }
}

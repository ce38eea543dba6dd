use crate::application::dto::{
    AgentPing, PingResponse, SoftwareValidationRequest, ValidationResponse, SCHEMA_VERSION,
};
use crate::ports::outbound::PolicyBackend;
use crate::shared::error::PolicyError;
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest response body echoed into an error message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// HttpPolicyBackend adapter for the policy REST API
///
/// Implements the PolicyBackend port over JSON/HTTP:
/// - `POST {base}/validate_software`
/// - `GET {base}/health`
/// - `POST {base}/agents/ping`
///
/// Every call is bounded by the client timeout and no call is retried; the
/// verification gate turns any failure into a deny.
pub struct HttpPolicyBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPolicyBackend {
    /// Creates a client for `base_url`
    ///
    /// # Errors
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("X-Schema-Version", HeaderValue::from_static(SCHEMA_VERSION));
        if !api_key.is_empty() {
            let mut key = HeaderValue::from_str(api_key).context("API key contains characters not allowed in an HTTP header")?;
            key.set_sensitive(true);
            headers.insert("X-API-KEY", key);
        }

        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("install-guard/{}", version);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn transport_error(&self, error: reqwest::Error) -> PolicyError {
        if error.is_timeout() {
            PolicyError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            PolicyError::Transport {
                details: error.to_string(),
            }
        }
    }

    /// Sends the request and returns the body of a successful response
    async fn execute(&self, request: reqwest::RequestBuilder) -> std::result::Result<String, PolicyError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(PolicyError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        Ok(body)
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> std::result::Result<T, PolicyError> {
    serde_json::from_str(body).map_err(|e| PolicyError::MalformedResponse {
        details: e.to_string(),
    })
}

#[async_trait]
impl PolicyBackend for HttpPolicyBackend {
    async fn validate_software(
        &self,
        request: &SoftwareValidationRequest,
    ) -> std::result::Result<ValidationResponse, PolicyError> {
        let body = self
            .execute(self.client.post(self.url("validate_software")).json(request))
            .await?;
        parse_body(&body)
    }

    async fn health_check(&self) -> std::result::Result<(), PolicyError> {
        self.execute(self.client.get(self.url("health"))).await.map(|_| ())
    }

    async fn send_ping(&self, ping: &AgentPing) -> std::result::Result<PingResponse, PolicyError> {
        let body = self
            .execute(self.client.post(self.url("agents/ping")).json(ping))
            .await?;
        if body.trim().is_empty() {
            return Ok(PingResponse::default());
        }
        parse_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = HttpPolicyBackend::new("http://localhost:8080/api/", "key", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("validate_software"), "http://localhost:8080/api/validate_software");
        assert_eq!(client.url("/health"), "http://localhost:8080/api/health");
    }

    #[test]
    fn test_invalid_api_key_is_rejected() {
        assert!(HttpPolicyBackend::new("http://localhost", "bad\nkey", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_parse_body_reports_malformed_json() {
        let err = parse_body::<ValidationResponse>("{not json").unwrap_err();
        assert!(matches!(err, PolicyError::MalformedResponse { .. }));

        let err = parse_body::<ValidationResponse>(r#"{"softwareId":"x"}"#).unwrap_err();
        assert!(matches!(err, PolicyError::MalformedResponse { .. }));
    }
}

//! Browser sign-in flow
//!
//! Sign-in is a two step handshake: the user opens [`Authenticator::login_url`]
//! in a browser, and the client polls the callback endpoint with the same
//! session token until the service hands back an API token.

use crate::client::HttpClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Query parameters attached to every outbound link
pub(crate) const UTM_PARAMS: [(&str, &str); 3] = [
    ("utm_medium", "referral"),
    ("utm_source", "heft"),
    ("utm_campaign", "editor"),
];

/// Performs the browser sign-in handshake.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Page the user must visit to approve `session_token`.
    fn login_url(&self, session_token: &str) -> Result<Url>;

    /// Wait until `session_token` is approved and return the API token.
    async fn wait_for_token(&self, session_token: &str) -> Result<String>;
}

/// Fresh random session token for one sign-in attempt
pub fn new_session_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Serialize)]
struct CallbackRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct CallbackResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    api: Option<String>,
}

/// HTTP implementation of [`Authenticator`]
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: HttpClient,
    api_url: String,
    app_url: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl AuthClient {
    pub fn new(
        client: HttpClient,
        api_url: impl Into<String>,
        app_url: impl Into<String>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            app_url: app_url.into(),
            poll_interval,
            timeout,
        }
    }

    fn callback_url(&self) -> String {
        format!("{}/verify/callback", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Authenticator for AuthClient {
    fn login_url(&self, session_token: &str) -> Result<Url> {
        let mut url = Url::parse(&self.app_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::other(format!("Cannot use {} as a base URL", self.app_url)))?
            .pop_if_empty()
            .push("login");
        url.query_pairs_mut()
            .append_pair("token", session_token)
            .extend_pairs(UTM_PARAMS);
        Ok(url)
    }

    async fn wait_for_token(&self, session_token: &str) -> Result<String> {
        let started = Instant::now();
        let callback_url = self.callback_url();
        let request = CallbackRequest {
            token: session_token,
        };

        loop {
            if started.elapsed() >= self.timeout {
                return Err(Error::AuthTimeout(self.timeout.as_secs()));
            }

            match self
                .client
                .post_json::<_, CallbackResponse>(&callback_url, &request)
                .await
            {
                Ok(CallbackResponse {
                    ok: true,
                    api: Some(api),
                }) if !api.is_empty() => {
                    tracing::debug!("sign-in approved");
                    return Ok(api);
                }
                Ok(_) => tracing::trace!("sign-in not approved yet"),
                Err(e) => tracing::debug!(error = %e, "sign-in poll failed"),
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(timeout: Duration) -> AuthClient {
        AuthClient::new(
            HttpClient::new().unwrap(),
            "http://127.0.0.1:9/api",
            "https://app.snyk.io",
            Duration::from_millis(10),
            timeout,
        )
    }

    #[test]
    fn test_login_url() {
        let url = auth(Duration::from_secs(1)).login_url("abc-123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://app.snyk.io/login?token=abc-123&utm_medium=referral&utm_source=heft&utm_campaign=editor"
        );
    }

    #[test]
    fn test_session_tokens_are_unique() {
        let a = new_session_token();
        let b = new_session_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_callback_response_shapes() {
        let approved: CallbackResponse = serde_json::from_str(r#"{"ok":true,"api":"tok"}"#).unwrap();
        assert!(approved.ok);
        assert_eq!(approved.api.as_deref(), Some("tok"));

        let pending: CallbackResponse = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        assert!(!pending.ok);
        assert!(pending.api.is_none());
    }

    #[tokio::test]
    async fn test_zero_timeout_gives_up_immediately() {
        let result = auth(Duration::ZERO).wait_for_token("abc").await;
        assert!(matches!(result, Err(Error::AuthTimeout(0))));
    }
}

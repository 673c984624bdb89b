use serde::Deserialize;
use tracing::warn;

use crate::config::RecaptchaConfig;

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

/// Outbound human-verification check. With no secret configured the service
/// is disabled and every call passes. A configured bypass token lets trusted
/// internal callers skip the remote call. All remote failures resolve to the
/// fail-open flag.
pub struct RecaptchaService {
    config: RecaptchaConfig,
    http: reqwest::Client,
}

impl RecaptchaService {
    #[must_use]
    pub fn new(config: RecaptchaConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config
            .secret_key
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }

    pub async fn verify(&self, token: Option<&str>, action: &str) -> bool {
        let Some(secret) = self
            .config
            .secret_key
            .as_deref()
            .filter(|s| !s.is_empty())
        else {
            return true;
        };

        if let (Some(token), Some(bypass)) = (token, self.config.bypass_token.as_deref())
            && !bypass.is_empty()
            && token == bypass
        {
            return true;
        }

        let Some(token) = token else {
            return self.config.fail_open;
        };

        let response = match self
            .http
            .post(&self.config.verify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Human verification request failed: {e}");
                return self.config.fail_open;
            }
        };

        if !response.status().is_success() {
            return self.config.fail_open;
        }

        let data: VerifyResponse = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                warn!("Human verification response unreadable: {e}");
                return self.config.fail_open;
            }
        };

        if !data.success {
            return self.config.fail_open;
        }

        if let Some(reported) = data.action.as_deref()
            && !reported.is_empty()
            && !action.is_empty()
            && reported != action
        {
            return self.config.fail_open;
        }

        if let Some(score) = data.score
            && score < self.config.score_threshold
        {
            return self.config.fail_open;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(config: RecaptchaConfig) -> RecaptchaService {
        RecaptchaService::new(config, reqwest::Client::new())
    }

    #[tokio::test]
    async fn disabled_without_secret_always_passes() {
        let svc = service(RecaptchaConfig::default());
        assert!(!svc.enabled());
        assert!(svc.verify(None, "login").await);
        assert!(svc.verify(Some("anything"), "login").await);
    }

    #[tokio::test]
    async fn bypass_token_short_circuits() {
        let svc = service(RecaptchaConfig {
            secret_key: Some("secret".to_string()),
            bypass_token: Some("trusted".to_string()),
            ..RecaptchaConfig::default()
        });
        assert!(svc.enabled());
        assert!(svc.verify(Some("trusted"), "login").await);
    }

    #[tokio::test]
    async fn missing_token_follows_fail_open() {
        let closed = service(RecaptchaConfig {
            secret_key: Some("secret".to_string()),
            fail_open: false,
            ..RecaptchaConfig::default()
        });
        assert!(!closed.verify(None, "login").await);

        let open = service(RecaptchaConfig {
            secret_key: Some("secret".to_string()),
            fail_open: true,
            ..RecaptchaConfig::default()
        });
        assert!(open.verify(None, "login").await);
    }
}

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::json;
use sha2::Sha256;

use super::AnomalySink;
use crate::config::WebhookConfig;
use crate::error::NotificationError;
use crate::types::AnomalyEvent;

type HmacSha256 = Hmac<Sha256>;

pub struct WebhookSink {
    http_client: Client,
    url: reqwest::Url,
    secret: Option<String>,
}

impl WebhookSink {
    /// # Errors
    ///
    /// Returns `NotificationError::InvalidConfig` if the URL does not parse.
    pub fn new(config: &WebhookConfig) -> Result<Self, NotificationError> {
        let url = config
            .url
            .parse()
            .map_err(|e| NotificationError::InvalidConfig(format!("Invalid webhook url: {}", e)))?;
        Ok(Self {
            http_client: Client::new(),
            url,
            secret: config.secret.clone(),
        })
    }

    fn sign_payload(&self, payload: &str, secret: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        let result = mac.finalize();
        hex::encode(result.into_bytes())
    }
}

#[async_trait]
impl AnomalySink for WebhookSink {
    async fn deliver(&self, event: &AnomalyEvent) -> Result<(), NotificationError> {
        let payload = json!({
            "type": "refresh_origin_mismatch",
            "event": event,
        });

        let payload_str = serde_json::to_string(&payload)
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        let mut request = self
            .http_client
            .post(self.url.clone())
            .header("Content-Type", "application/json");

        if let Some(secret) = &self.secret {
            let signature = self.sign_payload(&payload_str, secret);
            request = request.header("X-Signature-256", format!("sha256={}", signature));
        }

        let response = request
            .body(payload_str)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            Err(NotificationError::SendFailed(format!(
                "Webhook returned {}: {}",
                status, error
            )))
        }
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(secret: Option<&str>) -> WebhookSink {
        WebhookSink::new(&WebhookConfig {
            url: "https://alerts.example.com/hook".to_string(),
            secret: secret.map(String::from),
        })
        .unwrap()
    }

    #[test]
    fn test_webhook_signature() {
        let sink = sink(Some("secret123"));
        let signature = sink.sign_payload(r#"{"test": "data"}"#, "secret123");
        assert_eq!(signature.len(), 64);
        // Signature should be consistent
        let signature2 = sink.sign_payload(r#"{"test": "data"}"#, "secret123");
        assert_eq!(signature, signature2);
        // and keyed
        assert_ne!(signature, sink.sign_payload(r#"{"test": "data"}"#, "other"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = WebhookSink::new(&WebhookConfig {
            url: "not a url".to_string(),
            secret: None,
        });
        assert!(matches!(result, Err(NotificationError::InvalidConfig(_))));
    }
}

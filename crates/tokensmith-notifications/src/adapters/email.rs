use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::AnomalySink;
use crate::config::EmailConfig;
use crate::error::NotificationError;
use crate::types::AnomalyEvent;

/// Sends anomaly warnings over SMTP.
pub struct EmailSink {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSink {
    /// Builds the SMTP transport. No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::InvalidConfig` for unparseable addresses or
    /// an invalid relay host.
    pub fn new(config: &EmailConfig) -> Result<Self, NotificationError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| NotificationError::InvalidConfig(format!("Invalid from: {}", e)))?;
        let to: Mailbox = config
            .to
            .parse()
            .map_err(|e| NotificationError::InvalidConfig(format!("Invalid to: {}", e)))?;

        let mut mailer_builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotificationError::InvalidConfig(e.to_string()))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            mailer_builder =
                mailer_builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: mailer_builder.build(),
            from,
            to,
        })
    }
}

#[async_trait]
impl AnomalySink for EmailSink {
    async fn deliver(&self, event: &AnomalyEvent) -> Result<(), NotificationError> {
        let content = event.render();

        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(content.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(content.body)
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| NotificationError::SendFailed(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_from_address_rejected() {
        let result = EmailSink::new(&EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from: "not an address".to_string(),
            to: "security@example.com".to_string(),
        });
        match result {
            Err(NotificationError::InvalidConfig(message)) => assert!(message.contains("from")),
            _ => panic!("expected InvalidConfig"),
        }
    }
}

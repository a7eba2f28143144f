use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::errors::EmailError;
use crate::settings::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

pub fn verification_email(to: &str, username: &str, link: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Verify your Photo Gallery account".to_string(),
        text_body: format!(
            "Hello {username},\n\n\
             Please verify your account by opening the link below:\n{link}\n\n\
             This link is valid for 1 hour. If you didn't sign up, feel free to ignore this message.\n"
        ),
    }
}

pub fn password_reset_email(to: &str, username: &str, link: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Reset your Photo Gallery password".to_string(),
        text_body: format!(
            "Hi {username},\n\n\
             You (or someone else) requested a password reset for your Photo Gallery account.\n\n\
             Open the link below to choose a new password:\n{link}\n\n\
             This link is valid for 1 hour. If you did not request this, you can ignore this message.\n"
        ),
    }
}

#[derive(Serialize)]
struct ApiPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Posts messages as JSON to an HTTP mail API.
#[derive(Clone)]
pub struct ApiEmailSender {
    http_client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl ApiEmailSender {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Result<Self, EmailError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| EmailError::Request(e.to_string()))?;

        Ok(ApiEmailSender { http_client, api_url, api_key, from })
    }
}

#[async_trait]
impl EmailSender for ApiEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let payload = ApiPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.text_body,
        };

        let mut request = self.http_client.post(&self.api_url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmailError::Request(e.to_string()))?;

        if response.status().is_success() {
            tracing::info!(to = %message.to, subject = %message.subject, "email sent");
            Ok(())
        } else {
            Err(EmailError::Rejected(response.status().as_u16()))
        }
    }
}

/// The sender chosen from configuration.
#[derive(Clone)]
pub enum ConfiguredEmailSender {
    Api(ApiEmailSender),
    /// No mail API configured: messages are logged, not delivered.
    LogOnly,
}

impl ConfiguredEmailSender {
    pub fn from_config(config: &AppConfig) -> Self {
        let Some(url) = config.email_api_url.clone().filter(|u| !u.trim().is_empty()) else {
            tracing::warn!("No email API configured; outgoing mail will only be logged");
            return ConfiguredEmailSender::LogOnly;
        };

        match ApiEmailSender::new(url, config.email_api_key.clone(), config.email_sender.clone()) {
            Ok(sender) => ConfiguredEmailSender::Api(sender),
            Err(e) => {
                tracing::error!("Email client setup failed, falling back to logging: {}", e);
                ConfiguredEmailSender::LogOnly
            }
        }
    }
}

#[async_trait]
impl EmailSender for ConfiguredEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        match self {
            ConfiguredEmailSender::Api(sender) => sender.send(message).await,
            ConfiguredEmailSender::LogOnly => {
                tracing::info!(
                    to = %message.to,
                    subject = %message.subject,
                    body = %message.text_body,
                    "email delivery disabled; message logged"
                );
                Ok(())
            }
        }
    }
}

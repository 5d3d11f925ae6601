use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::traits::{BaseMailer, OutboundEmail};

/// Transactional mail client
/// Sends lifecycle notifications through the configured mail HTTP API.
pub struct MailerClient {
    client: Client,
    base_url: String,
    api_token: String,
    from_address: String,
}

#[derive(Debug, Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
}

#[derive(Debug, Deserialize)]
struct MailResponse {
    #[allow(dead_code)]
    message_id: Option<String>,
    error: Option<String>,
}

impl MailerClient {
    pub fn new(base_url: String, api_token: String, from_address: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_token,
            from_address,
        }
    }
}

#[async_trait]
impl BaseMailer for MailerClient {
    async fn send(&self, message: &OutboundEmail) -> Result<()> {
        let payload = MailMessage {
            from: &self.from_address,
            to: &message.to,
            subject: &message.subject,
            text_body: &message.body,
        };

        info!(to = %message.to, "sending notification email");

        let response = self
            .client
            .post(format!("{}/messages", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", self.api_token))
            .timeout(std::time::Duration::from_secs(10))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("mail API rejected message {}: {}", status, body);
            anyhow::bail!("mail API error {}: {}", status, body);
        }

        // The API can accept the request but refuse the message itself.
        let mail_response: MailResponse = response.json().await?;
        if let Some(reason) = mail_response.error {
            error!(to = %message.to, reason = %reason, "mail transport refused message");
            anyhow::bail!("mail transport refused message: {}", reason);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parses_accepted_and_refused_shapes() {
        let accepted: MailResponse =
            serde_json::from_str(r#"{"message_id": "abc-123"}"#).unwrap();
        assert!(accepted.error.is_none());

        let refused: MailResponse =
            serde_json::from_str(r#"{"message_id": null, "error": "bad recipient"}"#).unwrap();
        assert_eq!(refused.error.as_deref(), Some("bad recipient"));
    }
}

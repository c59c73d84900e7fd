use anyhow::Context as _;
use reqwest::Client;
use serde::Serialize;

use crate::domain::repository::Mailer;
use crate::domain::types::EmailMessage;
use crate::error::EntitlementError;

/// Sends mail through a transactional-email HTTP API.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(api_url: &str, api_key: String, from: String) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_owned(),
            api_key,
            from,
        }
    }
}

impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EntitlementError> {
        let body = SendRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };
        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("send email request")?
            .error_for_status()
            .context("email provider rejected message")?;
        Ok(())
    }
}

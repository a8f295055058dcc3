//! Mailgun delivery for the summary email

use reqwest::Client;

use super::format::DigestBody;
use super::DigestError;

const MAILGUN_API: &str = "https://api.mailgun.net";

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    api_base: String,
    domain: String,
    api_key: String,
}

impl Mailer {
    pub fn new(domain: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: MAILGUN_API.to_string(),
            domain: domain.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v3/{}/messages", self.api_base, self.domain)
    }

    fn sender(&self) -> String {
        format!("Tennis Score App <no-reply@{}>", self.domain)
    }

    pub async fn send(&self, to: &str, subject: &str, body: &DigestBody) -> Result<(), DigestError> {
        let sender = self.sender();
        let form = [
            ("from", sender.as_str()),
            ("to", to),
            ("subject", subject),
            ("text", body.text.as_str()),
            ("html", body.html.as_str()),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::Mail { status, body });
        }

        Ok(())
    }
}

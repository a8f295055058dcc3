//! Daily summary of completed matches

pub mod format;
pub mod mailer;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::config::DigestConfig;
use crate::store::{MatchStore, StoreError};
use crate::util::time::{until_next_hour, yesterday_window};

pub use format::{render_summary, DigestBody};
pub use mailer::Mailer;

const SUBJECT: &str = "Daily Tennis Matches Summary";

/// Digest errors
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("Failed to load matches: {0}")]
    Store(#[from] StoreError),

    #[error("Mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Mail API error (status {status}): {body}")]
    Mail { status: u16, body: String },
}

/// Sends yesterday's completed matches to one recipient every day
pub struct DigestJob {
    store: MatchStore,
    mailer: Mailer,
    recipient: String,
    hour_utc: u32,
}

impl DigestJob {
    pub fn new(store: MatchStore, config: &DigestConfig) -> Self {
        Self {
            store,
            mailer: Mailer::new(&config.mailgun_domain, &config.mailgun_api_key),
            recipient: config.recipient.clone(),
            hour_utc: config.hour_utc,
        }
    }

    /// Build the summary for the UTC day before `now`
    pub async fn build(&self, now: DateTime<Utc>) -> Result<(usize, DigestBody), DigestError> {
        let (from, to) = yesterday_window(now);
        let matches = self.store.list_completed_between(from, to).await?;
        Ok((matches.len(), render_summary(&matches)))
    }

    /// Build and send the summary for the day before `now`
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<usize, DigestError> {
        let (count, body) = self.build(now).await?;
        self.mailer.send(&self.recipient, SUBJECT, &body).await?;
        Ok(count)
    }

    /// Run forever, once a day at the configured hour
    pub async fn run(self) {
        info!(hour_utc = self.hour_utc, recipient = %self.recipient, "Daily digest scheduled");

        loop {
            let wait = until_next_hour(Utc::now(), self.hour_utc);
            tokio::time::sleep(wait).await;

            match self.run_once(Utc::now()).await {
                Ok(count) => info!(matches = count, "Daily digest sent"),
                Err(e) => error!(error = %e, "Daily digest failed"),
            }
        }
    }
}

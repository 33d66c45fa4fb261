use std::{sync::Arc, time::Duration};

use backon::{BackoffBuilder, ExponentialBuilder};
use reqwest::{
    header::{
        HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, UPGRADE_INSECURE_REQUESTS,
        USER_AGENT,
    },
    Client,
};

use crate::domain::fetch::{FetchError, RawPage};

use super::Sleeper;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const MAX_BACKOFF: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_retries: usize,
    /// Seconds; retry `n` waits `backoff_factor * 2^(n-1)`.
    pub backoff_factor: f64,
    pub retry_statuses: Vec<u16>,
    pub timeout: Duration,
    pub accept_language: String,
    pub rotate_user_agent: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_retries: 3,
            backoff_factor: 2.0,
            retry_statuses: vec![429, 500, 502, 503, 504],
            timeout: Duration::from_secs(20),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            rotate_user_agent: true,
        }
    }
}

/// Connection-reusing HTTP client with a bounded retry policy. One per run.
pub struct Session {
    client: Client,
    config: SessionConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl Session {
    pub fn new(config: SessionConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self, FetchError> {
        let accept_language = HeaderValue::from_str(&config.accept_language).unwrap_or_else(|_| {
            log::warn!(
                "Invalid Accept-Language {:?}, using {}",
                config.accept_language,
                DEFAULT_ACCEPT_LANGUAGE
            );
            HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE)
        });

        // Accept-Encoding is set by reqwest itself so bodies get decompressed
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, accept_language);
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(FetchError::BuildClient)?;

        Ok(Session {
            client,
            config,
            sleeper,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Delays between attempts, one per allowed retry.
    pub fn backoff_schedule(&self) -> impl Iterator<Item = Duration> {
        let factor = self.config.backoff_factor.max(0.0);
        let min_delay = Duration::try_from_secs_f64(factor).unwrap_or_else(|_| {
            log::warn!("Backoff factor {} out of range, capping at {:?}", factor, MAX_BACKOFF);
            MAX_BACKOFF
        });

        ExponentialBuilder::default()
            .with_min_delay(min_delay.min(MAX_BACKOFF))
            .with_factor(2.0)
            .with_max_delay(MAX_BACKOFF)
            .with_max_times(self.config.max_retries)
            .build()
    }

    /// GETs `url`, retrying network errors and retryable statuses.
    ///
    /// Once the budget is spent the last response is returned with
    /// `retries_exhausted` set, so a retryable status still reaches the caller
    /// for classification. A network error on the last attempt comes back as
    /// `FetchError::Network`.
    pub async fn get(&self, url: &str) -> Result<RawPage, FetchError> {
        let mut backoff = self.backoff_schedule();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = self.send_once(url, attempts).await;

            let retry_reason = match &outcome {
                Ok(page) if self.config.retry_statuses.contains(&page.status) => {
                    format!("status {}", page.status)
                }
                Ok(_) => return outcome,
                Err(e) => e.to_string(),
            };

            match backoff.next() {
                Some(delay) => {
                    log::warn!(
                        "Attempt {} on {} failed with {}, retrying in {:.1}s",
                        attempts,
                        url,
                        retry_reason,
                        delay.as_secs_f64()
                    );
                    self.sleeper.sleep(delay).await;
                }
                None => {
                    log::error!(
                        "Giving up on {} after {} attempts, last failure: {}",
                        url,
                        attempts,
                        retry_reason
                    );
                    return outcome.map(|page| RawPage {
                        retries_exhausted: true,
                        ..page
                    });
                }
            }
        }
    }

    async fn send_once(&self, url: &str, attempts: u32) -> Result<RawPage, FetchError> {
        let res = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent())
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|e| FetchError::network(url, e))?;

        Ok(RawPage {
            status,
            body,
            attempts,
            retries_exhausted: false,
        })
    }

    fn user_agent(&self) -> &'static str {
        match self.config.rotate_user_agent {
            true => fake_user_agent::get_rua(),
            false => DEFAULT_USER_AGENT,
        }
    }
}

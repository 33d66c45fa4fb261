use std::{sync::Arc, time::Duration};

use rand::Rng;

use crate::domain::fetch::{FetchError, PageFetchResult};

use super::{PageContentSource, RunEvent, RunObserver, Sleeper};

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Random pause before every page except the first.
    pub delay_range: (Duration, Duration),
    /// Pause after a 429 (and after a 403 when `forbidden_retries` allows one).
    pub cooldown: Duration,
    /// Extra attempts on 403 before the run counts as blocked.
    pub forbidden_retries: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        FetcherConfig {
            delay_range: (Duration::from_secs(1), Duration::from_secs(5)),
            cooldown: Duration::from_secs(60),
            forbidden_retries: 0,
        }
    }
}

pub struct PageFetcher {
    source: Box<dyn PageContentSource>,
    config: FetcherConfig,
    sleeper: Arc<dyn Sleeper>,
    observer: Arc<dyn RunObserver>,
    requests_issued: usize,
}

impl PageFetcher {
    pub fn new(
        source: Box<dyn PageContentSource>,
        config: FetcherConfig,
        sleeper: Arc<dyn Sleeper>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        PageFetcher {
            source,
            config,
            sleeper,
            observer,
            requests_issued: 0,
        }
    }

    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    /// Fetches one page of a run and classifies the outcome.
    ///
    /// A 429 buys one cooldown and one more try inside the same page slot.
    /// Network failures have already been retried by the source, so they
    /// come back as `TransientError` rather than a skipped page.
    pub async fn fetch_page(&mut self, url: &str, page_index: u32) -> PageFetchResult {
        if page_index > 1 {
            let delay = self.page_delay();
            self.observer.on_event(&RunEvent::Waiting {
                page: page_index,
                delay,
            });
            self.sleeper.sleep(delay).await;
        }

        let mut cooled_down = false;
        let mut forbidden_left = self.config.forbidden_retries;

        loop {
            self.requests_issued += 1;
            let page = match self.source.retrieve(url).await {
                Ok(page) => page,
                Err(e) => return transient(e),
            };

            match page.status {
                200..=299 => {
                    self.observer.on_event(&RunEvent::PageFetched {
                        page: page_index,
                        url: url.to_string(),
                    });
                    return PageFetchResult::Success {
                        status: page.status,
                        body: page.body,
                    };
                }
                403 if forbidden_left > 0 => {
                    forbidden_left -= 1;
                    self.cool_down(page_index, 403).await;
                }
                403 => return PageFetchResult::Forbidden,
                404 => return PageFetchResult::NotFound,
                429 if !cooled_down => {
                    cooled_down = true;
                    self.cool_down(page_index, 429).await;
                }
                429 => return PageFetchResult::RateLimited,
                status if page.retries_exhausted => return PageFetchResult::Exhausted { status },
                status => {
                    return PageFetchResult::TransientError {
                        status: Some(status),
                        detail: format!("unexpected status {}", status),
                    }
                }
            }
        }
    }

    pub async fn shutdown(&mut self) {
        if let Err(e) = self.source.shutdown().await {
            log::error!("Failed to release page source: {}", e);
        }
    }

    async fn cool_down(&self, page: u32, status: u16) {
        let delay = self.config.cooldown;
        self.observer.on_event(&RunEvent::Cooldown {
            page,
            status,
            delay,
        });
        self.sleeper.sleep(delay).await;
    }

    fn page_delay(&self) -> Duration {
        let (a, b) = self.config.delay_range;
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        match min < max {
            true => rand::thread_rng().gen_range(min..=max),
            false => min,
        }
    }
}

fn transient(e: FetchError) -> PageFetchResult {
    PageFetchResult::TransientError {
        status: None,
        detail: e.to_string(),
    }
}

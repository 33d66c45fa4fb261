use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rand::Rng;
use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};

use crate::domain::fetch::{FetchError, RawPage};

use super::{PageContentSource, Sleeper};

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// WebDriver endpoint, e.g. http://localhost:4444 or http://chrome:4444/wd/hub
    pub url: String,
    pub headless: bool,
    pub render_wait: (Duration, Duration),
}

/// Headless Chrome driven over WebDriver, for pages that only render with JS.
pub struct BrowserContentSource {
    driver: Option<WebDriver>,
    render_wait: (Duration, Duration),
    sleeper: Arc<dyn Sleeper>,
}

impl BrowserContentSource {
    pub async fn connect(
        config: &BrowserConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, FetchError> {
        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;

        let driver = WebDriver::new(config.url.as_str(), caps).await?;
        log::info!("Connected to WebDriver at {}", config.url);

        Ok(BrowserContentSource {
            driver: Some(driver),
            render_wait: config.render_wait,
            sleeper,
        })
    }

    fn render_delay(&self) -> Duration {
        let (min, max) = self.render_wait;
        match min < max {
            true => rand::thread_rng().gen_range(min..=max),
            false => min,
        }
    }
}

#[async_trait]
impl PageContentSource for BrowserContentSource {
    async fn retrieve(&mut self, url: &str) -> Result<RawPage, FetchError> {
        let delay = self.render_delay();
        let Some(driver) = self.driver.as_ref() else {
            return Err(FetchError::Network {
                url: url.to_string(),
                reason: "browser session already closed".to_string(),
            });
        };

        log::info!("Navigating browser to {}", url);
        driver.goto(url).await?;
        self.sleeper.sleep(delay).await;
        let body = driver.source().await?;

        // WebDriver exposes no status code; a rendered page counts as 200
        Ok(RawPage::ok(body))
    }

    async fn shutdown(&mut self) -> Result<(), FetchError> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await?;
            log::info!("Closed browser session");
        }
        Ok(())
    }
}

use std::sync::Arc;

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use url::Url;

use crate::{
    configuration::Settings,
    services::{
        BrowserContentSource, HttpContentSource, LogObserver, PageContentSource, PageFetcher,
        ReviewExtractor, ReviewPipeline, RunObserver, Session, Sleeper, TokioSleeper,
    },
};

pub const MAX_PAGE_BUDGET: u32 = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Http,
    Browser,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub base_url: String,
    #[serde(default)]
    pub lang_param: String,
    pub max_pages: u32,
    #[serde(default)]
    pub source: SourceKind,
}

impl ScrapeRequest {
    fn validate(&self) -> Result<(), String> {
        let base_url = self.base_url.trim();
        match Url::parse(base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => return Err(format!("Unsupported url scheme: {}", url.scheme())),
            Err(e) => return Err(format!("Invalid base_url {:?}: {}", base_url, e)),
        }

        if !(1..=MAX_PAGE_BUDGET).contains(&self.max_pages) {
            return Err(format!(
                "max_pages must be between 1 and {}, got {}",
                MAX_PAGE_BUDGET, self.max_pages
            ));
        }

        Ok(())
    }
}

#[post("/scrape")]
async fn scrape(body: web::Json<ScrapeRequest>, settings: web::Data<Settings>) -> HttpResponse {
    if let Err(message) = body.validate() {
        return HttpResponse::BadRequest().body(message);
    }

    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let observer: Arc<dyn RunObserver> = Arc::new(LogObserver);

    let extractor = match ReviewExtractor::new(&settings.selectors) {
        Ok(extractor) => extractor,
        Err(e) => {
            log::error!("Selector configuration is broken: {}", e);
            return HttpResponse::InternalServerError().body(e.to_string());
        }
    };

    let source: Box<dyn PageContentSource> = match body.source {
        SourceKind::Http => {
            match Session::new(settings.session.session_config(), sleeper.clone()) {
                Ok(session) => Box::new(HttpContentSource::new(session)),
                Err(e) => {
                    log::error!("Failed to build http session: {}", e);
                    return HttpResponse::InternalServerError().body(e.to_string());
                }
            }
        }
        SourceKind::Browser => {
            match BrowserContentSource::connect(&settings.webdriver.browser_config(), sleeper.clone())
                .await
            {
                Ok(browser) => Box::new(browser),
                Err(e) => {
                    log::error!("Failed to start browser session: {}", e);
                    return HttpResponse::InternalServerError().body(e.to_string());
                }
            }
        }
    };

    let fetcher = PageFetcher::new(
        source,
        settings.fetcher.fetcher_config(),
        sleeper,
        observer.clone(),
    );
    let report = ReviewPipeline::new(fetcher, extractor, observer)
        .run(body.base_url.trim(), &body.lang_param, body.max_pages)
        .await;

    HttpResponse::Ok().json(report)
}

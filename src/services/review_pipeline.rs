use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    fetch::{PageFetchResult, StopReason},
    review::{ReviewRecord, RunReport},
};

use super::{PageFetcher, ReviewExtractor, RunEvent, RunObserver};

/// Url of a numbered listing page. The language filter only applies from
/// page 2 on, the first page is the bare listing.
pub fn page_url(base_url: &str, lang_param: &str, page: u32) -> String {
    match page {
        0 | 1 => format!("{}.htm", base_url),
        n => format!("{}_P{}.htm{}", base_url, n, lang_param),
    }
}

/// Drives one paginated run. Owns its fetcher, so a pipeline is single use.
pub struct ReviewPipeline {
    fetcher: PageFetcher,
    extractor: ReviewExtractor,
    observer: Arc<dyn RunObserver>,
}

impl ReviewPipeline {
    pub fn new(
        fetcher: PageFetcher,
        extractor: ReviewExtractor,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        ReviewPipeline {
            fetcher,
            extractor,
            observer,
        }
    }

    /// Walks pages `1..=max_pages` until the budget runs out, a page comes
    /// back empty, or a fetch ends the run. Whatever was collected before
    /// the stop is kept.
    pub async fn run(mut self, base_url: &str, lang_param: &str, max_pages: u32) -> RunReport {
        let run_id = Uuid::new_v4();
        self.observer.on_event(&RunEvent::Started {
            run_id,
            base_url: base_url.to_string(),
            max_pages,
        });

        let mut records: Vec<ReviewRecord> = vec![];
        let mut stop_reason = StopReason::Completed;
        let mut stopped_at_page = None;
        let mut last_status = None;

        for page in 1..=max_pages {
            let url = page_url(base_url, lang_param, page);
            let result = self.fetcher.fetch_page(&url, page).await;
            last_status = result.status();

            let body = match result {
                PageFetchResult::Success { body, .. } => body,
                other => {
                    if let PageFetchResult::TransientError { detail, .. } = &other {
                        log::error!("Page {} failed: {}", page, detail);
                    }
                    stop_reason = other.stop_reason().unwrap_or(StopReason::TransientNetwork);
                    stopped_at_page = Some(page);
                    break;
                }
            };

            let page_records = self.extractor.extract_document(&body);
            if page_records.is_empty() {
                stop_reason = StopReason::EmptyPage;
                stopped_at_page = Some(page);
                break;
            }

            let found = page_records.len();
            records.extend(page_records);
            self.observer.on_event(&RunEvent::PageExtracted {
                page,
                records: found,
                total: records.len(),
            });
        }

        self.fetcher.shutdown().await;

        self.observer.on_event(&RunEvent::Stopped {
            run_id,
            reason: stop_reason,
            page: stopped_at_page,
            status: last_status,
            total: records.len(),
        });

        RunReport {
            records,
            stop_reason,
            stopped_at_page,
            last_status,
            requests_issued: self.fetcher.requests_issued(),
        }
    }
}

//! Scripted collaborators for exercising the fetcher and pipeline offline.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use itertools::Itertools;

use crate::domain::fetch::{FetchError, RawPage};

use super::{PageContentSource, RunEvent, RunObserver, Sleeper};

#[derive(Clone, Default)]
pub struct RecordingSleeper {
    naps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn naps(&self) -> Vec<Duration> {
        self.naps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.naps.lock().unwrap().push(duration);
    }
}

#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Replays responses in order; once the script runs dry every request gets a 404.
#[derive(Default)]
pub struct ScriptedSource {
    script: VecDeque<Result<RawPage, FetchError>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<RawPage, FetchError>>) -> Self {
        ScriptedSource {
            script: script.into(),
            requested: Arc::default(),
        }
    }

    pub fn pages(pages: Vec<RawPage>) -> Self {
        Self::new(pages.into_iter().map(Ok).collect())
    }

    /// Shared view of requested urls, still readable after the source is moved.
    pub fn requests(&self) -> Arc<Mutex<Vec<String>>> {
        self.requested.clone()
    }
}

#[async_trait]
impl PageContentSource for ScriptedSource {
    async fn retrieve(&mut self, url: &str) -> Result<RawPage, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(RawPage::with_status(404)))
    }
}

pub fn network_error(url: &str) -> FetchError {
    FetchError::Network {
        url: url.to_string(),
        reason: "connection reset by peer".to_string(),
    }
}

/// A listing page holding `count` review containers.
pub fn review_page(page: u32, count: usize) -> String {
    let reviews = (1..=count)
        .map(|i| {
            format!(
                r#"<div data-test="review-details-container">
                    <span data-test="review-rating-label">{i},0</span>
                    <span class="timestamp_reviewDate__dsF9n">{i} mars 2024</span>
                    <h3 data-test="review-details-title">Review {page}-{i}</h3>
                    <span data-test="review-avatar-label">Consultant</span>
                    <span data-test="review-text-PROS">Bonne ambiance</span>
                    <span data-test="review-text-CONS">Salaires</span>
                    <div class="rating-icon_ratingContainer__9UoJ6"><span>Recommends</span></div>
                </div>"#
            )
        })
        .join("\n");

    format!("<html><body><main>{}</main></body></html>", reviews)
}

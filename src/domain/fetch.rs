use serde::Serialize;
use thiserror::Error;

/// What a content source hands back for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    pub status: u16,
    pub body: String,
    /// Requests spent on this page by the source, retries included.
    pub attempts: u32,
    /// Set when the source gave up while `status` was still one it retries.
    pub retries_exhausted: bool,
}

impl RawPage {
    pub fn ok(body: impl Into<String>) -> Self {
        RawPage {
            status: 200,
            body: body.into(),
            attempts: 1,
            retries_exhausted: false,
        }
    }

    pub fn with_status(status: u16) -> Self {
        RawPage {
            status,
            body: String::new(),
            attempts: 1,
            retries_exhausted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageFetchResult {
    Success { status: u16, body: String },
    RateLimited,
    Forbidden,
    NotFound,
    TransientError { status: Option<u16>, detail: String },
    Exhausted { status: u16 },
}

impl PageFetchResult {
    pub fn status(&self) -> Option<u16> {
        match self {
            PageFetchResult::Success { status, .. } => Some(*status),
            PageFetchResult::RateLimited => Some(429),
            PageFetchResult::Forbidden => Some(403),
            PageFetchResult::NotFound => Some(404),
            PageFetchResult::TransientError { status, .. } => *status,
            PageFetchResult::Exhausted { status } => Some(*status),
        }
    }

    /// `None` while pagination may continue.
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            PageFetchResult::Success { .. } => None,
            PageFetchResult::RateLimited => Some(StopReason::RateLimited),
            PageFetchResult::Forbidden => Some(StopReason::Blocked),
            PageFetchResult::NotFound => Some(StopReason::NotFound),
            PageFetchResult::TransientError { .. } => Some(StopReason::TransientNetwork),
            PageFetchResult::Exhausted { .. } => Some(StopReason::Exhausted),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    EmptyPage,
    Blocked,
    NotFound,
    RateLimited,
    TransientNetwork,
    Exhausted,
}

impl StopReason {
    /// Terminal reasons that mean the site did not cooperate, as opposed to
    /// pagination simply running out.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            StopReason::Blocked
                | StopReason::RateLimited
                | StopReason::TransientNetwork
                | StopReason::Exhausted
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            StopReason::Completed => "page budget reached",
            StopReason::EmptyPage => "no more data",
            StopReason::Blocked => "blocked by anti-bot protection",
            StopReason::NotFound => "page does not exist",
            StopReason::RateLimited => "rate limited after cooldown",
            StopReason::TransientNetwork => "network or server error",
            StopReason::Exhausted => "retry budget exhausted",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    BuildClient(#[source] reqwest::Error),
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("browser session error: {0}")]
    Browser(#[from] thirtyfour::error::WebDriverError),
}

impl FetchError {
    pub fn network(url: &str, err: reqwest::Error) -> Self {
        FetchError::Network {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

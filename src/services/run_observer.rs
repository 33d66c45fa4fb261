use std::{fmt, time::Duration};

use log::Level;
use uuid::Uuid;

use crate::domain::fetch::StopReason;

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Started {
        run_id: Uuid,
        base_url: String,
        max_pages: u32,
    },
    Waiting {
        page: u32,
        delay: Duration,
    },
    Cooldown {
        page: u32,
        status: u16,
        delay: Duration,
    },
    PageFetched {
        page: u32,
        url: String,
    },
    PageExtracted {
        page: u32,
        records: usize,
        total: usize,
    },
    Stopped {
        run_id: Uuid,
        reason: StopReason,
        page: Option<u32>,
        status: Option<u16>,
        total: usize,
    },
}

impl RunEvent {
    pub fn level(&self) -> Level {
        match self {
            RunEvent::Cooldown { .. } => Level::Warn,
            RunEvent::Stopped { reason, .. } => match reason {
                StopReason::RateLimited => Level::Warn,
                r if r.is_failure() => Level::Error,
                _ => Level::Info,
            },
            _ => Level::Info,
        }
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::Started {
                run_id,
                base_url,
                max_pages,
            } => write!(f, "[{}] Starting run on {} for {} pages", run_id, base_url, max_pages),
            RunEvent::Waiting { page, delay } => write!(
                f,
                "Waiting for {:.1} seconds before page {}",
                delay.as_secs_f64(),
                page
            ),
            RunEvent::Cooldown {
                page,
                status,
                delay,
            } => write!(
                f,
                "Got {} on page {}, cooling down for {} seconds",
                status,
                page,
                delay.as_secs()
            ),
            RunEvent::PageFetched { page, url } => write!(f, "Fetched page {}: {}", page, url),
            RunEvent::PageExtracted {
                page,
                records,
                total,
            } => write!(
                f,
                "Found {} reviews on page {} ({} total)",
                records, page, total
            ),
            RunEvent::Stopped {
                run_id,
                reason,
                page,
                status,
                total,
            } => {
                write!(f, "[{}] Stopped: {}", run_id, reason.describe())?;
                if let Some(page) = page {
                    write!(f, " at page {}", page)?;
                }
                if let Some(status) = status {
                    write!(f, " (last status {})", status)?;
                }
                write!(f, " with {} reviews", total)
            }
        }
    }
}

pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &RunEvent);
}

/// Reports run events through the `log` facade.
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn on_event(&self, event: &RunEvent) {
        log::log!(target: "review_pipeline", event.level(), "{}", event);
    }
}

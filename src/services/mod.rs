pub mod content_source;
pub mod droid;
pub mod page_fetcher;
pub mod review_extractor;
pub mod review_pipeline;
pub mod run_observer;
pub mod session;
pub mod sleeper;

#[cfg(test)]
pub(crate) mod testing;

pub use content_source::*;
pub use droid::*;
pub use page_fetcher::*;
pub use review_extractor::*;
pub use review_pipeline::*;
pub use run_observer::*;
pub use session::*;
pub use sleeper::*;

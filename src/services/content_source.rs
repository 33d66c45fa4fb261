use async_trait::async_trait;

use crate::domain::fetch::{FetchError, RawPage};

use super::Session;

/// Anything that can turn a page url into raw markup: a plain HTTP session
/// or a browser that renders the page first.
#[async_trait]
pub trait PageContentSource: Send {
    async fn retrieve(&mut self, url: &str) -> Result<RawPage, FetchError>;

    /// Releases whatever the source holds open. Called once when a run ends.
    async fn shutdown(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}

pub struct HttpContentSource {
    session: Session,
}

impl HttpContentSource {
    pub fn new(session: Session) -> Self {
        HttpContentSource { session }
    }
}

#[async_trait]
impl PageContentSource for HttpContentSource {
    async fn retrieve(&mut self, url: &str) -> Result<RawPage, FetchError> {
        self.session.get(url).await
    }
}

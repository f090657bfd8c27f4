//! In-memory page fetcher for exercising extraction without a network.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::scraping::fetch::{FetchError, PageFetcher};

#[derive(Clone, Debug)]
pub enum StubPage {
    Body(String),
    Status(u16),
    /// Never resolves; only a deadline gets the caller out.
    Hang,
}

#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, StubPage>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: StubPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self.pages.get(url) {
            Some(StubPage::Body(body)) => Ok(body.clone()),
            Some(StubPage::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Some(StubPage::Hang) => std::future::pending().await,
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

//! Resilient asset downloads.
//!
//! Every URL is fetched concurrently. A single attempt either succeeds,
//! fails terminally (non-200 status, empty body) or fails in a retryable way
//! (network error, timeout). Retryable failures are reported as
//! [`FetchEvent::Image`] and re-issued immediately until the retry budget is
//! spent.

use crate::error::{Error, Result};
use crate::event::{emit, EventSink, FetchEvent, FetchStatus};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Default per-attempt timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of attempts per asset.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Plain GET of a binary payload.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and buffer the whole body.
    ///
    /// Implementations return [`Error::Status`] for non-200 answers and
    /// [`Error::Network`] for transport failures.
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Downloads payloads with per-attempt timeout and bounded retries.
#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    max_retries: u32,
}

impl Downloader {
    /// Create a downloader with default timeout and retry budget.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set number of attempts per asset (at least one).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of attempts per asset.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetch one asset.
    pub async fn fetch(
        &self,
        page_name: &str,
        url: &str,
        sink: Option<&EventSink>,
    ) -> Result<Vec<u8>> {
        let mut retries_left = self.max_retries;

        loop {
            let error = match tokio::time::timeout(self.timeout, self.transport.get(url)).await {
                Ok(Ok(bytes)) if bytes.is_empty() => {
                    return Err(Error::EmptyPayload {
                        url: url.to_string(),
                    })
                }
                Ok(Ok(bytes)) => return Ok(bytes),
                Ok(Err(err)) if !err.is_retryable() => return Err(err),
                Ok(Err(err)) => err,
                Err(_) => Error::Timeout {
                    url: url.to_string(),
                    millis: self.timeout.as_millis() as u64,
                },
            };

            retries_left -= 1;
            log::warn!(
                "Fetching {} failed ({} retries left): {}",
                url,
                retries_left,
                error
            );
            emit(
                sink,
                FetchEvent::Image {
                    page_name: page_name.to_string(),
                    url: url.to_string(),
                    retries_left,
                    error: error.to_string(),
                },
            );

            if retries_left == 0 {
                return Err(Error::RetriesExhausted {
                    url: url.to_string(),
                    retries: self.max_retries,
                    last: Box::new(error),
                });
            }
        }
    }

    /// Fetch every URL concurrently, returning payloads in input order.
    ///
    /// The first failure cancels the remaining downloads.
    pub async fn download_all(
        &self,
        page_name: &str,
        urls: Vec<String>,
        sink: Option<&EventSink>,
    ) -> Result<Vec<Vec<u8>>> {
        emit(
            sink,
            FetchEvent::Images {
                page_name: page_name.to_string(),
                status: FetchStatus::Fetching,
            },
        );

        let count = urls.len();
        let mut tasks = JoinSet::new();
        for (index, url) in urls.into_iter().enumerate() {
            let downloader = self.clone();
            let page_name = page_name.to_string();
            let sink = sink.cloned();
            tasks.spawn(async move {
                let bytes = downloader.fetch(&page_name, &url, sink.as_ref()).await;
                (index, bytes)
            });
        }

        let mut buffers: Vec<Vec<u8>> = vec![Vec::new(); count];
        while let Some(joined) = tasks.join_next().await {
            let (index, bytes) = joined?;
            match bytes {
                Ok(bytes) => buffers[index] = bytes,
                Err(err) => {
                    emit(
                        sink,
                        FetchEvent::Images {
                            page_name: page_name.to_string(),
                            status: FetchStatus::Error,
                        },
                    );
                    return Err(err);
                }
            }
        }

        emit(
            sink,
            FetchEvent::Images {
                page_name: page_name.to_string(),
                status: FetchStatus::Fetched,
            },
        );
        Ok(buffers)
    }
}

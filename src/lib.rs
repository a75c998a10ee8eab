//! # figsync
//!
//! Fetch rendered component images and shared styles from Figma files.
//!
//! The library turns a file's page tree into a flat list of components,
//! asks the render endpoint for image URLs in batches, downloads every
//! payload concurrently with timeouts and retries, and rewrites SVG-internal
//! ids so that exported documents can be combined without collisions.
//!
//! ## Quick Start
//!
//! ```no_run
//! use figsync::{fetch_images, FetchOptions, ImageFormat};
//!
//! #[tokio::main]
//! async fn main() -> figsync::Result<()> {
//!     // Reads FIGMA_TOKEN from the environment
//!     let options = FetchOptions::new("E6didZF0rpPf8piANHABDZ", ImageFormat::Svg)
//!         .with_pages(["Filled"])
//!         .with_on_event(|event| println!("{}", event));
//!
//!     for image in fetch_images(options).await? {
//!         println!("{} ({} bytes)", image.name(), image.size());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Batching**: render requests are split into balanced batches of at most 1000 ids
//! - **Resilient downloads**: per-attempt timeout, immediate retries, progress events
//! - **SVG id rewriting**: gradient, filter and clip-path ids stay unique across files
//! - **Styles**: color and text styles resolved to concrete values
//! - **Watching**: poll a file and get called back when it changes

pub mod batch;
pub mod client;
pub mod diff;
pub mod download;
pub mod error;
pub mod event;
pub mod model;
pub mod pipeline;
pub mod select;
pub mod styles;
pub mod svg;
pub mod tree;
pub mod watch;

// Re-export commonly used types
pub use client::{ClientConfig, FileCache, FileProvider, HttpClient, ImageFormat, RenderParams};
pub use diff::diff_files;
pub use download::{Downloader, Transport, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_RETRIES};
pub use error::{Error, Result};
pub use event::{EventSink, FetchEvent, FetchStatus};
pub use model::{Component, FileDocument, Image, Node, NodeType, StyleEntry, Styles};
pub use pipeline::FetchOptions;
pub use select::ComponentFilter;
pub use styles::extract_styles;
pub use svg::{rewrite_ids, RewriteCounter};
pub use watch::{WatchHandle, DEFAULT_WATCH_INTERVAL, MIN_WATCH_INTERVAL};

use std::sync::Arc;
use std::time::Duration;

/// Fetch images with a client configured from the environment.
///
/// Each call builds a fresh [`Figsync`]; keep a client around to share the
/// file cache and the SVG id counter across calls.
///
/// # Example
///
/// ```no_run
/// use figsync::{fetch_images, FetchOptions, ImageFormat};
///
/// # async fn run() -> figsync::Result<()> {
/// let images = fetch_images(
///     FetchOptions::new("E6didZF0rpPf8piANHABDZ", ImageFormat::Png).with_names(["Arrow"]),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn fetch_images(options: FetchOptions) -> Result<Vec<Image>> {
    Figsync::from_env()?.fetch_images(options).await
}

/// Fetch color and text styles with a client configured from the environment.
pub async fn fetch_styles(file_id: &str) -> Result<Styles> {
    Figsync::from_env()?.fetch_styles(file_id).await
}

/// Client for fetching images and styles.
///
/// Cloning is cheap; clones share the provider, the file cache and the SVG
/// id counter.
///
/// # Example
///
/// ```no_run
/// use figsync::{Figsync, FetchOptions, ImageFormat};
///
/// # async fn run() -> figsync::Result<()> {
/// let client = Figsync::from_env()?;
/// let icons = client
///     .fetch_images(FetchOptions::new("file-key", ImageFormat::Svg))
///     .await?;
/// let styles = client.fetch_styles("file-key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Figsync {
    provider: Arc<dyn FileProvider>,
    transport: Arc<dyn Transport>,
    cache: FileCache,
    counter: RewriteCounter,
}

impl Figsync {
    /// Create a client talking HTTPS with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Arc::new(HttpClient::new(config)?);
        Ok(Self::with_parts(http.clone(), http))
    }

    /// Create a client from `FIGMA_TOKEN` (and optional `FIGMA_API_BASE`).
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client from custom provider and transport implementations.
    pub fn with_parts(provider: Arc<dyn FileProvider>, transport: Arc<dyn Transport>) -> Self {
        Self {
            provider,
            transport,
            cache: FileCache::new(),
            counter: RewriteCounter::new(),
        }
    }

    /// Use the given file cache.
    pub fn with_cache(mut self, cache: FileCache) -> Self {
        self.cache = cache;
        self
    }

    /// Expire cached files after `ttl`.
    pub fn with_cache_ttl(self, ttl: Duration) -> Self {
        self.with_cache(FileCache::with_ttl(ttl))
    }

    /// Draw SVG id suffixes from the given counter.
    pub fn with_counter(mut self, counter: RewriteCounter) -> Self {
        self.counter = counter;
        self
    }

    /// The file cache.
    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// The SVG id counter.
    pub fn counter(&self) -> &RewriteCounter {
        &self.counter
    }

    /// Fetch a file document, from the cache unless `use_cache` is false.
    ///
    /// Fresh documents are always written back to the cache.
    pub async fn file(&self, file_id: &str, use_cache: bool) -> Result<Arc<FileDocument>> {
        if use_cache {
            if let Some(file) = self.cache.get(file_id) {
                log::debug!("Using cached file {}", file_id);
                return Ok(file);
            }
        }

        let file = self.provider.file(file_id).await.map_err(|err| match err {
            Error::Provider { .. } => err,
            other => Error::provider(file_id, other),
        })?;
        let file = Arc::new(file);
        self.cache.insert(file_id, file.clone());
        Ok(file)
    }

    /// Fetch rendered images for the selected components of a file.
    ///
    /// Returns one [`Image`] per selected component, ordered by page and then
    /// by position in the page. Any page failure fails the whole call.
    pub async fn fetch_images(&self, options: FetchOptions) -> Result<Vec<Image>> {
        let file = self.file(&options.file_id, options.use_cache).await?;
        let downloader = Downloader::new(self.transport.clone())
            .with_timeout(options.fetch_timeout)
            .with_max_retries(options.max_retries);

        pipeline::run(
            self.provider.clone(),
            downloader,
            self.counter.clone(),
            &file,
            options,
        )
        .await
    }

    /// Fetch a file's color and text styles, keyed by style name.
    pub async fn fetch_styles(&self, file_id: &str) -> Result<Styles> {
        let file = self.file(file_id, true).await?;
        Ok(extract_styles(&file))
    }

    /// Poll a file and call `callback(current, previous)` when it changes.
    ///
    /// Intervals below [`MIN_WATCH_INTERVAL`] are raised to it. Must be
    /// called from within a tokio runtime.
    pub fn watch_file<F>(
        &self,
        file_id: impl Into<String>,
        interval: Duration,
        callback: F,
    ) -> WatchHandle
    where
        F: FnMut(&FileDocument, &FileDocument) + Send + 'static,
    {
        watch::spawn(self.clone(), file_id.into(), interval, callback)
    }
}

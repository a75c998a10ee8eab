//! Image-fetch pipeline.
//!
//! For every selected page: resolve render URLs in batches, download all
//! payloads, rewrite SVG ids, and pair each payload with its component.
//! Pages run concurrently; the first page failure fails the whole fetch.

use crate::batch::request_sources;
use crate::client::{FileProvider, ImageFormat, RenderParams};
use crate::download::{Downloader, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_RETRIES};
use crate::error::Result;
use crate::event::{EventSink, FetchEvent};
use crate::model::{Component, FileDocument, Image};
use crate::select::{select_components, select_pages, ComponentFilter};
use crate::svg::{rewrite_svg_bytes, RewriteCounter};
use crate::tree::FileTree;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Options for [`Figsync::fetch_images`](crate::Figsync::fetch_images).
#[derive(Clone)]
pub struct FetchOptions {
    /// File to export from (the key in the file's URL)
    pub file_id: String,

    /// Render options passed to the provider
    pub render: RenderParams,

    /// Only export these pages (all pages when `None`)
    pub pages: Option<Vec<String>>,

    /// Which components to export
    pub filter: ComponentFilter,

    /// Per-attempt download timeout
    pub fetch_timeout: Duration,

    /// Attempts per download
    pub max_retries: u32,

    /// Resolve each component's direct parent name
    pub include_parent_name: bool,

    /// Reuse a cached file document when available
    pub use_cache: bool,

    /// Progress and error notifications
    pub on_event: Option<EventSink>,
}

impl FetchOptions {
    /// Create options for `file_id` in `format`.
    pub fn new(file_id: impl Into<String>, format: ImageFormat) -> Self {
        Self {
            file_id: file_id.into(),
            render: RenderParams::new(format),
            pages: None,
            filter: ComponentFilter::All,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            include_parent_name: false,
            use_cache: true,
            on_event: None,
        }
    }

    /// Restrict to the named pages.
    pub fn with_pages<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pages = Some(pages.into_iter().map(Into::into).collect());
        self
    }

    /// Set component filter.
    pub fn with_filter(mut self, filter: ComponentFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Only export components with these names.
    pub fn with_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_filter(ComponentFilter::names(names))
    }

    /// Set per-attempt download timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set attempts per download.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Resolve parent names (walks the tree once more per component).
    pub fn with_parent_name(mut self, include: bool) -> Self {
        self.include_parent_name = include;
        self
    }

    /// Set render scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.render.scale = Some(scale);
        self
    }

    /// Include node ids in SVG output.
    pub fn with_svg_include_id(mut self, include: bool) -> Self {
        self.render.svg_include_id = include;
        self
    }

    /// Simplify strokes in SVG output.
    pub fn with_svg_simplify_stroke(mut self, simplify: bool) -> Self {
        self.render.svg_simplify_stroke = Some(simplify);
        self
    }

    /// Render with absolute bounds.
    pub fn with_use_absolute_bounds(mut self, absolute: bool) -> Self {
        self.render.use_absolute_bounds = Some(absolute);
        self
    }

    /// Render a specific file version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.render.version = Some(version.into());
        self
    }

    /// Enable or disable the file cache for this fetch.
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Receive progress and error events.
    pub fn with_on_event(mut self, f: impl Fn(&FetchEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(f));
        self
    }

    /// Output format.
    pub fn format(&self) -> ImageFormat {
        self.render.format
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("file_id", &self.file_id)
            .field("render", &self.render)
            .field("pages", &self.pages)
            .field("filter", &self.filter)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("max_retries", &self.max_retries)
            .field("include_parent_name", &self.include_parent_name)
            .field("use_cache", &self.use_cache)
            .field("on_event", &self.on_event.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Everything one page needs to run independently.
struct PageJob {
    provider: Arc<dyn FileProvider>,
    downloader: Downloader,
    counter: RewriteCounter,
    file_id: String,
    page_name: String,
    components: Vec<Component>,
    render: RenderParams,
    sink: Option<EventSink>,
}

impl PageJob {
    async fn run(self) -> Result<Vec<Image>> {
        let sink = self.sink.as_ref();
        let ids: Vec<String> = self.components.iter().map(|c| c.id.clone()).collect();

        let urls = request_sources(
            self.provider.clone(),
            &self.file_id,
            &self.page_name,
            &ids,
            &self.render,
            sink,
        )
        .await?;

        let buffers = self
            .downloader
            .download_all(&self.page_name, urls, sink)
            .await?;

        let svg = self.render.format.is_svg();
        let counter = self.counter;
        Ok(self
            .components
            .into_iter()
            .zip(buffers)
            .map(|(component, buffer)| {
                let buffer = if svg {
                    rewrite_svg_bytes(buffer, &counter)
                } else {
                    buffer
                };
                Image::new(component, buffer)
            })
            .collect())
    }
}

/// Run the pipeline over an already fetched file.
pub(crate) async fn run(
    provider: Arc<dyn FileProvider>,
    downloader: Downloader,
    counter: RewriteCounter,
    file: &FileDocument,
    options: FetchOptions,
) -> Result<Vec<Image>> {
    let work: Vec<(String, Vec<Component>)> = {
        let tree = FileTree::build(file);
        select_pages(tree.pages(), options.pages.as_deref())
            .into_iter()
            .map(|page| {
                let components = select_components(
                    tree.components(page, options.include_parent_name),
                    &options.filter,
                );
                (page.name().to_string(), components)
            })
            .filter(|(name, components)| {
                if components.is_empty() {
                    log::debug!("No components selected on page '{}'", name);
                }
                !components.is_empty()
            })
            .collect()
    };

    let page_count = work.len();
    let mut tasks = JoinSet::new();
    for (index, (page_name, components)) in work.into_iter().enumerate() {
        let job = PageJob {
            provider: provider.clone(),
            downloader: downloader.clone(),
            counter: counter.clone(),
            file_id: options.file_id.clone(),
            page_name,
            components,
            render: options.render.clone(),
            sink: options.on_event.clone(),
        };
        tasks.spawn(async move { (index, job.run().await) });
    }

    let mut pages: Vec<Vec<Image>> = vec![Vec::new(); page_count];
    while let Some(joined) = tasks.join_next().await {
        let (index, images) = joined?;
        pages[index] = images?;
    }

    let images: Vec<Image> = pages.into_iter().flatten().collect();
    log::info!(
        "Fetched {} images from {} pages of file {}",
        images.len(),
        page_count,
        options.file_id
    );
    Ok(images)
}

//! Integration tests for the image-fetch pipeline.

use async_trait::async_trait;
use figsync::error::{Error, Result};
use figsync::{
    Component, ComponentFilter, FetchEvent, FetchOptions, FetchStatus, FileDocument,
    FileProvider, Figsync, ImageFormat, RenderParams, Transport,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const FILE_JSON: &str = r##"{
    "name": "Icons",
    "lastModified": "2024-03-01T10:00:00Z",
    "version": "1",
    "document": {
        "id": "0:0",
        "name": "Document",
        "type": "DOCUMENT",
        "children": [
            {
                "id": "0:1",
                "name": "Filled",
                "type": "CANVAS",
                "children": [
                    {
                        "id": "1:1",
                        "name": "Toolbar",
                        "type": "FRAME",
                        "children": [
                            {
                                "id": "1:2",
                                "name": "Arrow",
                                "type": "COMPONENT",
                                "absoluteBoundingBox": {"x": 0, "y": 0, "width": 24, "height": 24}
                            },
                            {
                                "id": "1:3",
                                "name": "Actions",
                                "type": "GROUP",
                                "children": [
                                    {"id": "1:4", "name": "Close", "type": "COMPONENT"}
                                ]
                            }
                        ]
                    }
                ]
            },
            {
                "id": "0:2",
                "name": "Outlined",
                "type": "CANVAS",
                "children": [
                    {"id": "2:1", "name": "Arrow", "type": "COMPONENT"}
                ]
            },
            {
                "id": "0:3",
                "name": "Notes",
                "type": "CANVAS",
                "children": [
                    {"id": "3:1", "name": "Readme", "type": "TEXT"}
                ]
            }
        ]
    },
    "components": {
        "1:2": {"key": "a", "name": "Arrow", "description": "Points right"}
    },
    "styles": {}
}"##;

const SVG_WITH_FILTER: &str =
    r##"<svg width="24" height="24"><g filter="url(#f)"/><defs><filter id="f" x="0"/></defs></svg>"##;

/// In-memory stand-in for the provider and the asset CDN.
#[derive(Default)]
struct FakeFigma {
    file_calls: AtomicU32,
    render_calls: AtomicU32,
    downloads: AtomicU32,
    /// URLs that fail with a network error this many times before succeeding
    flaky: Mutex<HashMap<String, u32>>,
    /// URLs that answer with this status
    broken: HashMap<String, u16>,
    /// Ids the renderer returns no URL for
    unrenderable: HashSet<String>,
    fail_render: bool,
}

fn render_url(id: &str, format: ImageFormat) -> String {
    format!("https://cdn.test/{}.{}", id.replace(':', "-"), format)
}

fn cdn_url(id: &str) -> String {
    render_url(id, ImageFormat::Png)
}

#[async_trait]
impl FileProvider for FakeFigma {
    async fn file(&self, _file_id: &str) -> Result<FileDocument> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::from_str(FILE_JSON)?)
    }

    async fn file_images(
        &self,
        file_id: &str,
        ids: &[String],
        params: &RenderParams,
    ) -> Result<HashMap<String, Option<String>>> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        assert!(params.svg_include_id);
        if self.fail_render {
            return Err(Error::provider(file_id, "500 Internal Server Error"));
        }
        Ok(ids
            .iter()
            .map(|id| {
                let url = (!self.unrenderable.contains(id)).then(|| render_url(id, params.format));
                (id.clone(), url)
            })
            .collect())
    }
}

#[async_trait]
impl Transport for FakeFigma {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if let Some(&status) = self.broken.get(url) {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }
        {
            let mut flaky = self.flaky.lock();
            if let Some(remaining) = flaky.get_mut(url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(Error::Network {
                        url: url.to_string(),
                        message: "connection reset".to_string(),
                    });
                }
            }
        }
        if url.ends_with(".svg") {
            return Ok(SVG_WITH_FILTER.as_bytes().to_vec());
        }
        Ok(format!("PNG:{}", url).into_bytes())
    }
}

fn client(fake: FakeFigma) -> (Figsync, Arc<FakeFigma>) {
    let fake = Arc::new(fake);
    (Figsync::with_parts(fake.clone(), fake.clone()), fake)
}

fn recorder() -> (Arc<Mutex<Vec<FetchEvent>>>, impl Fn(&FetchEvent) + Send + Sync + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    (events, move |event: &FetchEvent| captured.lock().push(event.clone()))
}

#[tokio::test]
async fn test_fetch_single_page_png() {
    let (client, fake) = client(FakeFigma::default());

    let images = client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png).with_pages(["Filled"]))
        .await
        .unwrap();

    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|image| image.page_name() == "Filled"));
    assert!(images.iter().all(|image| !image.buffer.is_empty()));
    assert_eq!(images[0].name(), "Arrow");
    assert_eq!(images[0].buffer, b"PNG:https://cdn.test/1-2.png".to_vec());
    assert_eq!(fake.render_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_component_metadata() {
    let (client, _) = client(FakeFigma::default());

    let images = client
        .fetch_images(
            FetchOptions::new("X", ImageFormat::Png)
                .with_pages(["Filled"])
                .with_parent_name(true),
        )
        .await
        .unwrap();

    let arrow = &images[0].component;
    assert_eq!(arrow.description, "Points right");
    assert_eq!(arrow.frame_name.as_deref(), Some("Toolbar"));
    assert_eq!(arrow.group_name, None);
    assert_eq!(arrow.parent_name.as_deref(), Some("Toolbar"));
    assert_eq!((arrow.width, arrow.height), (24.0, 24.0));

    let close = &images[1].component;
    assert_eq!(close.frame_name.as_deref(), Some("Toolbar"));
    assert_eq!(close.group_name.as_deref(), Some("Actions"));
    assert_eq!(close.parent_name.as_deref(), Some("Actions"));
}

#[tokio::test]
async fn test_all_pages_in_order_without_empty_pages() {
    let (client, fake) = client(FakeFigma::default());

    let images = client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png))
        .await
        .unwrap();

    let ids: Vec<&str> = images.iter().map(|image| image.id()).collect();
    assert_eq!(ids, vec!["1:2", "1:4", "2:1"]);
    // One render request per non-empty page
    assert_eq!(fake.render_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_name_filter_across_pages() {
    let (client, _) = client(FakeFigma::default());

    let images = client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png).with_names(["Arrow"]))
        .await
        .unwrap();

    let pages: Vec<&str> = images.iter().map(|image| image.page_name()).collect();
    assert_eq!(pages, vec!["Filled", "Outlined"]);
}

#[tokio::test]
async fn test_predicate_filter_with_no_match() {
    let (client, fake) = client(FakeFigma::default());

    let options = FetchOptions::new("X", ImageFormat::Png)
        .with_filter(ComponentFilter::predicate(|c: &Component| c.name == "Missing"));
    let images = client.fetch_images(options).await.unwrap();

    assert!(images.is_empty());
    assert_eq!(fake.render_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_event_sequence() {
    let (client, _) = client(FakeFigma::default());
    let (events, sink) = recorder();

    client
        .fetch_images(
            FetchOptions::new("X", ImageFormat::Png)
                .with_pages(["Filled"])
                .with_on_event(sink),
        )
        .await
        .unwrap();

    let events = events.lock();
    let stages: Vec<(&str, FetchStatus)> = events
        .iter()
        .map(|event| match event {
            FetchEvent::Sources { status, .. } => ("sources", *status),
            FetchEvent::Images { status, .. } => ("images", *status),
            FetchEvent::Image { .. } => ("image", FetchStatus::Error),
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            ("sources", FetchStatus::Fetching),
            ("sources", FetchStatus::Fetched),
            ("images", FetchStatus::Fetching),
            ("images", FetchStatus::Fetched),
        ]
    );
    assert!(events.iter().all(|event| event.page_name() == "Filled"));
}

#[tokio::test]
async fn test_flaky_download_recovers() {
    let fake = FakeFigma::default();
    fake.flaky.lock().insert(cdn_url("1:4"), 2);
    let (client, fake) = client(fake);
    let (events, sink) = recorder();

    let images = client
        .fetch_images(
            FetchOptions::new("X", ImageFormat::Png)
                .with_pages(["Filled"])
                .with_on_event(sink),
        )
        .await
        .unwrap();

    assert_eq!(images.len(), 2);
    assert_eq!(fake.downloads.load(Ordering::SeqCst), 4);
    let image_errors = events
        .lock()
        .iter()
        .filter(|event| matches!(event, FetchEvent::Image { .. }))
        .count();
    assert_eq!(image_errors, 2);
}

#[tokio::test]
async fn test_exhausted_download_fails_whole_call() {
    let fake = FakeFigma::default();
    fake.flaky.lock().insert(cdn_url("2:1"), 10);
    let (client, _) = client(fake);
    let (events, sink) = recorder();

    let err = client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png).with_on_event(sink))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { retries: 3, .. }));
    assert!(err.to_string().contains("failed after multiple retries"));
    let retries: Vec<u32> = events
        .lock()
        .iter()
        .filter_map(|event| match event {
            FetchEvent::Image { retries_left, .. } => Some(*retries_left),
            _ => None,
        })
        .collect();
    assert_eq!(retries, vec![2, 1, 0]);
}

#[tokio::test]
async fn test_custom_retry_budget() {
    let fake = FakeFigma::default();
    fake.flaky.lock().insert(cdn_url("2:1"), 4);
    let (client, _) = client(fake);

    let images = client
        .fetch_images(
            FetchOptions::new("X", ImageFormat::Png)
                .with_pages(["Outlined"])
                .with_max_retries(5)
                .with_fetch_timeout(Duration::from_secs(1)),
        )
        .await
        .unwrap();
    assert_eq!(images.len(), 1);
}

#[tokio::test]
async fn test_status_error_not_retried() {
    let fake = FakeFigma {
        broken: HashMap::from([(cdn_url("1:2"), 404)]),
        ..Default::default()
    };
    let (client, fake) = client(fake);

    let err = client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png).with_pages(["Filled"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Status { status: 404, .. }));
    assert!(fake.downloads.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_render_failure_propagates() {
    let (client, fake) = client(FakeFigma {
        fail_render: true,
        ..Default::default()
    });

    let err = client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
    assert_eq!(fake.downloads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_render_url() {
    let (client, _) = client(FakeFigma {
        unrenderable: HashSet::from(["1:4".to_string()]),
        ..Default::default()
    });

    let err = client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png).with_pages(["Filled"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingSource { ref id } if id == "1:4"));
}

#[tokio::test]
async fn test_svg_ids_unique_across_images() {
    let (client, _) = client(FakeFigma::default());

    let images = client
        .fetch_images(FetchOptions::new("X", ImageFormat::Svg))
        .await
        .unwrap();
    assert_eq!(images.len(), 3);

    let mut suffixed = HashSet::new();
    for image in &images {
        let text = image.as_text().unwrap();
        let start = text.find("url(#").unwrap() + 5;
        let end = start + text[start..].find(')').unwrap();
        let id = &text[start..end];

        assert!(id.starts_with("f_"));
        assert!(text.contains(&format!(r#"<filter id="{}""#, id)));
        assert!(suffixed.insert(id.to_string()), "duplicate id {id}");
    }
    assert_eq!(client.counter().peek(), 3);

    // A second run on the same client keeps counting
    let again = client
        .fetch_images(FetchOptions::new("X", ImageFormat::Svg).with_pages(["Outlined"]))
        .await
        .unwrap();
    assert!(again[0].as_text().unwrap().contains("url(#f_3)"));
}

#[tokio::test]
async fn test_png_bytes_not_rewritten() {
    let (client, _) = client(FakeFigma::default());
    let before = client.counter().peek();

    client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png))
        .await
        .unwrap();
    assert_eq!(client.counter().peek(), before);
}

#[tokio::test]
async fn test_file_cached_between_fetches() {
    let (client, fake) = client(FakeFigma::default());

    client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png))
        .await
        .unwrap();
    client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png))
        .await
        .unwrap();
    assert_eq!(fake.file_calls.load(Ordering::SeqCst), 1);

    client
        .fetch_images(FetchOptions::new("X", ImageFormat::Png).with_cache(false))
        .await
        .unwrap();
    assert_eq!(fake.file_calls.load(Ordering::SeqCst), 2);
}

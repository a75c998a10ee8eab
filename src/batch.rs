//! Batched render requests.
//!
//! The render endpoint accepts a bounded number of ids per call. Ids are
//! split into evenly sized batches, all batches are requested at once and the
//! answers are merged back into one URL per id.

use crate::client::{FileProvider, RenderParams};
use crate::error::{Error, Result};
use crate::event::{emit, EventSink, FetchEvent, FetchStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Largest number of ids the provider renders in one request.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Batch size that spreads `count` ids evenly over the fewest batches.
///
/// `count / ceil(count / MAX_BATCH_SIZE)`, rounded up so the split never
/// produces a trailing sliver batch.
pub fn chunk_size(count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let batches = count.div_ceil(MAX_BATCH_SIZE);
    count.div_ceil(batches)
}

/// Split `ids` into render batches.
pub fn batches(ids: &[String]) -> Vec<&[String]> {
    match chunk_size(ids.len()) {
        0 => Vec::new(),
        size => ids.chunks(size).collect(),
    }
}

/// Resolve render URLs for `ids`, one request per batch, all concurrently.
///
/// Returns one URL per id, in the order of `ids`. Every requested id must
/// come back with a URL.
pub async fn request_sources(
    provider: Arc<dyn FileProvider>,
    file_id: &str,
    page_name: &str,
    ids: &[String],
    params: &RenderParams,
    sink: Option<&EventSink>,
) -> Result<Vec<String>> {
    emit(
        sink,
        FetchEvent::Sources {
            page_name: page_name.to_string(),
            status: FetchStatus::Fetching,
        },
    );

    let mut tasks = JoinSet::new();
    for batch in batches(ids) {
        let provider = provider.clone();
        let file_id = file_id.to_string();
        let batch = batch.to_vec();
        let params = params.clone();
        tasks.spawn(async move { provider.file_images(&file_id, &batch, &params).await });
    }
    log::debug!(
        "Requested {} render batches for page '{}'",
        tasks.len(),
        page_name
    );

    let mut sources: HashMap<String, Option<String>> = HashMap::with_capacity(ids.len());
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(Error::from).and_then(|batch| batch) {
            Ok(batch) => sources.extend(batch),
            Err(err) => {
                emit(
                    sink,
                    FetchEvent::Sources {
                        page_name: page_name.to_string(),
                        status: FetchStatus::Error,
                    },
                );
                return Err(err);
            }
        }
    }

    let urls = ids
        .iter()
        .map(|id| {
            sources
                .remove(id)
                .flatten()
                .ok_or_else(|| Error::MissingSource { id: id.clone() })
        })
        .collect::<Result<Vec<_>>>()?;

    emit(
        sink,
        FetchEvent::Sources {
            page_name: page_name.to_string(),
            status: FetchStatus::Fetched,
        },
    );
    Ok(urls)
}

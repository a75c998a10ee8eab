//! Progress and error notifications emitted while fetching images.
//!
//! Events are delivered synchronously to an [`EventSink`]. The pipeline never
//! inspects what the sink does with them.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Stage of a fetch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Requests are in flight
    Fetching,
    /// All requests completed
    Fetched,
    /// A request failed
    Error,
}

/// Events emitted by the pipeline, one page at a time.
///
/// Serialized as `{type, pageName, status, ...}`; `image` events always carry
/// `status: "error"`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// Render URLs for a page.
    Sources {
        /// Page name
        page_name: String,
        /// Stage
        status: FetchStatus,
    },

    /// Rendered bytes for a page.
    Images {
        /// Page name
        page_name: String,
        /// Stage
        status: FetchStatus,
    },

    /// A single download attempt failed and will be retried.
    Image {
        /// Page name
        page_name: String,
        /// Asset URL
        url: String,
        /// Attempts left after this one
        retries_left: u32,
        /// Failure description
        error: String,
    },
}

impl FetchEvent {
    /// Page the event belongs to.
    pub fn page_name(&self) -> &str {
        match self {
            FetchEvent::Sources { page_name, .. }
            | FetchEvent::Images { page_name, .. }
            | FetchEvent::Image { page_name, .. } => page_name,
        }
    }

    /// Stage of the event. Per-image events are always errors.
    pub fn status(&self) -> FetchStatus {
        match self {
            FetchEvent::Sources { status, .. } | FetchEvent::Images { status, .. } => *status,
            FetchEvent::Image { .. } => FetchStatus::Error,
        }
    }

    /// Check if this event reports a failure.
    pub fn is_error(&self) -> bool {
        self.status() == FetchStatus::Error
    }

    /// Event kind as serialized in `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchEvent::Sources { .. } => "sources",
            FetchEvent::Images { .. } => "images",
            FetchEvent::Image { .. } => "image",
        }
    }
}

impl Serialize for FetchEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = match self {
            FetchEvent::Image { .. } => 6,
            _ => 3,
        };
        let mut state = serializer.serialize_struct("FetchEvent", len)?;
        state.serialize_field("type", self.kind())?;
        state.serialize_field("pageName", self.page_name())?;
        state.serialize_field("status", &self.status())?;
        if let FetchEvent::Image {
            url,
            retries_left,
            error,
            ..
        } = self
        {
            state.serialize_field("url", url)?;
            state.serialize_field("retriesLeft", retries_left)?;
            state.serialize_field("error", error)?;
        }
        state.end()
    }
}

impl fmt::Display for FetchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchEvent::Sources { page_name, status } => {
                write!(f, "[{}] sources {:?}", page_name, status)
            }
            FetchEvent::Images { page_name, status } => {
                write!(f, "[{}] images {:?}", page_name, status)
            }
            FetchEvent::Image {
                page_name,
                url,
                retries_left,
                error,
            } => write!(
                f,
                "[{}] image {} failed ({} retries left): {}",
                page_name, url, retries_left, error
            ),
        }
    }
}

/// Receives pipeline events.
pub type EventSink = Arc<dyn Fn(&FetchEvent) + Send + Sync>;

/// Deliver `event` to the sink if one is set.
pub(crate) fn emit(sink: Option<&EventSink>, event: FetchEvent) {
    log::debug!("{}", event);
    if let Some(sink) = sink {
        sink(&event);
    }
}

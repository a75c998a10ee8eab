//! Component and image records produced by the pipeline.

use serde::{Deserialize, Serialize};

/// A named, uniquely identified design element eligible for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Provider-assigned id, unique within the file
    pub id: String,

    /// Component name
    pub name: String,

    /// Author-provided description
    pub description: String,

    /// Page the component lives on
    pub page_name: String,

    /// Nearest enclosing frame
    pub frame_name: Option<String>,

    /// Nearest enclosing group
    pub group_name: Option<String>,

    /// Direct parent node (only resolved on request)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,

    /// Width in design units
    pub width: f64,

    /// Height in design units
    pub height: f64,
}

impl Component {
    /// Create a component on a page with no ancestry.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        page_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            page_name: page_name.into(),
            frame_name: None,
            group_name: None,
            parent_name: None,
            width: 0.0,
            height: 0.0,
        }
    }
}

/// A component together with its rendered bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Component metadata
    #[serde(flatten)]
    pub component: Component,

    /// Rendered asset in the requested format
    #[serde(skip_serializing)]
    #[serde(default)]
    pub buffer: Vec<u8>,
}

impl Image {
    /// Create an image record.
    pub fn new(component: Component, buffer: Vec<u8>) -> Self {
        Self { component, buffer }
    }

    /// Component id.
    pub fn id(&self) -> &str {
        &self.component.id
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.component.name
    }

    /// Page the component lives on.
    pub fn page_name(&self) -> &str {
        &self.component.page_name
    }

    /// Size of the rendered asset in bytes.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Rendered bytes as text, for vector formats.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.buffer).ok()
    }
}

//! Wire types for the design-file document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A file as returned by the provider's file endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDocument {
    /// File name
    #[serde(default)]
    pub name: String,

    /// Last modification time
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,

    /// Provider version string
    #[serde(default)]
    pub version: Option<String>,

    /// Root node; its children are the pages
    pub document: Node,

    /// Component metadata keyed by node id
    #[serde(default)]
    pub components: HashMap<String, ComponentMeta>,

    /// Shared style metadata keyed by style id
    #[serde(default)]
    pub styles: HashMap<String, StyleMeta>,
}

impl FileDocument {
    /// Create a file wrapping the given root node.
    pub fn new(document: Node) -> Self {
        Self {
            name: String::new(),
            last_modified: None,
            version: None,
            document,
            components: HashMap::new(),
            styles: HashMap::new(),
        }
    }

    /// Pages of the file in document order.
    pub fn pages(&self) -> impl Iterator<Item = &Node> {
        self.document
            .children
            .iter()
            .filter(|node| node.node_type == NodeType::Canvas)
    }

    /// A marker that changes whenever the file is edited.
    ///
    /// Uses `lastModified` and falls back to `version`.
    pub fn revision(&self) -> Option<String> {
        self.last_modified
            .map(|time| time.to_rfc3339())
            .or_else(|| self.version.clone())
    }

    /// Register component metadata.
    pub fn with_component(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.components.insert(
            id.into(),
            ComponentMeta {
                key: String::new(),
                name: name.into(),
                description: description.into(),
            },
        );
        self
    }

    /// Register a shared style.
    pub fn with_style(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        style_type: StyleType,
    ) -> Self {
        self.styles.insert(
            id.into(),
            StyleMeta {
                key: String::new(),
                name: name.into(),
                description: String::new(),
                style_type,
            },
        );
        self
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Provider-assigned id, unique within the file
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Node type
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Child nodes in paint order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,

    /// Shared style references, keyed by kind (`fill`, `fills`, `text`, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub styles: HashMap<String, String>,

    /// Fill paints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fills: Option<Value>,

    /// Text style (TEXT nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,

    /// Bounding box in absolute coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_bounding_box: Option<Rect>,
}

impl Node {
    /// Create a node without children.
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            children: Vec::new(),
            styles: HashMap::new(),
            fills: None,
            style: None,
            absolute_bounding_box: None,
        }
    }

    /// Add children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set bounding box size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.absolute_bounding_box = Some(Rect {
            x: 0.0,
            y: 0.0,
            width,
            height,
        });
        self
    }

    /// Attach a shared style reference.
    pub fn with_style_ref(mut self, kind: impl Into<String>, style_id: impl Into<String>) -> Self {
        self.styles.insert(kind.into(), style_id.into());
        self
    }
}

/// Node types the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// File root
    Document,
    /// A page
    Canvas,
    /// A frame
    Frame,
    /// A group
    Group,
    /// A component definition
    Component,
    /// A set of component variants
    ComponentSet,
    /// An instance of a component
    Instance,
    /// Text layer
    Text,
    /// Rectangle
    Rectangle,
    /// Vector path
    Vector,
    /// Anything else
    #[serde(other)]
    Other,
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    #[serde(default)]
    pub x: f64,
    /// Top edge
    #[serde(default)]
    pub y: f64,
    /// Width
    #[serde(default)]
    pub width: f64,
    /// Height
    #[serde(default)]
    pub height: f64,
}

/// Component metadata from the file's `components` map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentMeta {
    /// Library key
    #[serde(default)]
    pub key: String,
    /// Component name
    #[serde(default)]
    pub name: String,
    /// Author-provided description
    #[serde(default)]
    pub description: String,
}

/// Shared style metadata from the file's `styles` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleMeta {
    /// Library key
    #[serde(default)]
    pub key: String,
    /// Style name
    #[serde(default)]
    pub name: String,
    /// Author-provided description
    #[serde(default)]
    pub description: String,
    /// Kind of style
    pub style_type: StyleType,
}

/// Kinds of shared style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StyleType {
    /// Color fill
    Fill,
    /// Typography
    Text,
    /// Shadows and blurs
    Effect,
    /// Layout grids
    Grid,
    /// Anything else
    #[serde(other)]
    Other,
}

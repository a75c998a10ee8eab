//! Resolved shared styles.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Color and text styles of a file, keyed by style name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Styles {
    /// FILL styles
    pub color_styles: BTreeMap<String, StyleEntry>,

    /// TEXT styles
    pub text_styles: BTreeMap<String, StyleEntry>,
}

impl Styles {
    /// Check if no styles were found.
    pub fn is_empty(&self) -> bool {
        self.color_styles.is_empty() && self.text_styles.is_empty()
    }
}

/// A single style with the value taken from a node that uses it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleEntry {
    /// Author-provided description
    pub description: String,

    /// Fills (color styles) or type style (text styles); `None` when no node uses it
    pub value: Option<Value>,
}

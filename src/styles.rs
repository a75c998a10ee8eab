//! Shared style extraction.
//!
//! The file's `styles` map only carries names and descriptions. The actual
//! paint or type values are read from the first node that uses each style.

use crate::model::{FileDocument, NodeType, StyleEntry, StyleType, Styles};
use crate::tree::FileTree;

/// Resolve FILL and TEXT styles of `file` to example values.
pub fn extract_styles(file: &FileDocument) -> Styles {
    let tree = FileTree::build(file);
    let mut styles = Styles::default();

    for (id, meta) in &file.styles {
        match meta.style_type {
            StyleType::Fill => {
                let value = tree
                    .nodes()
                    .map(|flat| flat.node)
                    .find(|node| {
                        node.styles
                            .get("fills")
                            .or_else(|| node.styles.get("fill"))
                            .is_some_and(|style| style == id)
                    })
                    .and_then(|node| node.fills.clone());
                styles.color_styles.insert(
                    meta.name.clone(),
                    StyleEntry {
                        description: meta.description.clone(),
                        value,
                    },
                );
            }
            StyleType::Text => {
                let value = tree
                    .nodes()
                    .map(|flat| flat.node)
                    .filter(|node| node.node_type == NodeType::Text)
                    .find(|node| node.styles.get("text").is_some_and(|style| style == id))
                    .and_then(|node| node.style.clone());
                styles.text_styles.insert(
                    meta.name.clone(),
                    StyleEntry {
                        description: meta.description.clone(),
                        value,
                    },
                );
            }
            _ => {}
        }
    }

    for (name, entry) in styles.color_styles.iter().chain(&styles.text_styles) {
        if entry.value.is_none() {
            log::debug!("Style '{}' is not used by any node", name);
        }
    }

    styles
}

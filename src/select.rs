//! Page and component selection.

use crate::model::Component;
use crate::tree::PageTree;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Which components of a page to export.
#[derive(Clone, Default)]
pub enum ComponentFilter {
    /// Keep every component
    #[default]
    All,
    /// Keep components whose name is in the list
    Names(Vec<String>),
    /// Keep components the predicate accepts
    Predicate(Arc<dyn Fn(&Component) -> bool + Send + Sync>),
}

impl ComponentFilter {
    /// Filter by component names.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ComponentFilter::Names(names.into_iter().map(Into::into).collect())
    }

    /// Filter with a predicate.
    pub fn predicate(f: impl Fn(&Component) -> bool + Send + Sync + 'static) -> Self {
        ComponentFilter::Predicate(Arc::new(f))
    }

    /// Check whether `component` passes the filter.
    pub fn accepts(&self, component: &Component) -> bool {
        match self {
            ComponentFilter::All => true,
            ComponentFilter::Names(names) => names.iter().any(|name| *name == component.name),
            ComponentFilter::Predicate(f) => f(component),
        }
    }
}

impl fmt::Debug for ComponentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentFilter::All => write!(f, "All"),
            ComponentFilter::Names(names) => f.debug_tuple("Names").field(names).finish(),
            ComponentFilter::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

/// Pages worth processing: non-empty, and on the allow-list when one is given.
pub fn select_pages<'p>(pages: &'p [PageTree], allow: Option<&[String]>) -> Vec<&'p PageTree> {
    if let Some(allow) = allow {
        for name in allow {
            if !pages.iter().any(|page| page.name() == name && !page.is_empty()) {
                log::debug!("Page '{}' has no components to export", name);
            }
        }
    }

    pages
        .iter()
        .filter(|page| {
            if page.is_empty() {
                log::debug!("Skipping page '{}': no components", page.name());
                return false;
            }
            allow.map_or(true, |allow| allow.iter().any(|name| name == page.name()))
        })
        .collect()
}

/// Apply `filter`, keeping first-seen order and dropping repeated ids.
pub fn select_components(components: Vec<Component>, filter: &ComponentFilter) -> Vec<Component> {
    let mut seen = HashSet::new();
    components
        .into_iter()
        .filter(|component| filter.accepts(component))
        .filter(|component| seen.insert(component.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileDocument, Node, NodeType};
    use crate::tree::FileTree;

    fn components(names: &[&str]) -> Vec<Component> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Component::new(format!("1:{i}"), *name, "Page"))
            .collect()
    }

    fn names(components: &[Component]) -> Vec<&str> {
        components.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_filter_by_names() {
        let selected =
            select_components(components(&["A", "B", "C"]), &ComponentFilter::names(["B"]));
        assert_eq!(names(&selected), vec!["B"]);
    }

    #[test]
    fn test_filter_preserves_order() {
        let selected = select_components(
            components(&["A", "B", "C", "D"]),
            &ComponentFilter::names(["D", "B"]),
        );
        assert_eq!(names(&selected), vec!["B", "D"]);
    }

    #[test]
    fn test_filter_predicate() {
        let filter = ComponentFilter::predicate(|c| c.name.starts_with("icon"));
        let selected = select_components(components(&["icon-a", "logo", "icon-b"]), &filter);
        assert_eq!(names(&selected), vec!["icon-a", "icon-b"]);
    }

    #[test]
    fn test_filter_absent_keeps_all() {
        let selected = select_components(components(&["A", "B"]), &ComponentFilter::default());
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_duplicate_ids_dropped() {
        let mut input = components(&["A", "B"]);
        input.push(input[0].clone());
        let selected = select_components(input, &ComponentFilter::All);
        assert_eq!(names(&selected), vec!["A", "B"]);
    }

    #[test]
    fn test_select_pages() {
        let document = Node::new("0:0", "Document", NodeType::Document).with_children([
            Node::new("0:1", "Filled", NodeType::Canvas)
                .with_children([Node::new("1:1", "A", NodeType::Component)]),
            Node::new("0:2", "Outlined", NodeType::Canvas)
                .with_children([Node::new("2:1", "B", NodeType::Component)]),
            Node::new("0:3", "Empty", NodeType::Canvas),
        ]);
        let file = FileDocument::new(document);
        let tree = FileTree::build(&file);

        let all = select_pages(tree.pages(), None);
        assert_eq!(all.iter().map(|p| p.name()).collect::<Vec<_>>(), vec!["Filled", "Outlined"]);

        let allow = vec!["Outlined".to_string(), "Empty".to_string(), "Missing".to_string()];
        let some = select_pages(tree.pages(), Some(&allow));
        assert_eq!(some.iter().map(|p| p.name()).collect::<Vec<_>>(), vec!["Outlined"]);
    }
}

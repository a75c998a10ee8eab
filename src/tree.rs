//! File tree normalization.
//!
//! Flattens a [`FileDocument`] into an arena of nodes, one entry per node,
//! each pointing at its parent by index. Per page the tree keeps the
//! component nodes plus every frame and group together with the set of
//! components for which it is the nearest enclosing container, so ancestry
//! questions never walk the raw tree.
//!
//! # Example
//!
//! ```
//! use figsync::model::{FileDocument, Node, NodeType};
//! use figsync::tree::FileTree;
//!
//! let page = Node::new("0:1", "Icons", NodeType::Canvas).with_children([
//!     Node::new("1:1", "Header", NodeType::Frame)
//!         .with_children([Node::new("1:2", "Logo", NodeType::Component)]),
//! ]);
//! let file = FileDocument::new(
//!     Node::new("0:0", "Document", NodeType::Document).with_children([page]),
//! );
//!
//! let tree = FileTree::build(&file);
//! let components = tree.components(&tree.pages()[0], false);
//! assert_eq!(components[0].frame_name.as_deref(), Some("Header"));
//! ```

use crate::model::{Component, FileDocument, Node, NodeType};
use std::collections::{HashMap, HashSet};

/// A node in the arena.
#[derive(Debug, Clone, Copy)]
pub struct FlatNode<'a> {
    /// The raw node
    pub node: &'a Node,

    /// Arena index of the parent; `None` for pages
    pub parent: Option<usize>,

    /// Position of the owning page in [`FileTree::pages`]
    pub page: usize,
}

/// A frame or group and the components beneath it.
#[derive(Debug, Clone)]
struct Container {
    node: usize,
    members: HashSet<usize>,
}

/// One page of the normalized tree.
#[derive(Debug, Clone)]
pub struct PageTree {
    node: usize,
    name: String,
    components: Vec<usize>,
    frames: Vec<Container>,
    groups: Vec<Container>,
}

impl PageTree {
    /// Page name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of component nodes on the page.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Check if the page has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Normalized view of a file's pages, components and containers.
#[derive(Debug, Clone)]
pub struct FileTree<'a> {
    file: &'a FileDocument,
    nodes: Vec<FlatNode<'a>>,
    pages: Vec<PageTree>,
}

impl<'a> FileTree<'a> {
    /// Flatten the file. Traversal is pre-order and uses an explicit stack.
    pub fn build(file: &'a FileDocument) -> Self {
        let mut nodes: Vec<FlatNode<'a>> = Vec::new();
        let mut pages = Vec::new();

        for page_node in file.pages() {
            let page = pages.len();
            let page_index = nodes.len();
            nodes.push(FlatNode {
                node: page_node,
                parent: None,
                page,
            });

            let mut tree = PageTree {
                node: page_index,
                name: page_node.name.clone(),
                components: Vec::new(),
                frames: Vec::new(),
                groups: Vec::new(),
            };

            let mut stack: Vec<(&'a Node, usize)> = page_node
                .children
                .iter()
                .rev()
                .map(|child| (child, page_index))
                .collect();

            while let Some((node, parent)) = stack.pop() {
                let index = nodes.len();
                nodes.push(FlatNode {
                    node,
                    parent: Some(parent),
                    page,
                });

                match node.node_type {
                    NodeType::Component => tree.components.push(index),
                    NodeType::Frame => tree.frames.push(Container::new(index)),
                    NodeType::Group => tree.groups.push(Container::new(index)),
                    _ => {}
                }

                stack.extend(node.children.iter().rev().map(|child| (child, index)));
            }

            assign_members(&nodes, &mut tree);
            pages.push(tree);
        }

        log::debug!(
            "Normalized file '{}': {} pages, {} nodes",
            file.name,
            pages.len(),
            nodes.len()
        );

        Self { file, nodes, pages }
    }

    /// Pages in document order, including pages without components.
    pub fn pages(&self) -> &[PageTree] {
        &self.pages
    }

    /// Find a page by name.
    pub fn page(&self, name: &str) -> Option<&PageTree> {
        self.pages.iter().find(|page| page.name == name)
    }

    /// All nodes in pre-order, page by page.
    pub fn nodes(&self) -> impl Iterator<Item = &FlatNode<'a>> {
        self.nodes.iter()
    }

    /// Name of the nearest frame enclosing `component`.
    pub fn frame_name(&self, page: &PageTree, component: usize) -> Option<&'a str> {
        self.container_name(&page.frames, component)
    }

    /// Name of the nearest group enclosing `component`.
    pub fn group_name(&self, page: &PageTree, component: usize) -> Option<&'a str> {
        self.container_name(&page.groups, component)
    }

    /// Name of the node directly above `node`; `None` when that is the page.
    pub fn parent_name(&self, node: usize) -> Option<&'a str> {
        let parent = self.nodes.get(node)?.parent?;
        let parent = &self.nodes[parent];
        parent.parent.map(|_| parent.node.name.as_str())
    }

    /// Component records for `page` in first-seen order.
    ///
    /// Resolving `parent_name` is skipped unless `include_parent_name` is set.
    pub fn components(&self, page: &PageTree, include_parent_name: bool) -> Vec<Component> {
        page.components
            .iter()
            .map(|&index| {
                let node = self.nodes[index].node;
                let bounds = node.absolute_bounding_box.unwrap_or_default();
                Component {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    description: self
                        .file
                        .components
                        .get(&node.id)
                        .map(|meta| meta.description.clone())
                        .unwrap_or_default(),
                    page_name: page.name.clone(),
                    frame_name: self.frame_name(page, index).map(str::to_string),
                    group_name: self.group_name(page, index).map(str::to_string),
                    parent_name: if include_parent_name {
                        self.parent_name(index).map(str::to_string)
                    } else {
                        None
                    },
                    width: bounds.width,
                    height: bounds.height,
                }
            })
            .collect()
    }

    fn container_name(&self, containers: &[Container], component: usize) -> Option<&'a str> {
        containers
            .iter()
            .find(|container| container.members.contains(&component))
            .map(|container| self.nodes[container.node].node.name.as_str())
    }
}

impl Container {
    fn new(node: usize) -> Self {
        Self {
            node,
            members: HashSet::new(),
        }
    }
}

/// Record each component in its nearest enclosing frame and nearest enclosing group.
fn assign_members(nodes: &[FlatNode<'_>], tree: &mut PageTree) {
    let frames: HashMap<usize, usize> = tree
        .frames
        .iter()
        .enumerate()
        .map(|(position, container)| (container.node, position))
        .collect();
    let groups: HashMap<usize, usize> = tree
        .groups
        .iter()
        .enumerate()
        .map(|(position, container)| (container.node, position))
        .collect();

    for &component in &tree.components {
        let mut frame = None;
        let mut group = None;
        let mut cursor = nodes[component].parent;
        while let Some(ancestor) = cursor {
            if ancestor == tree.node || (frame.is_some() && group.is_some()) {
                break;
            }
            if frame.is_none() {
                frame = frames.get(&ancestor).copied();
            }
            if group.is_none() {
                group = groups.get(&ancestor).copied();
            }
            cursor = nodes[ancestor].parent;
        }

        if let Some(position) = frame {
            tree.frames[position].members.insert(component);
        }
        if let Some(position) = group {
            tree.groups[position].members.insert(component);
        }
    }
}

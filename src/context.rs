//! Document contexts
//!
//! A context is a handle onto part of a fetched page. Markup contexts point
//! at elements of one parsed document and expand into one node per element.
//! Structured contexts hold a JSON value and never expand.

use std::collections::HashSet;
use std::rc::Rc;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    Markup(Markup),
    Structured(Value),
}

impl Context {
    /// Markup context covering a whole document
    pub fn document(source: &str) -> Self {
        Context::Markup(Markup::document(source))
    }

    /// Markup context over the top-level elements of an HTML snippet
    pub fn fragment(source: &str) -> Self {
        Context::Markup(Markup::fragment(source))
    }

    /// Whether the context has any content
    pub fn matches(&self) -> bool {
        match self {
            Context::Markup(markup) => !markup.is_empty(),
            Context::Structured(value) => !value.is_null(),
        }
    }

    /// Expand into the nodes field and URL rules are applied to.
    ///
    /// Markup yields one node per element in document order. Structured
    /// content is a single atomic node.
    pub fn nodes(&self) -> Vec<Context> {
        match self {
            Context::Markup(markup) => markup.split().into_iter().map(Context::Markup).collect(),
            Context::Structured(_) => vec![self.clone()],
        }
    }

    /// Value stored in an output record when an expression yields a context
    pub fn to_value(&self) -> Value {
        match self {
            Context::Markup(markup) => {
                let mut html = markup.outer_html();
                if html.len() == 1 {
                    Value::String(html.swap_remove(0))
                } else {
                    Value::Array(html.into_iter().map(Value::String).collect())
                }
            }
            Context::Structured(value) => value.clone(),
        }
    }
}

/// Elements of a parsed document, in document order.
///
/// Every selection made from a markup context shares the document it came
/// from, so nested selections see the element with its real ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct Markup {
    document: Rc<Html>,
    nodes: Vec<NodeId>,
}

impl Markup {
    /// Whole page, rooted at its `<html>` element
    pub fn document(source: &str) -> Self {
        let document = Html::parse_document(source);
        let nodes = vec![document.root_element().id()];
        Self {
            document: Rc::new(document),
            nodes,
        }
    }

    /// Snippet parsed in body context, one node per top-level element
    pub fn fragment(source: &str) -> Self {
        let document = Html::parse_fragment(source);
        let nodes = document
            .root_element()
            .child_elements()
            .map(|el| el.id())
            .collect();
        Self {
            document: Rc::new(document),
            nodes,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> + '_ {
        self.nodes
            .iter()
            .filter_map(|&id| self.document.tree.get(id).and_then(ElementRef::wrap))
    }

    /// Elements matching `selector` at or beneath each node.
    ///
    /// An element reachable from several nodes is kept once.
    pub fn select(&self, selector: &Selector) -> Markup {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for element in self.elements() {
            let own = Some(element).filter(|el| selector.matches(el));
            for matched in own.into_iter().chain(element.select(selector)) {
                if seen.insert(matched.id()) {
                    nodes.push(matched.id());
                }
            }
        }
        self.with_nodes(nodes)
    }

    /// Node at `index`, empty when out of range
    pub fn nth(&self, index: usize) -> Markup {
        self.with_nodes(self.nodes.get(index).copied().into_iter().collect())
    }

    /// One single-element markup per node
    pub fn split(&self) -> Vec<Markup> {
        self.nodes.iter().map(|&id| self.with_nodes(vec![id])).collect()
    }

    pub fn outer_html(&self) -> Vec<String> {
        self.elements().map(|el| el.html()).collect()
    }

    fn with_nodes(&self, nodes: Vec<NodeId>) -> Markup {
        Markup {
            document: Rc::clone(&self.document),
            nodes,
        }
    }
}

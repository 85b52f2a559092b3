//! A small, read-only, namespace-agnostic DOM tree.
//!
//! `quick-xml` only streams events; a stack of currently-open elements folds that
//! stream into this arena-indexed tree rather than committing straight to domain
//! types. Later stages of this renderer need arbitrary descendant search
//! (`.//bpmn:BPMNShape` wherever it sits, associations anywhere under `definitions`,
//! the first `*EventDefinition` child of an event) that a single flat fold into
//! domain objects cannot answer. Element lookup by tag ignores any namespace
//! prefix, so `bpmndi:BPMNPlane` and a bare `BPMNPlane` resolve the same way.
pub mod reader;

use std::collections::HashMap;

pub type ElementRef = usize;

#[derive(Debug, Clone)]
pub struct Element {
    pub local_name: String,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub parent: Option<ElementRef>,
    pub children: Vec<ElementRef>,
}

impl Element {
    fn new(local_name: String, parent: Option<ElementRef>) -> Self {
        Self {
            local_name,
            attrs: HashMap::new(),
            text: String::new(),
            parent,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Dom {
    elements: Vec<Element>,
}

impl Dom {
    pub(crate) fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// The first element parsed (the `definitions` root), if any.
    pub fn root(&self) -> Option<ElementRef> {
        if self.elements.is_empty() { None } else { Some(0) }
    }

    pub fn get(&self, idx: ElementRef) -> &Element {
        &self.elements[idx]
    }

    pub fn attr<'a>(&'a self, idx: ElementRef, name: &str) -> Option<&'a str> {
        self.elements[idx].attrs.get(name).map(String::as_str)
    }

    /// Direct children, in document order.
    pub fn children(&self, idx: ElementRef) -> impl Iterator<Item = ElementRef> + '_ {
        self.elements[idx].children.iter().copied()
    }

    /// Direct children whose local name matches, in document order.
    pub fn child_elements<'a>(
        &'a self,
        idx: ElementRef,
        local_name: &'a str,
    ) -> impl Iterator<Item = ElementRef> + 'a {
        self.children(idx)
            .filter(move |&c| self.elements[c].local_name == local_name)
    }

    /// All descendants (not including `idx` itself), pre-order.
    pub fn descendants(&self, idx: ElementRef) -> Vec<ElementRef> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementRef> = self.elements[idx].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            for &child in self.elements[next].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Descendants matching a local name, pre-order.
    pub fn descendants_named<'a>(
        &'a self,
        idx: ElementRef,
        local_name: &'a str,
    ) -> impl Iterator<Item = ElementRef> + 'a {
        self.descendants(idx)
            .into_iter()
            .filter(move |&c| self.elements[c].local_name == local_name)
    }

    /// Trimmed text content of the first matching child, if any.
    pub fn child_text(&self, idx: ElementRef, local_name: &str) -> Option<String> {
        self.child_elements(idx, local_name)
            .next()
            .map(|c| self.elements[c].text.trim().to_string())
    }
}

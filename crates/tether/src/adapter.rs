//! The element primitives the core needs from its host, plus a headless in-memory host.

use crate::ids::ElementRef;
use crate::viewport::{Offset, Size};
use indexmap::IndexMap;
use std::cell::Cell;

/// Host element primitives: identity, attributes, classes, measurement and tree structure.
///
/// Measurement (`size`/`offset`) is assumed synchronous and comparatively expensive; the core
/// avoids calling it twice for the same element within one redraw pass.
pub trait ElementAdapter {
    fn element_by_id(&self, id: &str) -> Option<ElementRef>;

    fn get_attribute(&self, el: ElementRef, name: &str) -> Option<String>;
    fn set_attribute(&mut self, el: ElementRef, name: &str, value: &str);
    fn remove_attribute(&mut self, el: ElementRef, name: &str);

    fn add_class(&mut self, el: ElementRef, class: &str);
    fn remove_class(&mut self, el: ElementRef, class: &str);
    fn has_class(&self, el: ElementRef, class: &str) -> bool;
    fn get_class(&self, el: ElementRef) -> String;

    fn toggle_class(&mut self, el: ElementRef, class: &str) {
        if self.has_class(el, class) {
            self.remove_class(el, class);
        } else {
            self.add_class(el, class);
        }
    }

    fn size(&self, el: ElementRef) -> Size;
    fn offset(&self, el: ElementRef) -> Offset;

    /// Elements carrying the attribute named by an `[attr]` selector.
    fn select(&self, selector: &str) -> Vec<ElementRef>;

    /// Nested elements, visited when endpoints are removed recursively.
    fn children(&self, el: ElementRef) -> Vec<ElementRef>;

    /// Elements that must be redrawn whenever `el` is (e.g. the members of a group).
    fn associated_elements(&self, el: ElementRef) -> Vec<ElementRef>;

    fn remove_element(&mut self, el: ElementRef);
    fn append_element(&mut self, el: ElementRef, parent: ElementRef);
}

#[derive(Debug, Clone, Default)]
struct MemoryElement {
    attributes: IndexMap<String, String>,
    classes: Vec<String>,
    offset: Offset,
    size: Size,
    parent: Option<ElementRef>,
    children: Vec<ElementRef>,
    associated: Vec<ElementRef>,
}

/// A headless element store.
///
/// Useful for tests and for hosts that compute their own layout and only need the connectivity
/// bookkeeping. Counts measurements so callers can observe offset memoization.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    elements: IndexMap<ElementRef, MemoryElement>,
    next: u64,
    measurements: Cell<usize>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an element, optionally with an `id` attribute.
    pub fn create(&mut self, id: Option<&str>) -> ElementRef {
        self.next += 1;
        let el = ElementRef::new(self.next);
        let mut record = MemoryElement::default();
        if let Some(id) = id {
            record.attributes.insert("id".to_string(), id.to_string());
        }
        self.elements.insert(el, record);
        el
    }

    pub fn create_with_geometry(&mut self, id: &str, offset: Offset, size: Size) -> ElementRef {
        let el = self.create(Some(id));
        self.set_geometry(el, offset, size);
        el
    }

    pub fn set_geometry(&mut self, el: ElementRef, offset: Offset, size: Size) {
        if let Some(record) = self.elements.get_mut(&el) {
            record.offset = offset;
            record.size = size;
        }
    }

    pub fn append_child(&mut self, parent: ElementRef, child: ElementRef) {
        self.append_element(child, parent);
    }

    pub fn set_associated(&mut self, el: ElementRef, associated: Vec<ElementRef>) {
        if let Some(record) = self.elements.get_mut(&el) {
            record.associated = associated;
        }
    }

    pub fn contains(&self, el: ElementRef) -> bool {
        self.elements.contains_key(&el)
    }

    pub fn parent(&self, el: ElementRef) -> Option<ElementRef> {
        self.elements.get(&el).and_then(|r| r.parent)
    }

    /// Number of `size` + `offset` pairs served so far.
    pub fn measurements(&self) -> usize {
        self.measurements.get()
    }
}

impl ElementAdapter for MemoryAdapter {
    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        self.elements
            .iter()
            .find(|(_, r)| r.attributes.get("id").is_some_and(|v| v == id))
            .map(|(el, _)| *el)
    }

    fn get_attribute(&self, el: ElementRef, name: &str) -> Option<String> {
        self.elements.get(&el)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, el: ElementRef, name: &str, value: &str) {
        if let Some(record) = self.elements.get_mut(&el) {
            record
                .attributes
                .insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, el: ElementRef, name: &str) {
        if let Some(record) = self.elements.get_mut(&el) {
            record.attributes.shift_remove(name);
        }
    }

    fn add_class(&mut self, el: ElementRef, class: &str) {
        let Some(record) = self.elements.get_mut(&el) else {
            return;
        };
        if !record.classes.iter().any(|c| c == class) {
            record.classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, el: ElementRef, class: &str) {
        if let Some(record) = self.elements.get_mut(&el) {
            record.classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, el: ElementRef, class: &str) -> bool {
        self.elements
            .get(&el)
            .is_some_and(|r| r.classes.iter().any(|c| c == class))
    }

    fn get_class(&self, el: ElementRef) -> String {
        self.elements
            .get(&el)
            .map(|r| r.classes.join(" "))
            .unwrap_or_default()
    }

    fn size(&self, el: ElementRef) -> Size {
        self.measurements.set(self.measurements.get() + 1);
        self.elements.get(&el).map(|r| r.size).unwrap_or_default()
    }

    fn offset(&self, el: ElementRef) -> Offset {
        self.elements.get(&el).map(|r| r.offset).unwrap_or_default()
    }

    fn select(&self, selector: &str) -> Vec<ElementRef> {
        let Some(attr) = selector
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
        else {
            return Vec::new();
        };
        self.elements
            .iter()
            .filter(|(_, r)| r.attributes.contains_key(attr))
            .map(|(el, _)| *el)
            .collect()
    }

    fn children(&self, el: ElementRef) -> Vec<ElementRef> {
        self.elements
            .get(&el)
            .map(|r| r.children.clone())
            .unwrap_or_default()
    }

    fn associated_elements(&self, el: ElementRef) -> Vec<ElementRef> {
        self.elements
            .get(&el)
            .map(|r| r.associated.clone())
            .unwrap_or_default()
    }

    fn remove_element(&mut self, el: ElementRef) {
        let Some(record) = self.elements.shift_remove(&el) else {
            return;
        };
        if let Some(parent) = record.parent.and_then(|p| self.elements.get_mut(&p)) {
            parent.children.retain(|c| *c != el);
        }
        for child in record.children {
            self.remove_element(child);
        }
    }

    fn append_element(&mut self, el: ElementRef, parent: ElementRef) {
        if !self.elements.contains_key(&parent) {
            return;
        }
        let previous = match self.elements.get_mut(&el) {
            Some(record) => record.parent.replace(parent),
            None => return,
        };
        if let Some(prev) = previous.and_then(|p| self.elements.get_mut(&p)) {
            prev.children.retain(|c| *c != el);
        }
        if let Some(p) = self.elements.get_mut(&parent) {
            p.children.push(el);
        }
    }
}

//! Offset cache: last-known position and size per element, tagged with the redraw pass that
//! produced it.

use crate::ids::{ElementId, Timestamp};
use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Offset {
    pub left: f64,
    pub top: f64,
}

impl Offset {
    pub const fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

/// Cached geometry of one element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportElement {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub rotation: f64,
}

impl ViewportElement {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    geometry: ViewportElement,
    // Placeholders registered while drawing is suspended carry no geometry yet.
    measured: bool,
    timestamp: Option<Timestamp>,
}

#[derive(Debug, Clone, Default)]
pub struct Viewport {
    entries: HashMap<ElementId, Entry>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` without measuring it; the first offset update fills it in.
    pub fn register_element(&mut self, id: &ElementId) {
        self.entries.entry(id.clone()).or_insert(Entry {
            geometry: ViewportElement::default(),
            measured: false,
            timestamp: None,
        });
    }

    pub fn update_element(
        &mut self,
        id: &ElementId,
        offset: Offset,
        size: Size,
        timestamp: Option<Timestamp>,
    ) -> ViewportElement {
        let entry = self.entries.entry(id.clone()).or_insert(Entry {
            geometry: ViewportElement::default(),
            measured: false,
            timestamp: None,
        });
        entry.geometry.x = offset.left;
        entry.geometry.y = offset.top;
        entry.geometry.w = size.w;
        entry.geometry.h = size.h;
        entry.measured = true;
        entry.timestamp = timestamp;
        entry.geometry
    }

    /// Moves an already measured element without touching its size.
    pub fn set_position(&mut self, id: &ElementId, offset: Offset) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.geometry.x = offset.left;
            entry.geometry.y = offset.top;
        }
    }

    pub fn rotate_element(&mut self, id: &ElementId, rotation: f64) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.geometry.rotation = rotation;
        }
    }

    pub fn set_timestamp(&mut self, id: &ElementId, timestamp: Option<Timestamp>) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.timestamp = timestamp;
        }
    }

    pub fn timestamp(&self, id: &str) -> Option<Timestamp> {
        self.entries.get(id).and_then(|e| e.timestamp)
    }

    /// The measured geometry for `id`; placeholders read as absent.
    pub fn position(&self, id: &str) -> Option<ViewportElement> {
        self.entries
            .get(id)
            .filter(|e| e.measured)
            .map(|e| e.geometry)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn rename(&mut self, old: &str, new: &ElementId) {
        if let Some(entry) = self.entries.remove(old) {
            self.entries.insert(new.clone(), entry);
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.entries.remove(id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

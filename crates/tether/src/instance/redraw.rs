use super::Instance;
use crate::adapter::ElementAdapter;
use crate::ids::{ElementId, ElementRef, Timestamp};
use crate::router::{RedrawResult, Router, Scene};
use crate::viewport::{Offset, ViewportElement};

/// Parameters for [`Instance::update_offset`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOffset {
    pub element_id: ElementId,
    pub timestamp: Option<Timestamp>,
    /// Re-measure even when a cached record exists for this pass.
    pub recalc: bool,
    /// A known position to store instead of measuring.
    pub offset: Option<Offset>,
}

impl UpdateOffset {
    pub fn new(element_id: impl Into<ElementId>) -> Self {
        Self {
            element_id: element_id.into(),
            timestamp: None,
            recalc: false,
            offset: None,
        }
    }

    pub fn recalc(mut self) -> Self {
        self.recalc = true;
        self
    }

    pub fn at(mut self, timestamp: Option<Timestamp>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_offset(mut self, offset: Option<Offset>) -> Self {
        self.offset = offset;
        self
    }
}

impl<A: ElementAdapter, R: Router> Instance<A, R> {
    /// Refreshes the cached geometry of one element.
    ///
    /// Within one pass (same timestamp) the cached record is returned as is unless `recalc` is
    /// set. While drawing is suspended the suspension timestamp stands in for a missing one.
    pub fn update_offset(&mut self, params: UpdateOffset) -> Option<ViewportElement> {
        let UpdateOffset {
            element_id,
            mut timestamp,
            recalc,
            offset,
        } = params;

        if self.suspend_drawing && timestamp.is_none() {
            timestamp = self.suspended_at;
        }

        if !recalc {
            if let Some(ts) = timestamp {
                if self.viewport.timestamp(element_id.as_str()) == Some(ts) {
                    tracing::trace!(element = %element_id, "offset cache hit");
                    return self.viewport.position(element_id.as_str());
                }
            }
        }

        if recalc || (offset.is_none() && self.viewport.position(element_id.as_str()).is_none()) {
            if let Some(el) = self.managed.get(element_id.as_str()).map(|m| m.element) {
                let size = self.adapter.size(el);
                let measured = self.adapter.offset(el);
                self.viewport
                    .update_element(&element_id, measured, size, timestamp);
            }
        } else {
            if let Some(offset) = offset {
                self.viewport.set_position(&element_id, offset);
            }
            self.viewport.set_timestamp(&element_id, timestamp);
        }

        self.viewport.position(element_id.as_str())
    }

    /// Redraws everything attached to `el` and to its associated elements.
    pub fn repaint(&mut self, el: ElementRef) -> RedrawResult {
        self.draw(el, None, None, false)
    }

    /// [`repaint`](Self::repaint) with a known position for `el` and an explicit pass timestamp.
    pub fn repaint_with(
        &mut self,
        el: ElementRef,
        offset: Option<Offset>,
        timestamp: Option<Timestamp>,
    ) -> RedrawResult {
        self.draw(el, offset, timestamp, false)
    }

    /// Forces a fresh measurement of `el`, then repaints it.
    pub fn revalidate(&mut self, el: ElementRef, timestamp: Option<Timestamp>) -> RedrawResult {
        let id = self.get_id(el);
        self.update_offset(UpdateOffset::new(id).recalc().at(timestamp));
        self.repaint(el)
    }

    /// Re-measures every element that owns endpoints, then redraws each of them, all under one
    /// shared timestamp.
    pub fn repaint_everything(&mut self) -> RedrawResult {
        let timestamp = Timestamp::fresh();
        let ids: Vec<ElementId> = self.graph.elements_with_endpoints().cloned().collect();
        tracing::trace!(elements = ids.len(), %timestamp, "repaint everything");

        for id in &ids {
            self.update_offset(UpdateOffset::new(id.clone()).recalc().at(Some(timestamp)));
        }

        let mut out = RedrawResult::default();
        for id in &ids {
            let Some(el) = self.element_for(id.as_str()) else {
                continue;
            };
            out.merge(self.draw_element(el, id.clone(), None, Some(timestamp), true));
        }
        out
    }

    pub(crate) fn draw(
        &mut self,
        el: ElementRef,
        ui: Option<Offset>,
        timestamp: Option<Timestamp>,
        offsets_just_calculated: bool,
    ) -> RedrawResult {
        if self.suspend_drawing {
            return RedrawResult::default();
        }
        let id = self.get_id(el);
        self.draw_element(el, id, ui, timestamp, offsets_just_calculated)
    }

    fn draw_element(
        &mut self,
        el: ElementRef,
        id: ElementId,
        ui: Option<Offset>,
        timestamp: Option<Timestamp>,
        offsets_just_calculated: bool,
    ) -> RedrawResult {
        let mut out = RedrawResult::default();
        if self.suspend_drawing {
            return out;
        }

        let associated: Vec<ElementId> = self
            .adapter
            .associated_elements(el)
            .into_iter()
            .map(|a| self.get_id(a))
            .collect();
        let timestamp = timestamp.unwrap_or_else(Timestamp::fresh);

        let mut offsets = Vec::with_capacity(associated.len());
        if offsets_just_calculated {
            for aid in &associated {
                offsets.push(self.viewport.position(aid.as_str()));
            }
        } else {
            self.update_offset(
                UpdateOffset::new(id.clone())
                    .with_offset(ui)
                    .at(Some(timestamp)),
            );
            for aid in &associated {
                offsets.push(
                    self.update_offset(UpdateOffset::new(aid.clone()).recalc().at(Some(timestamp))),
                );
            }
        }

        let ui_geometry = ui.and_then(|_| self.viewport.position(id.as_str()));
        let scene = Scene {
            graph: &self.graph,
            viewport: &self.viewport,
        };
        out.merge(
            self.router
                .redraw(scene, &id, ui_geometry.as_ref(), timestamp),
        );
        for (aid, offset) in associated.iter().zip(&offsets) {
            out.merge(self.router.redraw(scene, aid, offset.as_ref(), timestamp));
        }

        tracing::trace!(
            element = %id,
            associated = associated.len(),
            connections = out.connections.len(),
            endpoints = out.endpoints.len(),
            "redraw"
        );
        out
    }

    /// Suspends (or resumes) drawing; returns the previous setting.
    pub fn set_suspend_drawing(&mut self, suspend: bool, repaint_after: bool) -> bool {
        let previous = self.suspend_drawing;
        self.suspend_drawing = suspend;
        self.suspended_at = suspend.then(Timestamp::fresh);
        if repaint_after {
            self.repaint_everything();
        }
        previous
    }

    pub fn is_suspended(&self) -> bool {
        self.suspend_drawing
    }

    /// The pass token minted when drawing was last suspended.
    pub fn suspended_at(&self) -> Option<Timestamp> {
        self.suspended_at
    }

    /// Runs `f` with drawing suspended. Only the outermost batch resumes drawing, followed by a
    /// full repaint unless `skip_repaint`.
    pub fn batch<T>(&mut self, f: impl FnOnce(&mut Self) -> T, skip_repaint: bool) -> T {
        let was_suspended = self.suspend_drawing;
        if !was_suspended {
            self.set_suspend_drawing(true, false);
        }
        let out = f(self);
        if !was_suspended {
            self.set_suspend_drawing(false, !skip_repaint);
        }
        out
    }
}

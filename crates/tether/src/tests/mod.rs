use crate::*;
use std::cell::RefCell;
use std::rc::Rc;

mod connect;
mod delete;
mod registry;

pub(crate) type TestInstance = Instance<MemoryAdapter, TopologyRouter>;

pub(crate) fn instance() -> TestInstance {
    Instance::new(MemoryAdapter::new(), TopologyRouter)
}

/// Creates a 100x50 element at `(x, 0)` carrying `id`.
pub(crate) fn element<R: Router>(inst: &mut Instance<MemoryAdapter, R>, id: &str) -> ElementRef {
    let x = inst.adapter().measurements() as f64;
    inst.adapter_mut()
        .create_with_geometry(id, Offset::new(x * 10.0, 0.0), Size::new(100.0, 50.0))
}

pub(crate) fn connect<R: Router>(
    inst: &mut Instance<MemoryAdapter, R>,
    source: impl Into<Terminal>,
    target: impl Into<Terminal>,
) -> ConnectionId {
    inst.connect(&ConnectParams::new(source, target), None)
        .unwrap()
}

/// Every listed connection agrees with its endpoints, and every endpoint lists only live
/// connections that reference it.
pub(crate) fn assert_consistent<R: Router>(inst: &Instance<MemoryAdapter, R>) {
    let graph = inst.graph();
    for c in graph.iter_connections() {
        for (index, id) in [c.source_id(), c.target_id()].into_iter().enumerate() {
            let ep = graph.endpoint(c.endpoint(index).unwrap()).unwrap();
            assert_eq!(ep.element_id(), id, "connection {} end {index}", c.id());
            assert!(ep.connections().contains(&c.id()));
            if let Some(record) = c.proxy(index) {
                assert!(
                    graph.endpoint(record.original).is_some(),
                    "connection {} end {index} parks a deleted endpoint",
                    c.id()
                );
            }
        }
    }
    for id in graph.elements_with_endpoints() {
        for ep in graph.endpoints_for(id.as_str()) {
            for c in ep.connections() {
                let conn = graph.connection(*c).unwrap();
                assert!(conn.endpoints().contains(&ep.id()));
            }
        }
    }
}

/// Records every router callback, for asserting what a mutation asked the host to redraw.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingRouter {
    pub log: Rc<RefCell<Vec<String>>>,
}

impl RecordingRouter {
    pub fn count(&self, prefix: &str) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|l| l.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Router for RecordingRouter {
    fn new_connection(&mut self, connection: &Connection) {
        self.log
            .borrow_mut()
            .push(format!("new_connection {}", connection.id()));
    }

    fn connection_detached(&mut self, connection: &Connection) {
        self.log
            .borrow_mut()
            .push(format!("detached {}", connection.id()));
    }

    fn redraw(
        &mut self,
        scene: Scene<'_>,
        element_id: &ElementId,
        offset: Option<&ViewportElement>,
        timestamp: Timestamp,
    ) -> RedrawResult {
        self.log.borrow_mut().push(format!("redraw {element_id}"));
        TopologyRouter.redraw(scene, element_id, offset, timestamp)
    }

    fn compute_anchor(&mut self, endpoint: &Endpoint, input: &AnchorInput) -> AnchorPlacement {
        TopologyRouter.compute_anchor(endpoint, input)
    }

    fn paint_endpoint(&mut self, endpoint: &Endpoint, _placement: &AnchorPlacement) {
        self.log.borrow_mut().push(format!("paint {}", endpoint.id()));
    }

    fn delete_endpoint(&mut self, endpoint: &Endpoint) {
        self.log
            .borrow_mut()
            .push(format!("delete_endpoint {}", endpoint.id()));
    }

    fn clear_for(&mut self, element_id: &ElementId) {
        self.log.borrow_mut().push(format!("clear_for {element_id}"));
    }

    fn remove_floating_connection(&mut self, _element_id: &ElementId) {}

    fn reset(&mut self) {
        self.log.borrow_mut().push("reset".to_string());
    }
}

pub(crate) fn recording() -> (Instance<MemoryAdapter, RecordingRouter>, RecordingRouter) {
    let router = RecordingRouter::default();
    (Instance::new(MemoryAdapter::new(), router.clone()), router)
}

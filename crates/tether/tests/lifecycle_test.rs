use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use tether::{
    ConnectParams, DefinitionOptions, DeleteOptions, ElementRef, EndpointOptions, Event,
    EventKind, Filter, Instance, MemoryAdapter, Offset, SelectOptions, Size, TopologyRouter,
    TypeDescriptor,
};

type Editor = Instance<MemoryAdapter, TopologyRouter>;

fn node(inst: &mut Editor, id: &str, x: f64) -> ElementRef {
    inst.adapter_mut()
        .create_with_geometry(id, Offset::new(x, 0.0), Size::new(80.0, 40.0))
}

fn center(_: &tether::Connection, _: usize) -> serde_json::Value {
    json!("Center")
}

#[test]
fn editor_session_keeps_the_graph_consistent() {
    let mut inst: Editor = Instance::new(MemoryAdapter::new(), TopologyRouter);
    let created = Rc::new(RefCell::new(0usize));
    let detached = Rc::new(RefCell::new(0usize));
    {
        let created = created.clone();
        inst.bind(EventKind::ConnectionCreated, move |_| *created.borrow_mut() += 1);
        let detached = detached.clone();
        inst.bind(EventKind::ConnectionDetached, move |e| {
            assert!(matches!(e, Event::ConnectionDetached(_)));
            *detached.borrow_mut() += 1;
        });
    }

    inst.register_connection_type(
        "flow",
        TypeDescriptor {
            connector: Some(json!("Flowchart")),
            css_class: Some("flow".into()),
            ..Default::default()
        },
    );

    let input = node(&mut inst, "input", 0.0);
    let filter = node(&mut inst, "filter", 200.0);
    let output = node(&mut inst, "output", 400.0);
    let group = node(&mut inst, "group", 100.0);

    let flow = DefinitionOptions {
        endpoint: EndpointOptions {
            connection_type: Some("flow".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    inst.make_source(input, &flow);
    inst.make_source(filter, &flow);
    inst.make_target(filter, &flow);
    inst.make_target(output, &flow);

    let typed = |source, target| ConnectParams {
        connection_type: Some("flow".into()),
        ..ConnectParams::new(source, target)
    };
    let first = inst.connect(&typed(input, filter), None).unwrap();
    let second = inst.connect(&typed(filter, output), None).unwrap();
    assert_eq!(*created.borrow(), 2);
    assert_eq!(
        inst.connection(first).unwrap().connector(),
        &json!("Flowchart")
    );

    // Collapse filter and output into a group, then expand again.
    inst.proxy_connection(first, 1, group, |_, _| json!("Blank"), center);
    inst.proxy_connection(second, 0, group, |_, _| json!("Blank"), center);
    let into_group = inst.get_connections(&SelectOptions {
        target: Filter::only(["filter"]),
        ..Default::default()
    });
    assert_eq!(into_group, vec![first]);
    inst.unproxy_connection(first, 1);
    inst.unproxy_connection(second, 0);
    assert!(inst.get_endpoints(group).is_empty());
    assert_eq!(inst.connection(first).unwrap().target_id().as_str(), "filter");

    // Rewire the tail straight from input.
    let moved = inst.set_source(second, input).unwrap();
    assert_eq!(moved.original_source_id.as_str(), "filter");

    inst.unmanage(filter, true);
    assert!(inst.connection(first).is_none());
    assert_eq!(inst.all_connections(), &[second]);
    assert_eq!(*detached.borrow(), 1);

    assert_eq!(inst.delete_every_connection(&DeleteOptions::default()), 1);
    assert_eq!(*detached.borrow(), 2);
    assert_eq!(inst.graph().connection_count(), 0);
}

#[test]
fn repaint_reports_what_changed() {
    let mut inst: Editor = Instance::new(MemoryAdapter::new(), TopologyRouter);
    let a = node(&mut inst, "a", 0.0);
    let b = node(&mut inst, "b", 100.0);
    let lonely = node(&mut inst, "lonely", 200.0);
    let c = inst.connect(&ConnectParams::new(a, b), None).unwrap();

    let result = inst.repaint(a);
    assert_eq!(result.connections.iter().copied().collect::<Vec<_>>(), vec![c]);
    assert_eq!(result.endpoints.len(), 1);
    assert!(inst.repaint(lonely).is_empty());
}

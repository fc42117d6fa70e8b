use super::*;
use serde_json::json;

#[test]
fn connect_two_elements_creates_auto_deleting_endpoints() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");

    let c = connect(&mut inst, a, b);

    let conn = inst.connection(c).unwrap();
    assert_eq!(conn.source_id().as_str(), "a");
    assert_eq!(conn.target_id().as_str(), "b");
    assert_eq!(conn.scope(), DEFAULT_SCOPE);
    assert_eq!(conn.connector(), &json!("Bezier"));
    assert!(!conn.is_pending());

    let [s, t] = conn.endpoints();
    assert_ne!(s, t);
    for e in [s, t] {
        let ep = inst.endpoint(e).unwrap();
        assert!(ep.delete_on_empty());
        assert_eq!(ep.connections(), &[c]);
    }
    assert_eq!(inst.all_connections(), &[c]);
    assert!(inst.is_managed("a") && inst.is_managed("b"));
    assert!(inst.adapter().has_class(a, instance::CLASS_CONNECTED));
    assert_consistent(&inst);
}

#[test]
fn endpoint_and_connection_ids_are_unique() {
    let mut inst = instance();
    let els: Vec<ElementRef> = (0..4).map(|i| element(&mut inst, &format!("n{i}"))).collect();

    let mut connections = Vec::new();
    for w in els.windows(2) {
        connections.push(connect(&mut inst, w[0], w[1]));
    }
    let mut endpoints: Vec<EndpointId> = connections
        .iter()
        .flat_map(|c| inst.connection(*c).unwrap().endpoints())
        .collect();

    connections.sort();
    connections.dedup();
    assert_eq!(connections.len(), 3);
    endpoints.sort();
    endpoints.dedup();
    assert_eq!(endpoints.len(), 6);
}

#[test]
fn full_source_endpoint_rejects_and_leaves_graph_untouched() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let c = element(&mut inst, "c");

    let ep = inst.add_endpoint(a, &EndpointOptions::default(), None);
    assert_eq!(inst.endpoint(ep).unwrap().max_connections(), 1);
    connect(&mut inst, ep, b);
    let before = inst.graph().endpoint_count();

    let err = inst
        .connect(&ConnectParams::new(ep, c), None)
        .unwrap_err();
    assert!(matches!(err, Error::SourceEndpointFull));
    assert_eq!(inst.graph().connection_count(), 1);
    assert_eq!(inst.graph().endpoint_count(), before);
}

#[test]
fn full_target_endpoint_is_reported_as_target() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let c = element(&mut inst, "c");

    let target = inst.add_endpoint(b, &EndpointOptions::default(), None);
    connect(&mut inst, a, target);

    let err = inst
        .connect(&ConnectParams::new(c, target), None)
        .unwrap_err();
    assert!(matches!(err, Error::TargetEndpointFull));
}

#[test]
fn disjoint_scopes_never_connect() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let red = inst.add_endpoint(
        a,
        &EndpointOptions {
            scope: Some("red".into()),
            ..Default::default()
        },
        None,
    );
    let blue = inst.add_endpoint(
        b,
        &EndpointOptions {
            scope: Some("blue green".into()),
            ..Default::default()
        },
        None,
    );

    let err = inst
        .connect(&ConnectParams::new(red, blue), None)
        .unwrap_err();
    match err {
        Error::ScopeMismatch {
            source_scope,
            target_scope,
        } => {
            assert_eq!(source_scope, "red");
            assert_eq!(target_scope, "blue green");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(inst.graph().connection_count(), 0);
    assert_eq!(inst.graph().endpoint_count(), 2);
}

#[test]
fn shared_scope_tag_connects_and_connection_takes_source_scope() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let s = inst.add_endpoint(
        a,
        &EndpointOptions {
            scope: Some("red green".into()),
            ..Default::default()
        },
        None,
    );
    let t = inst.add_endpoint(
        b,
        &EndpointOptions {
            scope: Some("green".into()),
            ..Default::default()
        },
        None,
    );

    let c = connect(&mut inst, s, t);
    assert_eq!(inst.connection(c).unwrap().scope(), "red green");
}

#[test]
fn missing_terminals_are_rejected() {
    let mut inst = instance();
    let a = element(&mut inst, "a");

    let mut params = ConnectParams::default();
    params.target = Some(a.into());
    assert!(matches!(
        inst.connect(&params, None),
        Err(Error::SourceMissing)
    ));

    let params = ConnectParams::new(a, Terminal::ElementId(ElementId::new("nope")));
    assert!(matches!(
        inst.connect(&params, None),
        Err(Error::TargetMissing)
    ));
    assert_eq!(inst.graph().endpoint_count(), 0);
}

#[test]
fn reference_params_override_params() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");

    let params = ConnectParams {
        scope: Some("mine".into()),
        paint_style: Some(json!({ "stroke": "red" })),
        ..ConnectParams::new(a, b)
    };
    let reference = ConnectParams {
        paint_style: Some(json!({ "stroke": "blue" })),
        ..Default::default()
    };
    let c = inst.connect(&params, Some(&reference)).unwrap();
    let conn = inst.connection(c).unwrap();
    assert_eq!(conn.paint_style(), &json!({ "stroke": "blue" }));
    assert_eq!(conn.scope(), "mine");
}

#[test]
fn uuid_terminals_resolve_to_endpoints() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let ep = inst.add_endpoint(
        a,
        &EndpointOptions {
            uuid: Some("port-1".into()),
            ..Default::default()
        },
        None,
    );

    let c = inst
        .connect(
            &ConnectParams::new(Terminal::Uuid("port-1".into()), b),
            None,
        )
        .unwrap();
    assert_eq!(inst.connection(c).unwrap().endpoint(0).unwrap(), ep);
    assert_eq!(inst.get_endpoint("port-1").map(Endpoint::id), Some(ep));
}

#[test]
fn connection_types_fold_left_to_right() {
    let mut inst = instance();
    inst.register_connection_types([
        (
            "default",
            TypeDescriptor {
                connector: Some(json!("Straight")),
                ..Default::default()
            },
        ),
        (
            "bold",
            TypeDescriptor {
                paint_style: Some(json!({ "strokeWidth": 5 })),
                css_class: Some("bold".into()),
                ..Default::default()
            },
        ),
        (
            "dashed",
            TypeDescriptor {
                css_class: Some("dashed".into()),
                overlays: vec![OverlaySpec::Kind("Arrow".into())],
                ..Default::default()
            },
        ),
    ]);
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");

    let c = inst
        .connect(
            &ConnectParams {
                connection_type: Some("bold dashed".into()),
                ..ConnectParams::new(a, b)
            },
            None,
        )
        .unwrap();
    let conn = inst.connection(c).unwrap();
    assert_eq!(conn.connector(), &json!("Straight"));
    assert_eq!(conn.paint_style(), &json!({ "strokeWidth": 5 }));
    assert_eq!(conn.css_class(), Some("dashed"));
    assert_eq!(conn.overlays().len(), 1);
}

#[test]
fn endpoint_types_apply_on_creation() {
    let mut inst = instance();
    inst.register_endpoint_type(
        "big",
        TypeDescriptor {
            max_connections: Some(-1),
            scope: Some("wide".into()),
            ..Default::default()
        },
    );
    let a = element(&mut inst, "a");
    let ep = inst.add_endpoint(
        a,
        &EndpointOptions {
            endpoint_type: Some("big".into()),
            ..Default::default()
        },
        None,
    );
    let ep = inst.endpoint(ep).unwrap();
    assert_eq!(ep.max_connections(), -1);
    assert!(!ep.is_full());
    assert_eq!(ep.scope(), "wide");
}

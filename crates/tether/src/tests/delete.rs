use super::*;
use std::rc::Rc;

#[test]
fn delete_connection_prunes_auto_endpoints_and_is_idempotent() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let c = connect(&mut inst, a, b);

    assert!(inst.delete_connection(c, &DeleteOptions::default()));
    assert_eq!(inst.graph().connection_count(), 0);
    assert_eq!(inst.graph().endpoint_count(), 0);
    assert!(!inst.adapter().has_class(a, instance::CLASS_CONNECTED));

    assert!(!inst.delete_connection(c, &DeleteOptions::default()));
    assert_eq!(inst.graph().connection_count(), 0);
}

#[test]
fn explicit_endpoints_survive_their_connection() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let ep = inst.add_endpoint(a, &EndpointOptions::default(), None);
    let c = connect(&mut inst, ep, b);

    inst.delete_connection(c, &DeleteOptions::default());
    let ep = inst.endpoint(ep).unwrap();
    assert!(ep.connections().is_empty());
    assert_eq!(inst.graph().endpoint_count(), 1);
}

#[test]
fn guards_veto_unless_forced() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let c = connect(&mut inst, a, b);

    let guard = inst.bind_condition(Condition::BeforeDetach, |_| false);
    assert!(!inst.check_condition(Condition::BeforeDetach, c));
    assert!(!inst.delete_connection(c, &DeleteOptions::default()));
    assert_eq!(inst.graph().connection_count(), 1);

    inst.unbind(guard);
    let params = ConnectParams {
        before_detach: Some(Rc::new(|_: &Connection| false)),
        ..ConnectParams::new(element(&mut inst, "c"), element(&mut inst, "d"))
    };
    let guarded = inst.connect(&params, None).unwrap();
    assert!(!inst.delete_connection(guarded, &DeleteOptions::default()));
    assert!(inst.delete_connection(guarded, &DeleteOptions::forced()));
    assert!(inst.delete_connection(c, &DeleteOptions::default()));
}

#[test]
fn endpoint_guard_vetoes_detach() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let ep = inst.add_endpoint(
        a,
        &EndpointOptions {
            before_detach: Some(Rc::new(|_: &Connection| false)),
            ..Default::default()
        },
        None,
    );
    let c = connect(&mut inst, ep, b);
    assert!(!inst.delete_connection(c, &DeleteOptions::default()));
}

#[test]
fn delete_endpoint_cascades_to_connections_and_peers() {
    let mut inst = instance();
    let hub = element(&mut inst, "hub");
    let ep = inst.add_endpoint(
        hub,
        &EndpointOptions {
            max_connections: Some(-1),
            ..Default::default()
        },
        None,
    );
    for id in ["x", "y", "z"] {
        let el = element(&mut inst, id);
        connect(&mut inst, ep, el);
    }
    assert_eq!(inst.graph().endpoint_count(), 4);

    assert!(inst.delete_endpoint(ep));
    assert_eq!(inst.graph().connection_count(), 0);
    assert_eq!(inst.graph().endpoint_count(), 0);
    assert!(!inst.delete_endpoint(ep));
}

#[test]
fn delete_every_connection_runs_in_one_batch() {
    let (mut inst, router) = recording();
    let els: Vec<ElementRef> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|id| element(&mut inst, id))
        .collect();
    connect(&mut inst, els[0], els[1]);
    connect(&mut inst, els[1], els[2]);
    connect(&mut inst, els[2], els[3]);
    router.clear();

    assert_eq!(inst.delete_every_connection(&DeleteOptions::default()), 3);
    assert_eq!(inst.graph().connection_count(), 0);
    assert_eq!(router.count("detached"), 3);
    assert!(!inst.is_suspended());
}

#[test]
fn delete_every_connection_retries_a_vetoed_head() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let c = element(&mut inst, "c");
    let guarded = inst
        .connect(
            &ConnectParams {
                before_detach: Some(Rc::new(|_: &Connection| false)),
                ..ConnectParams::new(a, b)
            },
            None,
        )
        .unwrap();
    connect(&mut inst, b, c);

    assert_eq!(inst.delete_every_connection(&DeleteOptions::default()), 0);
    assert_eq!(inst.all_connections().len(), 2);
    assert_eq!(inst.all_connections()[0], guarded);
}

#[test]
fn delete_connections_for_element_leaves_others() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let c = element(&mut inst, "c");
    connect(&mut inst, a, b);
    let keep = connect(&mut inst, b, c);
    connect(&mut inst, c, a);

    inst.delete_connections_for_element(a, &DeleteOptions::default());
    assert_eq!(inst.all_connections(), &[keep]);
    assert_consistent(&inst);
}

#[test]
fn unmanage_removes_endpoints_connections_and_registry_entry() {
    let mut inst = instance();
    let parent = element(&mut inst, "p");
    let child = element(&mut inst, "child");
    inst.adapter_mut().append_child(parent, child);
    let other = element(&mut inst, "o");
    connect(&mut inst, child, other);
    connect(&mut inst, parent, other);
    inst.make_source(parent, &DefinitionOptions::default());

    inst.unmanage(parent, true);

    assert_eq!(inst.graph().connection_count(), 0);
    assert!(!inst.is_managed("p"));
    assert!(!inst.is_managed("child"));
    assert!(inst.is_managed("o"));
    assert!(!inst.is_source(parent, None));
    assert!(!inst.adapter().contains(parent));
    assert_eq!(inst.graph().endpoint_count(), 0);
}

#[test]
fn set_source_moves_the_end_and_prunes_the_old_endpoint() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let d = element(&mut inst, "d");
    let c = connect(&mut inst, a, b);
    let old = inst.connection(c).unwrap().endpoint(0).unwrap();

    let moved = inst.set_source(c, d).unwrap();
    assert_eq!(moved.original_source_id.as_str(), "a");
    assert_eq!(moved.new_source_id.as_str(), "d");
    assert_eq!(moved.new_target_id.as_str(), "b");
    assert!(inst.endpoint(old).is_none());
    assert_eq!(inst.connection(c).unwrap().source_id().as_str(), "d");
    assert!(!inst.adapter().has_class(a, instance::CLASS_CONNECTED));
    assert_consistent(&inst);

    assert!(inst.set_source(c, d).is_none(), "same element is a no-op");
}

#[test]
fn set_target_onto_an_existing_endpoint() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let e = element(&mut inst, "e");
    let target = inst.add_endpoint(e, &EndpointOptions::default(), None);
    let c = connect(&mut inst, a, b);

    let moved = inst.set_target(c, target).unwrap();
    assert_eq!(moved.index, 1);
    assert_eq!(moved.original_target_id.as_str(), "b");
    assert_eq!(inst.connection(c).unwrap().endpoint(1).unwrap(), target);
    assert_eq!(inst.endpoint(target).unwrap().connections(), &[c]);
    assert_consistent(&inst);
}

#[test]
fn set_source_honours_a_disabled_definition() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let d = element(&mut inst, "d");
    inst.make_source(d, &DefinitionOptions::default());
    inst.set_source_enabled(d, false, None);
    let c = connect(&mut inst, a, b);

    assert!(inst.set_source(c, d).is_none());
    assert_eq!(inst.connection(c).unwrap().source_id().as_str(), "a");
}

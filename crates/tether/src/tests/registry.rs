use super::*;
use serde_json::json;

#[test]
fn manage_is_idempotent_and_stamps_the_element() {
    let mut inst = instance();
    let a = element(&mut inst, "a");

    let first = inst.manage(a, false);
    let internal = inst.adapter().get_attribute(a, instance::ATTRIBUTE_INTERNAL_ID);
    assert!(internal.is_some());
    assert!(inst.adapter().get_attribute(a, instance::ATTRIBUTE_MANAGED).is_some());
    assert_eq!(first.info.map(|g| g.w), Some(100.0));

    let measured = inst.adapter().measurements();
    let again = inst.manage(a, false);
    assert_eq!(again, first);
    assert_eq!(inst.adapter().measurements(), measured);
    assert_eq!(
        inst.adapter().get_attribute(a, instance::ATTRIBUTE_INTERNAL_ID),
        internal
    );
    assert_eq!(inst.managed_elements().count(), 1);

    inst.manage(a, true);
    assert_eq!(inst.adapter().measurements(), measured + 1);
}

#[test]
fn get_id_assigns_once() {
    let mut inst = instance();
    let anonymous = inst.adapter_mut().create(None);
    assert!(inst.id_of(anonymous).is_none());

    let id = inst.get_id(anonymous);
    let prefix = format!("tether-{}-", inst.instance_index());
    assert!(id.as_str().starts_with(&prefix), "{id}");
    assert_eq!(inst.get_id(anonymous), id);
    assert_eq!(inst.id_of(anonymous), Some(id));
}

#[test]
fn set_id_rekeys_every_index() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let c = connect(&mut inst, a, b);
    inst.make_source(a, &DefinitionOptions::default());

    inst.set_id(a, "renamed");

    assert!(inst.is_managed("renamed"));
    assert!(!inst.is_managed("a"));
    assert_eq!(inst.connection(c).unwrap().source_id().as_str(), "renamed");
    assert_eq!(inst.managed_connections("renamed"), vec![c]);
    assert!(inst.viewport().contains("renamed"));
    assert!(inst.is_source(a, None));
    assert_consistent(&inst);
}

#[test]
fn set_id_changed_follows_a_host_rename() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    let c = connect(&mut inst, a, b);

    inst.adapter_mut().set_attribute(b, "id", "b2");
    inst.set_id_changed("b", "b2");

    assert_eq!(inst.connection(c).unwrap().target_id().as_str(), "b2");
    assert_eq!(inst.managed_endpoints("b2").len(), 1);
    assert!(inst.managed_endpoints("b").is_empty());

    // Nothing carries the new id: no-op.
    inst.set_id_changed("b2", "ghost");
    assert!(inst.is_managed("b2"));
}

#[test]
fn cached_data_measures_on_a_miss_only() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    inst.set_suspend_drawing(true, false);
    inst.manage(a, false);
    inst.set_suspend_drawing(false, false);

    let before = inst.adapter().measurements();
    let data = inst.get_cached_data("a").unwrap();
    assert_eq!(inst.adapter().measurements(), before + 1);
    assert_eq!(inst.get_cached_data("a"), Some(data));
    assert_eq!(inst.adapter().measurements(), before + 1);
    assert!(inst.get_cached_data("nobody").is_none());
}

#[test]
fn import_defaults_merges_and_restore_undoes() {
    let mut inst = instance();
    inst.import_defaults(&json!({
        "maxConnections": 5,
        "paintStyle": { "stroke": "red" },
    }))
    .unwrap();
    assert_eq!(inst.defaults().max_connections, 5);
    assert_eq!(
        inst.defaults().paint_style,
        json!({ "strokeWidth": 2, "stroke": "red" })
    );
    assert_eq!(inst.default_scope(), DEFAULT_SCOPE);

    let a = element(&mut inst, "a");
    let ep = inst.add_endpoint(a, &EndpointOptions::default(), None);
    assert_eq!(inst.endpoint(ep).unwrap().max_connections(), 5);

    let err = inst
        .import_defaults(&json!({ "maxConnections": "lots" }))
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(inst.defaults().max_connections, 5, "failed import leaves defaults alone");

    inst.restore_defaults();
    assert_eq!(inst.defaults(), &Defaults::default());
}

#[test]
fn reset_clears_everything_but_keeps_the_instance_usable() {
    let (mut inst, router) = recording();
    inst.register_connection_type("bold", TypeDescriptor::default());
    let a = element(&mut inst, "a");
    let b = element(&mut inst, "b");
    connect(&mut inst, a, b);
    inst.make_target(b, &DefinitionOptions::default());

    inst.reset();

    assert_eq!(router.count("reset"), 1);
    assert_eq!(inst.graph().connection_count(), 0);
    assert_eq!(inst.graph().endpoint_count(), 0);
    assert_eq!(inst.managed_elements().count(), 0);
    assert!(inst.viewport().is_empty());
    assert!(!inst.is_target(b, None));
    assert!(inst.get_type("bold", TypeKind::Connection).is_none());

    connect(&mut inst, a, b);
    assert_eq!(inst.graph().connection_count(), 1);
}

#[test]
fn remove_all_endpoints_can_recurse_into_children() {
    let mut inst = instance();
    let parent = element(&mut inst, "p");
    let child = element(&mut inst, "c");
    inst.adapter_mut().append_child(parent, child);
    let other = element(&mut inst, "o");
    connect(&mut inst, parent, other);
    connect(&mut inst, child, other);

    inst.remove_all_endpoints(parent, false);
    assert!(inst.get_endpoints(parent).is_empty());
    assert_eq!(inst.get_endpoints(child).len(), 1);
    assert_eq!(inst.graph().connection_count(), 1);

    inst.remove_all_endpoints(parent, true);
    assert!(inst.get_endpoints(child).is_empty());
    assert_eq!(inst.graph().connection_count(), 0);
    assert!(inst.is_managed("p"), "removing endpoints does not unmanage");
}

#[test]
fn instances_are_numbered_independently() {
    let first = instance();
    let second = instance();
    assert_ne!(first.instance_index(), second.instance_index());
}

#[test]
fn a_supplied_instance_index_appears_in_generated_ids() {
    let mut inst = instance().with_instance_index(7);
    assert_eq!(inst.instance_index(), 7);
    let anonymous = inst.adapter_mut().create(None);
    let id = inst.get_id(anonymous);
    assert!(id.as_str().starts_with("tether-7-"), "{id}");
}

#[test]
fn manage_with_id_stamps_the_given_internal_id() {
    let mut inst = instance();
    let a = element(&mut inst, "a");
    let managed = inst.manage_with_id(a, "node-a", false);
    assert_eq!(managed.element, a);
    assert_eq!(
        inst.adapter().get_attribute(a, instance::ATTRIBUTE_INTERNAL_ID).as_deref(),
        Some("node-a")
    );
    assert!(inst.is_managed("a"));

    // An element keeps the first internal id it was given.
    inst.manage_with_id(a, "other", false);
    assert_eq!(
        inst.adapter().get_attribute(a, instance::ATTRIBUTE_INTERNAL_ID).as_deref(),
        Some("node-a")
    );
}

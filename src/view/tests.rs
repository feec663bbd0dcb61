use super::*;
use crate::component::ComponentType;
use serde_json::json;

fn text(id: &str) -> Component {
    Component::new(id, ComponentType::Text)
}

#[test]
fn test_new_view_starts_unversioned() {
    let view = View::new("v1", "Dash");
    assert_eq!(view.version, 0);
    assert!(view.components.is_empty());
    assert_eq!(view.created_at, view.updated_at);
}

#[test]
fn test_insert_component_positions() {
    let mut view = View::new("v1", "Dash");

    assert_eq!(view.insert_component(text("a"), None), 0);
    assert_eq!(view.insert_component(text("c"), None), 1);
    assert_eq!(view.insert_component(text("b"), Some(1)), 1);
    // Out of range clamps to the end
    assert_eq!(view.insert_component(text("d"), Some(99)), 3);

    let ids: Vec<&str> = view.components.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
}

#[test]
fn test_find_and_remove_nested_component() {
    let mut view = View::new("v1", "Dash");
    view.insert_component(
        Component::new("card", ComponentType::Card).with_child(text("inner")),
        None,
    );
    view.insert_component(text("outer"), None);

    assert_eq!(view.component_count(), 3);
    assert!(view.contains_component("inner"));

    view.find_component_mut("inner")
        .unwrap()
        .properties
        .insert("content".to_string(), json!("hi"));
    assert_eq!(
        view.find_component("inner").unwrap().properties["content"],
        json!("hi")
    );

    let removed = view.remove_component("inner").unwrap();
    assert_eq!(removed.id, "inner");
    assert!(!view.contains_component("inner"));
    assert_eq!(view.component_count(), 2);

    assert!(view.remove_component("does-not-exist").is_none());
}

#[test]
fn test_update_wire_shape_is_flat() {
    let update = ViewUpdate::new(
        "v1",
        3,
        ViewChange::UpdateComponent {
            component_id: "m1".to_string(),
            properties: Some(Properties::from([("value".to_string(), json!(150))])),
            styles: None,
        },
    );

    let value = serde_json::to_value(&update).unwrap();
    assert_eq!(value["view_id"], json!("v1"));
    assert_eq!(value["action"], json!("update_component"));
    assert_eq!(value["version"], json!(3));
    assert_eq!(value["payload"]["component_id"], json!("m1"));
    assert_eq!(value["payload"]["properties"], json!({"value": 150}));
    assert_eq!(value["payload"]["styles"], json!(null));
    assert!(value.get("change").is_none());
}

#[test]
fn test_full_update_carries_view() {
    let mut view = View::new("v1", "Dash");
    view.version = 4;
    view.insert_component(text("a"), None);

    let update = ViewUpdate::full(&view);
    assert_eq!(update.action(), "full");
    assert_eq!(update.version, 4);

    let value = serde_json::to_value(&update).unwrap();
    assert_eq!(value["payload"]["name"], json!("Dash"));
    assert_eq!(value["payload"]["components"][0]["id"], json!("a"));
}

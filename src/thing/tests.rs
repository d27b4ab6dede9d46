use super::*;
use crate::action::{handler_fn, ActionContext, ActionDefinition};
use crate::notify::ChannelSubscriber;
use crate::property::ValueCell;
use crate::validation::{BooleanValidator, Constraints, IntegerValidator, NumberValidator};
use serde_json::json;

async fn succeed(_ctx: ActionContext) -> anyhow::Result<()> {
    Ok(())
}

fn lamp() -> Arc<Thing> {
    Thing::builder("lamp")
        .title("My Lamp")
        .description("A web connected lamp")
        .property("on", BooleanValidator::new(), json!(true))
        .property(
            "brightness",
            IntegerValidator::new(Constraints::new().minimum(0u8).maximum(100)),
            json!(50),
        )
        .read_only_property(
            "temperature",
            NumberValidator::<f64>::default(),
            json!(21.5),
        )
        .action(ActionDefinition::new("reboot", handler_fn(succeed)))
        .event("overheated")
        .event_history(2)
        .build()
        .unwrap()
}

#[test]
fn test_build_and_read_properties() {
    let thing = lamp();

    assert_eq!(thing.name(), "lamp");
    assert_eq!(thing.title(), Some("My Lamp"));
    assert_eq!(thing.get_property("on").unwrap(), ThingValue::Bool(true));
    assert_eq!(
        thing.property_values(),
        json!({"on": true, "brightness": 50, "temperature": 21.5})
            .as_object()
            .unwrap()
            .clone()
    );
}

#[test]
fn test_build_rejects_invalid_initial_value() {
    let err = Thing::builder("lamp")
        .property(
            "brightness",
            IntegerValidator::new(Constraints::new().maximum(100u8)),
            json!(500),
        )
        .build()
        .unwrap_err();

    assert!(matches!(err, ThingError::InvalidValue { ref name, .. } if name == "brightness"));
}

#[test]
fn test_build_rejects_duplicate_names() {
    let err = Thing::builder("lamp")
        .property("on", BooleanValidator::new(), json!(true))
        .property("on", BooleanValidator::new(), json!(false))
        .build()
        .unwrap_err();
    assert_eq!(err, ThingError::DuplicateName("on".to_string()));

    let err = Thing::builder("lamp")
        .event("overheated")
        .event("overheated")
        .build()
        .unwrap_err();
    assert_eq!(err, ThingError::DuplicateName("overheated".to_string()));
}

#[test]
fn test_accessor_property_is_not_validated_at_build() {
    let thing = Thing::builder("lamp")
        .property_with_accessor(
            "level",
            IntegerValidator::<i32>::default(),
            ValueCell::new(ThingValue::Null),
        )
        .build()
        .unwrap();

    assert_eq!(thing.get_property("level").unwrap(), ThingValue::Null);
    assert_eq!(thing.set_property("level", &json!(-3)).unwrap(), ThingValue::Integer(-3));
}

#[test]
fn test_property_errors_map_to_boundary_errors() {
    let thing = lamp();

    assert_eq!(
        thing.get_property("color"),
        Err(ThingError::PropertyNotFound("color".to_string()))
    );
    assert_eq!(
        thing.set_property("temperature", &json!(30)),
        Err(ThingError::ReadOnly("temperature".to_string()))
    );
    assert!(matches!(
        thing.set_property("brightness", &json!("bright")),
        Err(ThingError::InvalidValue { .. })
    ));
}

#[test]
fn test_action_errors_map_to_boundary_errors() {
    let thing = lamp();

    assert_eq!(
        thing.create_action("dance", &json!(null)).unwrap_err(),
        ThingError::ActionNotFound("dance".to_string())
    );
    assert!(matches!(
        thing.create_action("reboot", &json!("now")),
        Err(ThingError::InvalidInput { ref action, .. }) if action == "reboot"
    ));

    let unknown = Uuid::now_v7();
    assert_eq!(
        thing.get_action("reboot", &unknown).unwrap_err(),
        ThingError::ActionIdNotFound(unknown.to_string())
    );
    assert_eq!(
        thing.get_action("dance", &unknown).unwrap_err(),
        ThingError::ActionNotFound("dance".to_string())
    );
}

#[test]
fn test_remove_action_cancels_and_forgets() {
    let thing = lamp();
    let info = thing.create_action("reboot", &json!(null)).unwrap();
    thing.actions().append(&info).unwrap();

    let removed = thing.remove_action("reboot", &info.id()).unwrap();
    assert!(removed.is_cancelled());
    assert!(thing.actions().history("reboot").unwrap().is_empty());
    assert!(matches!(
        thing.remove_action("reboot", &info.id()),
        Err(ThingError::ActionIdNotFound(_))
    ));
}

#[test]
fn test_event_history_is_bounded() {
    let thing = lamp();

    for level in 0..3 {
        thing.raise_event("overheated", json!(level)).unwrap();
    }

    let history = thing.events().history("overheated").unwrap();
    let data: Vec<_> = history.iter().map(|record| record.data.clone()).collect();
    assert_eq!(data, vec![json!(1), json!(2)]);

    assert_eq!(
        thing.raise_event("exploded", json!(null)),
        Err(ThingError::EventNotFound("exploded".to_string()))
    );
}

#[test]
fn test_describe_links_every_interaction() {
    let description = lamp().describe();

    assert_eq!(description["id"], json!("lamp"));
    assert_eq!(description["title"], json!("My Lamp"));
    assert_eq!(
        description["properties"]["brightness"]["links"][0]["href"],
        json!("/things/lamp/properties/brightness")
    );
    assert_eq!(description["properties"]["temperature"]["readOnly"], json!(true));
    assert_eq!(
        description["actions"]["reboot"]["links"][0]["href"],
        json!("/things/lamp/actions/reboot")
    );
    assert_eq!(
        description["events"]["overheated"]["links"][0]["href"],
        json!("/things/lamp/events/overheated")
    );
}

#[tokio::test]
async fn test_subscribe_unsubscribe_and_close() {
    let thing = lamp();
    let (subscriber, mut outbox) = ChannelSubscriber::new(8);
    let id = thing.subscribe(Arc::new(subscriber));

    thing.set_property("on", &json!(false)).unwrap();
    let message = outbox.recv().await.unwrap();
    assert!(message.contains("propertyStatus"));

    assert!(thing.unsubscribe(&id));
    assert!(!thing.unsubscribe(&id));

    let (again, _outbox) = ChannelSubscriber::new(8);
    thing.subscribe(Arc::new(again));
    let pending = thing.create_action("reboot", &json!(null)).unwrap();
    thing.actions().append(&pending).unwrap();

    thing.close();
    assert!(thing.subscribers().is_empty());
    assert!(pending.is_cancelled());
}

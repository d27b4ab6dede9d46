use super::*;
use crate::action::{handler_fn, ActionContext, ActionDefinition, Services};
use crate::config::ActionsConfig;
use crate::registry::ThingRegistry;
use crate::service::ThingService;
use crate::thing::Thing;
use crate::validation::{BooleanValidator, Constraints, IntegerValidator, NumberValidator};
use serde_json::{json, Value};
use std::sync::Arc;

async fn succeed(_ctx: ActionContext) -> anyhow::Result<()> {
    Ok(())
}

fn manager() -> (ConnectionManager, Arc<Thing>, Arc<ThingService>) {
    let thing = Thing::builder("lamp")
        .property("on", BooleanValidator::new(), json!(false))
        .read_only_property(
            "temperature",
            NumberValidator::<f64>::default(),
            json!(20.0),
        )
        .action(
            ActionDefinition::new("fade", handler_fn(succeed)).parameter(
                "brightness",
                IntegerValidator::new(Constraints::new().maximum(100u8)),
            ),
        )
        .event("overheated")
        .build()
        .unwrap();

    let service = Arc::new(ThingService::start(
        ThingRegistry::single(Arc::clone(&thing)),
        &ActionsConfig::default(),
        Services::new(),
    ));

    let manager = ConnectionManager::new(Arc::clone(&thing), Arc::clone(&service), 8);
    (manager, thing, service)
}

fn parse(reply: &str) -> Value {
    serde_json::from_str(reply).unwrap()
}

#[test]
fn test_client_message_parsing() {
    let msg: ClientMessage =
        serde_json::from_str(r#"{"messageType":"setProperty","data":{"on":true}}"#).unwrap();
    match msg {
        ClientMessage::SetProperty(data) => assert_eq!(data["on"], json!(true)),
        other => panic!("unexpected message {:?}", other),
    }

    let msg: ClientMessage = serde_json::from_str(
        r#"{"messageType":"requestAction","data":{"fade":{"input":{"brightness":10}}}}"#,
    )
    .unwrap();
    assert!(matches!(msg, ClientMessage::RequestAction(_)));

    assert!(serde_json::from_str::<ClientMessage>(r#"{"messageType":"reboot","data":{}}"#).is_err());
}

#[test]
fn test_error_message_shape() {
    let msg = ErrorMessage::new(axum::http::StatusCode::BAD_REQUEST, "Invalid property");
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({
            "messageType": "error",
            "data": {"status": "400 Bad Request", "message": "Invalid property"}
        })
    );
}

#[tokio::test]
async fn test_set_property_replies_only_on_error() {
    let (manager, thing, service) = manager();

    let replies = manager
        .handle_client_message(r#"{"messageType":"setProperty","data":{"on":true}}"#)
        .await;
    assert!(replies.is_empty());
    assert_eq!(thing.property_values()["on"], json!(true));

    let replies = manager
        .handle_client_message(r#"{"messageType":"setProperty","data":{"temperature":30}}"#)
        .await;
    assert_eq!(replies.len(), 1);
    let reply = parse(&replies[0]);
    assert_eq!(reply["messageType"], json!("error"));
    assert_eq!(reply["data"]["status"], json!("403 Forbidden"));

    service.shutdown().await;
}

#[tokio::test]
async fn test_get_property_replies_with_status() {
    let (manager, _thing, service) = manager();

    let replies = manager
        .handle_client_message(r#"{"messageType":"getProperty","data":{"on":null,"color":null}}"#)
        .await;

    let parsed: Vec<Value> = replies.iter().map(|r| parse(r)).collect();
    assert!(parsed
        .iter()
        .any(|r| r["messageType"] == json!("error") && r["data"]["status"] == json!("404 Not Found")));
    assert!(parsed
        .iter()
        .any(|r| r["messageType"] == json!("propertyStatus") && r["data"]["on"] == json!(false)));

    service.shutdown().await;
}

#[tokio::test]
async fn test_request_action_over_socket() {
    let (manager, thing, service) = manager();

    let replies = manager
        .handle_client_message(
            r#"{"messageType":"requestAction","data":{"fade":{"input":{"brightness":10}}}}"#,
        )
        .await;
    assert!(replies.is_empty());
    assert_eq!(thing.actions().history("fade").unwrap().len(), 1);

    let replies = manager
        .handle_client_message(
            r#"{"messageType":"requestAction","data":{"fade":{"input":{"brightness":500}}}}"#,
        )
        .await;
    assert_eq!(parse(&replies[0])["data"]["status"], json!("400 Bad Request"));
    assert_eq!(thing.actions().history("fade").unwrap().len(), 1);

    service.shutdown().await;
}

#[tokio::test]
async fn test_event_subscription_and_bad_messages() {
    let (manager, _thing, service) = manager();

    let replies = manager
        .handle_client_message(r#"{"messageType":"addEventSubscription","data":{"overheated":{}}}"#)
        .await;
    assert!(replies.is_empty());

    let replies = manager
        .handle_client_message(r#"{"messageType":"addEventSubscription","data":{"melted":{}}}"#)
        .await;
    assert_eq!(parse(&replies[0])["data"]["status"], json!("404 Not Found"));

    let replies = manager.handle_client_message("not json").await;
    assert_eq!(parse(&replies[0])["data"]["status"], json!("400 Bad Request"));

    service.shutdown().await;
}

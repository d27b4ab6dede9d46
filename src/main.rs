use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;
use webthing::action::{handler_fn, ActionContext, ActionDefinition, Services};
use webthing::api::{create_router, ApiState};
use webthing::config::{load_config, WebThingConfig};
use webthing::registry::ThingRegistry;
use webthing::service::ThingService;
use webthing::thing::{Thing, ThingError};
use webthing::validation::{BooleanValidator, Constraints, IntegerValidator, NumberValidator};

/// Fade the lamp to a brightness over a duration in milliseconds
async fn fade(ctx: ActionContext) -> anyhow::Result<()> {
    let brightness = ctx
        .input
        .get("brightness")
        .and_then(|v| v.as_u64())
        .unwrap_or(100);
    let duration = ctx
        .input
        .get("duration")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(duration)) => {}
        _ = ctx.cancellation.cancelled() => return Ok(()),
    }

    ctx.thing
        .set_property("brightness", &json!(brightness))
        .context("Failed to apply faded brightness")?;

    if brightness > 90 {
        ctx.thing.raise_event("overheated", json!(brightness))?;
    }
    Ok(())
}

/// Demo Thing: a dimmable lamp with a `fade` action and an `overheated` event
fn build_lamp(event_history: usize) -> Result<Arc<Thing>, ThingError> {
    let fade_action = ActionDefinition::new("fade", handler_fn(fade))
        .parameter(
            "brightness",
            IntegerValidator::new(Constraints::new().minimum(0u8).maximum(100)),
        )
        .parameter(
            "duration",
            IntegerValidator::new(Constraints::new().minimum(1u32)),
        );

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
            NumberValidator::new(Constraints::new().minimum(-40.0f64).maximum(125.0)),
            json!(21.5),
        )
        .action(fade_action)
        .event("overheated")
        .event_history(event_history)
        .build()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webthing=info".into()),
        )
        .init();

    info!("WebThing starting...");

    let mut config = match std::env::var("WEBTHING_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => WebThingConfig::default(),
    };
    config.apply_env_overrides();

    info!(
        bind = %config.server.bind,
        workers = config.actions.workers,
        queue_capacity = ?config.actions.bounded_capacity(),
        "Configuration loaded"
    );

    let lamp = build_lamp(config.notify.event_history).context("Failed to build lamp")?;
    let registry = if config.registry.strict_single {
        ThingRegistry::single_strict(lamp)
    } else {
        ThingRegistry::single(lamp)
    };

    let service = Arc::new(ThingService::start(
        registry,
        &config.actions,
        Services::new(),
    ));

    let state = Arc::new(ApiState {
        service: Arc::clone(&service),
        subscriber_buffer: config.notify.subscriber_buffer,
    });
    let router = create_router(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!(bind = %config.server.bind, "WebThing API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "WebThing API server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    // Graceful shutdown
    server_handle.abort();
    service.shutdown().await;
    info!("WebThing stopped");

    Ok(())
}

//! Axum HTTP API
//!
//! The host-facing surface of the bridge: vehicle and entity reads from the
//! coordinator cache, the four remote services, per-entity action routes and
//! an SSE status stream. Handlers never talk to the cloud API directly;
//! everything goes through the command dispatchers or the cache.

pub mod logs;

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, watch};
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::bridge::{BridgeContext, BridgeSnapshot};
use crate::commands;
use crate::entities;
use crate::error::Result;
use crate::logging::get_logger;
use crate::weconnect::{ControlOperation, MaxChargeCurrent, VehicleSnapshot};

#[derive(Clone)]
pub struct AppState {
    pub ctx: BridgeContext,
    pub snapshot_rx: watch::Receiver<Arc<BridgeSnapshot>>,
    pub status_tx: broadcast::Sender<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartStopChargingBody {
    pub vin: String,
    pub start_stop: String,
}

#[derive(Debug, Deserialize)]
pub struct SetClimatisationBody {
    pub vin: String,
    pub start_stop: String,
    #[serde(default)]
    pub target_temp: f64,
}

#[derive(Debug, Deserialize)]
pub struct SetTargetSocBody {
    pub vin: String,
    #[serde(default)]
    pub target_soc: f64,
}

#[derive(Debug, Deserialize)]
pub struct SetAcChargeSpeedBody {
    pub vin: String,
    pub maximum_reduced: String,
}

#[derive(Debug, Deserialize)]
pub struct NumberWriteBody {
    pub value: f64,
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot_rx.borrow().clone();
    Json(snapshot.as_ref().clone())
}

async fn vehicles(State(state): State<AppState>) -> impl IntoResponse {
    let list = state.ctx.coordinator.cached();
    Json(list.as_ref().clone())
}

fn find_vehicle(state: &AppState, vin: &str) -> Option<VehicleSnapshot> {
    state
        .ctx
        .coordinator
        .cached()
        .iter()
        .find(|v| v.vin == vin)
        .cloned()
}

async fn vehicle(State(state): State<AppState>, Path(vin): Path<String>) -> Response {
    match find_vehicle(&state, &vin) {
        Some(v) => Json(v).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "unknown vin"})),
        )
            .into_response(),
    }
}

async fn vehicle_entities(State(state): State<AppState>, Path(vin): Path<String>) -> Response {
    match find_vehicle(&state, &vin) {
        Some(v) => Json(entities::vehicle_entities(&v)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "unknown vin"})),
        )
            .into_response(),
    }
}

/// Map a dispatcher verdict onto the service response contract: guard skips
/// count as success, only a failed send turns into an upstream error.
fn service_response(sent: bool, error_line: &str) -> (StatusCode, Json<serde_json::Value>) {
    if sent {
        (StatusCode::OK, Json(json!({"ok": true})))
    } else {
        get_logger("web").error(error_line);
        (StatusCode::BAD_GATEWAY, Json(json!({"ok": false})))
    }
}

async fn start_stop_charging(
    State(state): State<AppState>,
    Json(body): Json<StartStopChargingBody>,
) -> impl IntoResponse {
    let Some(operation) = ControlOperation::parse(&body.start_stop) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "start_stop must be start or stop"})),
        );
    };
    let sent =
        commands::start_stop_charging(&body.vin, state.ctx.gateway.as_ref(), operation).await;
    service_response(sent, "Cannot send charging request to car")
}

async fn set_climatisation(
    State(state): State<AppState>,
    Json(body): Json<SetClimatisationBody>,
) -> impl IntoResponse {
    let operation = match body.start_stop.to_ascii_lowercase().as_str() {
        "none" => None,
        other => match ControlOperation::parse(other) {
            Some(op) => Some(op),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "start_stop must be start, stop or none"})),
                );
            }
        },
    };
    let sent = commands::set_climatisation(
        &body.vin,
        state.ctx.gateway.as_ref(),
        operation,
        body.target_temp,
    )
    .await;
    service_response(sent, "Cannot send climate request to car")
}

async fn set_target_soc(
    State(state): State<AppState>,
    Json(body): Json<SetTargetSocBody>,
) -> impl IntoResponse {
    let sent =
        commands::set_target_soc(&body.vin, state.ctx.gateway.as_ref(), body.target_soc as i64)
            .await;
    service_response(sent, "Cannot send target soc request to car")
}

async fn set_ac_charge_speed(
    State(state): State<AppState>,
    Json(body): Json<SetAcChargeSpeedBody>,
) -> impl IntoResponse {
    let speed = MaxChargeCurrent::from_label(&body.maximum_reduced);
    if speed == MaxChargeCurrent::Unknown {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "maximum_reduced must be maximum or reduced"})),
        );
    }
    let sent = commands::set_ac_charging_speed(&body.vin, state.ctx.gateway.as_ref(), speed).await;
    service_response(sent, "Cannot send ac speed request to car")
}

async fn press_button(
    State(state): State<AppState>,
    Path((vin, key)): Path<(String, String)>,
) -> impl IntoResponse {
    match entities::button::press(&vin, &key, state.ctx.gateway.as_ref()).await {
        Some(sent) => service_response(sent, &format!("Button {} press failed for {}", key, vin)),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "unknown button"})),
        ),
    }
}

async fn write_number(
    State(state): State<AppState>,
    Path((vin, key)): Path<(String, String)>,
    Json(body): Json<NumberWriteBody>,
) -> impl IntoResponse {
    match entities::number::set_value(&vin, &key, body.value, state.ctx.gateway.as_ref()).await {
        Some(sent) => service_response(sent, &format!("Number {} write failed for {}", key, vin)),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "unknown number"})),
        ),
    }
}

async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let rx = state.status_tx.subscribe();
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok::<Event, Infallible>(
            Event::default().event("status").data(payload),
        )),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let mut json = serde_json::to_value(state.ctx.config.as_ref())
        .unwrap_or_else(|_| json!({"error": "serialization"}));
    if let Some(account) = json.get_mut("account").and_then(|v| v.as_object_mut())
        && account.contains_key("password")
    {
        account["password"] = json!("***");
    }
    Json(json)
}

async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(crate::config::Config);
    Json(serde_json::to_value(&schema).unwrap_or_else(|_| json!({"error": "schema"})))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/vehicles", get(vehicles))
        .route("/api/vehicles/{vin}", get(vehicle))
        .route("/api/vehicles/{vin}/entities", get(vehicle_entities))
        .route("/api/vehicles/{vin}/buttons/{key}/press", post(press_button))
        .route("/api/vehicles/{vin}/numbers/{key}", post(write_number))
        .route("/api/services/start_stop_charging", post(start_stop_charging))
        .route("/api/services/set_climatisation", post(set_climatisation))
        .route("/api/services/set_target_soc", post(set_target_soc))
        .route("/api/services/set_ac_charge_speed", post(set_ac_charge_speed))
        .route("/api/events", get(events))
        .route("/api/config", get(get_config))
        .route("/api/config/schema", get(get_config_schema))
        .merge(logs::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let logger = get_logger("web");
    let router = build_router(state);

    let (addr, parsed_ok): (SocketAddr, bool) = match host.parse::<IpAddr>() {
        Ok(ip) => (SocketAddr::new(ip, port), true),
        Err(_) => (([127, 0, 0, 1], port).into(), false),
    };
    if !parsed_ok {
        logger.warn(&format!(
            "Invalid host '{}'; falling back to 127.0.0.1",
            host
        ));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{}",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}

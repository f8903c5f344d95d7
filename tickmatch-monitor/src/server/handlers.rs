use actix_web::{
    get, post,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::Deserialize;
use tickmatch_data::shared::de::de_lowercase;
use tickmatch_data::shared::subscription_models::Instrument;
use tokio::{
    sync::Mutex,
    time::{timeout, Duration},
};

use crate::server::{server_channels::ServerHttpChannel, MonitorHttpRequest, MonitorHttpResponse};
use crate::spread_monitor::config::ConfigUpdate;

const DEFAULT_HISTORY_LIMIT: usize = 100;

/*----- */
// Request plumbing
/*----- */
// Send a request to the monitor and wait briefly for its reply. Instrument
// lookups that miss map to 404 and rejected config updates to 400,
// everything else is returned as-is.
async fn request_monitor(
    channel_data: Data<Mutex<ServerHttpChannel>>,
    request: MonitorHttpRequest,
) -> HttpResponse {
    let mut http_channel = channel_data.lock().await;

    // Send the request
    if http_channel.http_request_tx.send(request).is_err() {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Failed to send request to monitor"
        }));
    }

    // Wait for response with timeout
    match timeout(
        Duration::from_millis(100),
        http_channel.http_response_rx.recv(),
    )
    .await
    {
        Ok(Some(MonitorHttpResponse::UnknownInstrument(instrument))) => {
            HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("unknown instrument {instrument}")
            }))
        }
        Ok(Some(MonitorHttpResponse::ConfigRejected(violations))) => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Config update rejected",
                "violations": violations
            }))
        }
        Ok(Some(response)) => HttpResponse::Ok().json(serde_json::to_value(&response).unwrap()),
        Ok(None) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Monitor channel closed unexpectedly"
        })),
        Err(_) => HttpResponse::RequestTimeout().json(serde_json::json!({
            "error": "Request timed out after 100 milliseconds"
        })),
    }
}

/*----- */
// Query and body params
/*----- */
#[derive(Deserialize)]
struct InstrumentParams {
    #[serde(deserialize_with = "de_lowercase")]
    base: String,
    #[serde(deserialize_with = "de_lowercase")]
    quote: String,
}

#[derive(Deserialize)]
struct HistoryQueryParams {
    #[serde(deserialize_with = "de_lowercase")]
    base: String,
    #[serde(deserialize_with = "de_lowercase")]
    quote: String,
    limit: Option<usize>,
}

/*----- */
// Handler
/*----- */
#[get("/snapshots")]
pub async fn get_snapshots_handler(
    channel_data: Data<Mutex<ServerHttpChannel>>,
) -> impl Responder {
    request_monitor(channel_data, MonitorHttpRequest::GetSnapshots).await
}

#[get("/snapshot")]
pub async fn get_snapshot_handler(
    channel_data: Data<Mutex<ServerHttpChannel>>,
    query: web::Query<InstrumentParams>,
) -> impl Responder {
    let instrument = Instrument::new(query.base.clone(), query.quote.clone());
    request_monitor(channel_data, MonitorHttpRequest::GetSnapshot(instrument)).await
}

#[get("/history")]
pub async fn get_history_handler(
    channel_data: Data<Mutex<ServerHttpChannel>>,
    query: web::Query<HistoryQueryParams>,
) -> impl Responder {
    let instrument = Instrument::new(query.base.clone(), query.quote.clone());
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    request_monitor(
        channel_data,
        MonitorHttpRequest::GetHistory { instrument, limit },
    )
    .await
}

#[get("/stats")]
pub async fn get_global_stats_handler(
    channel_data: Data<Mutex<ServerHttpChannel>>,
) -> impl Responder {
    request_monitor(channel_data, MonitorHttpRequest::GetGlobalStats).await
}

#[get("/config")]
pub async fn get_config_handler(channel_data: Data<Mutex<ServerHttpChannel>>) -> impl Responder {
    request_monitor(channel_data, MonitorHttpRequest::GetConfig).await
}

#[get("/config/schema")]
pub async fn get_config_schema_handler(
    channel_data: Data<Mutex<ServerHttpChannel>>,
) -> impl Responder {
    request_monitor(channel_data, MonitorHttpRequest::GetConfigSchema).await
}

#[post("/config")]
pub async fn update_config_handler(
    channel_data: Data<Mutex<ServerHttpChannel>>,
    body: web::Json<ConfigUpdate>,
) -> impl Responder {
    request_monitor(
        channel_data,
        MonitorHttpRequest::UpdateConfig(body.into_inner()),
    )
    .await
}

#[post("/config/reset")]
pub async fn reset_config_handler(channel_data: Data<Mutex<ServerHttpChannel>>) -> impl Responder {
    request_monitor(channel_data, MonitorHttpRequest::ResetConfig).await
}

#[post("/instruments")]
pub async fn set_instruments_handler(
    channel_data: Data<Mutex<ServerHttpChannel>>,
    body: web::Json<Vec<InstrumentParams>>,
) -> impl Responder {
    let instruments = body
        .into_inner()
        .into_iter()
        .map(|params| Instrument::new(params.base, params.quote))
        .collect::<Vec<Instrument>>();

    request_monitor(
        channel_data,
        MonitorHttpRequest::SetTrackedInstruments(instruments),
    )
    .await
}

#[post("/instruments/clear")]
pub async fn clear_instrument_handler(
    channel_data: Data<Mutex<ServerHttpChannel>>,
    body: web::Json<InstrumentParams>,
) -> impl Responder {
    let params = body.into_inner();
    let instrument = Instrument::new(params.base, params.quote);

    request_monitor(channel_data, MonitorHttpRequest::ClearInstrument(instrument)).await
}

// No body resets every tracked instrument, a body scopes the reset to one
#[post("/extremes/reset")]
pub async fn reset_realtime_stats_handler(
    channel_data: Data<Mutex<ServerHttpChannel>>,
    body: Option<web::Json<InstrumentParams>>,
) -> impl Responder {
    let scope = body.map(|params| {
        let params = params.into_inner();
        Instrument::new(params.base, params.quote)
    });

    request_monitor(channel_data, MonitorHttpRequest::ResetRealtimeStats(scope)).await
}

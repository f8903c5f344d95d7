use actix_web::{web, App, HttpServer};
use tickmatch_data::shared::subscription_models::Instrument;
use tickmatch_monitor::{
    data::demo_stream::demo_quote_stream,
    server::{handlers, server_channels::make_http_channels},
    spread_monitor::monitor::SpreadMonitor,
};
use tokio::sync::{mpsc, Mutex};
use tracing::info;

/*----- */
// Main
/*----- */
#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Init
    init_logging();

    let instruments = vec![
        Instrument::new("btc", "usdt"),
        Instrument::new("eth", "usdt"),
        Instrument::new("sol", "usdt"),
    ];

    // Quote feed: synthetic two-venue stream unless disabled via env
    let quote_stream = if demo_feed_enabled() {
        info!(
            message = "Starting demo quote feed",
            instruments = instruments.len(),
        );
        demo_quote_stream(instruments.clone(), 250)
    } else {
        let (quote_tx, quote_rx) = mpsc::unbounded_channel();
        // Hold the sender open so the monitor loop stays alive with no feed
        std::mem::forget(quote_tx);
        quote_rx
    };

    // Http request channel for monitor
    let (monitor_channel, server_channel) = make_http_channels();
    let server_channel = web::Data::new(Mutex::new(server_channel));

    // Monitor
    let mut monitor = SpreadMonitor::new(quote_stream, monitor_channel);
    monitor.set_tracked_instruments(instruments);

    // Spawn monitor
    tokio::spawn(async move { monitor.run().await });

    // Http server
    HttpServer::new(move || {
        App::new()
            .app_data(server_channel.clone())
            .service(handlers::get_snapshots_handler)
            .service(handlers::get_snapshot_handler)
            .service(handlers::get_history_handler)
            .service(handlers::get_global_stats_handler)
            .service(handlers::get_config_handler)
            .service(handlers::get_config_schema_handler)
            .service(handlers::update_config_handler)
            .service(handlers::reset_config_handler)
            .service(handlers::set_instruments_handler)
            .service(handlers::clear_instrument_handler)
            .service(handlers::reset_realtime_stats_handler)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}

fn demo_feed_enabled() -> bool {
    std::env::var("TICKMATCH_DEMO_FEED")
        .map(|value| value != "0" && !value.eq_ignore_ascii_case("false"))
        .unwrap_or(true)
}

/*----- */
// Logging config
/*----- */
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        // Disable colours on release builds
        .with_ansi(cfg!(debug_assertions))
        // Enable Json formatting
        .json()
        // Install this Tracing subscriber as global default
        .init()
}

pub mod handlers;
pub mod server_channels;

use serde::Serialize;
use tickmatch_data::shared::subscription_models::Instrument;

use crate::spread_monitor::config::{ConfigSchema, ConfigUpdate, ConfigViolation, VersionedConfig};
use crate::spread_monitor::history::HistoryRecord;
use crate::spread_monitor::monitor::MarketSnapshot;
use crate::spread_monitor::stats::GlobalStats;

/*----- */
// Http requests
/*----- */
#[derive(Debug)]
pub enum MonitorHttpRequest {
    GetSnapshots,
    GetSnapshot(Instrument),
    GetHistory { instrument: Instrument, limit: usize },
    GetGlobalStats,
    GetConfig,
    GetConfigSchema,
    UpdateConfig(ConfigUpdate),
    ResetConfig,
    SetTrackedInstruments(Vec<Instrument>),
    ClearInstrument(Instrument),
    ResetRealtimeStats(Option<Instrument>),
}

/*----- */
// Http responses
/*----- */
#[derive(Debug, Serialize)]
pub enum MonitorHttpResponse {
    Snapshots(Vec<MarketSnapshot>),
    Snapshot(Box<MarketSnapshot>),
    History {
        instrument: Instrument,
        records: Vec<HistoryRecord>,
    },
    GlobalStats(Box<GlobalStats>),
    Config(VersionedConfig),
    ConfigSchema(ConfigSchema),
    ConfigUpdated(VersionedConfig),
    ConfigRejected(Vec<ConfigViolation>),
    TrackedInstrumentsSet {
        tracked: Vec<Instrument>,
    },
    InstrumentCleared(Instrument),
    RealtimeStatsReset {
        reset: usize,
    },
    UnknownInstrument(Instrument),
}

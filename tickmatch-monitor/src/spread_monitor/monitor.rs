use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use serde::Serialize;
use tickmatch_data::model::quote::QuoteEvent;
use tickmatch_data::shared::subscription_models::{ExchangeId, Instrument};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::server::{
    server_channels::MonitorHttpChannel, MonitorHttpRequest, MonitorHttpResponse,
};

use super::config::{config_schema, ConfigStore, ConfigUpdate};
use super::history::{HistoryRecord, MatchHistory};
use super::matcher::{self, MatchDecision};
use super::queue::QuoteQueue;
use super::spread::{self, SpreadPair};
use super::stats::{
    ExtremesSummary, GlobalStats, InstrumentQueueDepths, MatchStats, RealtimeExtremes,
};
use super::sweeper::{SweepTick, SweeperHandle};

/*----- */
// Matched pair
/*----- */
// The most recent accepted match for an instrument. spreads is None when
// the pair time-matched but a degenerate reference bid blocked the
// percentage computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    pub matched_at: DateTime<Utc>,
    pub time_diff_ms: i64,
    pub spreads: Option<SpreadPair>,
    pub binance: QuoteEvent,
    pub okx: QuoteEvent,
}

/*----- */
// Market snapshot - Response sent back from http request
/*----- */
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub instrument: Instrument,
    pub last_pair: Option<MatchedPair>,
    pub extremes: ExtremesSummary,
    pub stats: MatchStats,
    pub binance_queue_len: usize,
    pub okx_queue_len: usize,
    pub history_len: usize,
    pub last_update: Option<DateTime<Utc>>,
}

/*----- */
// Instrument state
/*----- */
// Everything the engine keeps for one tracked instrument. Exclusively
// owned by the monitor; dropping it aborts the instrument's sweeper.
#[derive(Debug)]
pub struct InstrumentState {
    binance_queue: QuoteQueue,
    okx_queue: QuoteQueue,
    stats: MatchStats,
    extremes: RealtimeExtremes,
    history: MatchHistory,
    last_pair: Option<MatchedPair>,
    sweeper: SweeperHandle,
}

#[derive(Debug, Default)]
pub struct InstrumentStateMap(pub HashMap<Instrument, InstrumentState>);

/*----- */
// Spread monitor
/*----- */
#[derive(Debug)]
pub struct SpreadMonitor {
    instruments: InstrumentStateMap,
    config: ConfigStore,
    sweeper_generation: u64,
    sweep_tick_tx: mpsc::UnboundedSender<SweepTick>,
    sweep_tick_rx: mpsc::UnboundedReceiver<SweepTick>,
    quote_stream: mpsc::UnboundedReceiver<QuoteEvent>,
    http_channel: MonitorHttpChannel,
}

impl SpreadMonitor {
    pub fn new(
        quote_stream: mpsc::UnboundedReceiver<QuoteEvent>,
        http_channel: MonitorHttpChannel,
    ) -> Self {
        let (sweep_tick_tx, sweep_tick_rx) = mpsc::unbounded_channel();

        Self {
            instruments: InstrumentStateMap::default(),
            config: ConfigStore::default(),
            sweeper_generation: 0,
            sweep_tick_tx,
            sweep_tick_rx,
            quote_stream,
            http_channel,
        }
    }

    fn new_instrument_state(&mut self, instrument: Instrument, period_ms: u64) -> InstrumentState {
        self.sweeper_generation += 1;

        InstrumentState {
            binance_queue: QuoteQueue::new(),
            okx_queue: QuoteQueue::new(),
            stats: MatchStats::default(),
            extremes: RealtimeExtremes::new(Utc::now()),
            history: MatchHistory::new(),
            last_pair: None,
            sweeper: SweeperHandle::spawn(
                instrument,
                self.sweeper_generation,
                period_ms,
                self.sweep_tick_tx.clone(),
            ),
        }
    }

    // Replace the tracked set: purge instruments that left, keep the state
    // of instruments that stayed, create fresh state for new ones. The
    // tracked set is the only thing that creates instrument state.
    pub fn set_tracked_instruments(&mut self, instruments: Vec<Instrument>) {
        let tracked = instruments.into_iter().collect::<HashSet<Instrument>>();

        self.instruments.0.retain(|instrument, _| {
            let keep = tracked.contains(instrument);
            if !keep {
                info!(
                    message = "Instrument removed from tracked set",
                    instrument = %instrument,
                    action = "Purging queues, statistics, history and sweeper",
                );
            }
            keep
        });

        let period_ms = self.config.current().cleanup_interval_ms;
        for instrument in tracked {
            if !self.instruments.0.contains_key(&instrument) {
                info!(
                    message = "Instrument added to tracked set",
                    instrument = %instrument,
                    action = "Creating fresh state and starting sweeper",
                );
                let state = self.new_instrument_state(instrument.clone(), period_ms);
                self.instruments.0.insert(instrument, state);
            }
        }
    }

    // Replace every sweeper with one running at the new period. State other
    // than the timer is untouched; stale ticks from the old timers are
    // filtered out by the generation stamp.
    fn restart_sweepers(&mut self, period_ms: u64) {
        for (instrument, state) in self.instruments.0.iter_mut() {
            self.sweeper_generation += 1;
            state.sweeper = SweeperHandle::spawn(
                instrument.clone(),
                self.sweeper_generation,
                period_ms,
                self.sweep_tick_tx.clone(),
            );
        }
    }

    fn process_quote(&mut self, quote: QuoteEvent) {
        if let Err(error) = quote.validate() {
            warn!(
                message = "Malformed quote rejected at ingestion",
                error = %error,
                action = "Dropping quote without queueing",
            );
            return;
        }

        let config = self.config.current().clone();
        let now = Utc::now();
        let instrument = quote.instrument.clone();
        let exchange = quote.exchange;

        let Some(state) = self.instruments.0.get_mut(&instrument) else {
            debug!(
                message = "Quote for untracked instrument",
                instrument = %instrument,
                exchange = %exchange,
                action = "Dropping quote",
            );
            return;
        };

        state.stats.record_received(exchange);

        let dropped = match exchange {
            ExchangeId::BinancePerp => state.binance_queue.push(quote, config.max_queue_size),
            ExchangeId::OkxPerp => state.okx_queue.push(quote, config.max_queue_size),
        };

        if dropped > 0 {
            debug!(
                message = "Quote queue at capacity",
                instrument = %instrument,
                exchange = %exchange,
                dropped = dropped,
            );
        }

        self.try_match(&instrument, now);
    }

    // Evaluate the newest quote from each venue. Accepted pairs stay in
    // their queues so later arrivals on the other side can pair against
    // them again.
    fn try_match(&mut self, instrument: &Instrument, now: DateTime<Utc>) {
        let config = self.config.current().clone();

        let Some(state) = self.instruments.0.get_mut(instrument) else {
            return;
        };

        let (binance, okx) = match (state.binance_queue.newest(), state.okx_queue.newest()) {
            (Some(binance), Some(okx)) => (binance.clone(), okx.clone()),
            _ => return,
        };

        match matcher::evaluate_pair(&binance, &okx, &config, now) {
            MatchDecision::Matched(times) => {
                if times.used_receive_fallback {
                    warn!(
                        message = "Venue timestamp missing on one side",
                        instrument = %instrument,
                        action = "Comparing receive times for both sides",
                    );
                }

                state.stats.record_success(times.time_diff_ms, now);
                let matched_at = binance.received_time.max(okx.received_time);

                match spread::compute_spreads(&binance, &okx) {
                    Ok(spreads) => {
                        state.extremes.observe(&spreads);
                        state.history.append(
                            HistoryRecord {
                                recorded_at: matched_at,
                                spreads,
                                time_diff_ms: times.time_diff_ms,
                                binance: binance.clone(),
                                okx: okx.clone(),
                            },
                            config.history_retention_count,
                        );
                        state.last_pair = Some(MatchedPair {
                            matched_at,
                            time_diff_ms: times.time_diff_ms,
                            spreads: Some(spreads),
                            binance,
                            okx,
                        });
                    }
                    Err(error) => {
                        warn!(
                            message = "Degenerate reference bid in matched pair",
                            instrument = %instrument,
                            error = %error,
                            action = "Skipping spread, extremes and history update",
                        );
                        state.last_pair = Some(MatchedPair {
                            matched_at,
                            time_diff_ms: times.time_diff_ms,
                            spreads: None,
                            binance,
                            okx,
                        });
                    }
                }
            }
            MatchDecision::StaleQuote { exchange, lag_ms } => {
                warn!(
                    message = "Venue timestamp lags local clock",
                    instrument = %instrument,
                    exchange = %exchange,
                    lag_ms = lag_ms,
                    action = "Skipping match attempt",
                );
            }
            MatchDecision::TimeDiffExceeded { time_diff_ms } => {
                state.stats.record_discard();
                debug!(
                    message = "Quote pair outside matching window",
                    instrument = %instrument,
                    time_diff_ms = time_diff_ms,
                    action = "Discarding match attempt and evicting expired quotes",
                );

                let max_age = Duration::milliseconds(config.data_expiration_ms as i64);
                state.binance_queue.evict_expired(now, max_age);
                state.okx_queue.evict_expired(now, max_age);
            }
        }
    }

    fn process_sweep_tick(&mut self, tick: SweepTick) {
        let config = self.config.current().clone();

        let Some(state) = self.instruments.0.get_mut(&tick.instrument) else {
            // Tick in flight from a purged instrument
            return;
        };

        if state.sweeper.generation() != tick.generation {
            // Tick in flight from a replaced timer
            return;
        }

        let now = Utc::now();
        let max_age = Duration::milliseconds(config.data_expiration_ms as i64);
        let evicted = state.binance_queue.evict_expired(now, max_age)
            + state.okx_queue.evict_expired(now, max_age);

        if evicted > 0 {
            debug!(
                message = "Sweeper evicted expired quotes",
                instrument = %tick.instrument,
                evicted = evicted,
            );
        }
    }

    fn market_snapshot(instrument: &Instrument, state: &InstrumentState) -> MarketSnapshot {
        MarketSnapshot {
            instrument: instrument.clone(),
            last_pair: state.last_pair.clone(),
            extremes: state.extremes.summary(),
            stats: state.stats.clone(),
            binance_queue_len: state.binance_queue.len(),
            okx_queue_len: state.okx_queue.len(),
            history_len: state.history.len(),
            last_update: state.last_pair.as_ref().map(|pair| pair.matched_at),
        }
    }

    fn global_stats(&self) -> GlobalStats {
        let mut total_received = 0;
        let mut total_matches = 0;
        let mut total_discards = 0;

        for state in self.instruments.0.values() {
            total_received += state.stats.received_total();
            total_matches += state.stats.success_count;
            total_discards += state.stats.discard_count;
        }

        let queue_details = self
            .instruments
            .0
            .iter()
            .map(|(instrument, state)| InstrumentQueueDepths {
                instrument: instrument.clone(),
                binance_depth: state.binance_queue.len(),
                okx_depth: state.okx_queue.len(),
            })
            .sorted_by(|a, b| a.instrument.cmp(&b.instrument))
            .collect::<Vec<InstrumentQueueDepths>>();

        GlobalStats {
            tracked_instruments: self.instruments.0.len(),
            total_received,
            total_matches,
            total_discards,
            queue_details,
        }
    }

    fn process_http_request(&mut self, request: MonitorHttpRequest) {
        match request {
            MonitorHttpRequest::GetSnapshots => {
                let snapshots = self
                    .instruments
                    .0
                    .iter()
                    .map(|(instrument, state)| Self::market_snapshot(instrument, state))
                    .sorted_by(|a, b| a.instrument.cmp(&b.instrument))
                    .collect::<Vec<MarketSnapshot>>();

                let _ = self
                    .http_channel
                    .http_response_tx
                    .send(MonitorHttpResponse::Snapshots(snapshots));
            }
            MonitorHttpRequest::GetSnapshot(instrument) => {
                let response = match self.instruments.0.get(&instrument) {
                    Some(state) => MonitorHttpResponse::Snapshot(Box::new(Self::market_snapshot(
                        &instrument,
                        state,
                    ))),
                    None => MonitorHttpResponse::UnknownInstrument(instrument),
                };
                let _ = self.http_channel.http_response_tx.send(response);
            }
            MonitorHttpRequest::GetHistory { instrument, limit } => {
                let response = match self.instruments.0.get(&instrument) {
                    Some(state) => MonitorHttpResponse::History {
                        instrument,
                        records: state.history.recent(limit),
                    },
                    None => MonitorHttpResponse::UnknownInstrument(instrument),
                };
                let _ = self.http_channel.http_response_tx.send(response);
            }
            MonitorHttpRequest::GetGlobalStats => {
                let _ = self
                    .http_channel
                    .http_response_tx
                    .send(MonitorHttpResponse::GlobalStats(Box::new(
                        self.global_stats(),
                    )));
            }
            MonitorHttpRequest::GetConfig => {
                let _ = self
                    .http_channel
                    .http_response_tx
                    .send(MonitorHttpResponse::Config(self.config.snapshot()));
            }
            MonitorHttpRequest::GetConfigSchema => {
                let _ = self
                    .http_channel
                    .http_response_tx
                    .send(MonitorHttpResponse::ConfigSchema(config_schema()));
            }
            MonitorHttpRequest::UpdateConfig(update) => self.process_config_update(update),
            MonitorHttpRequest::ResetConfig => {
                let changed = self.config.reset();
                if changed.cleanup_interval_changed {
                    self.restart_sweepers(changed.config.cleanup_interval_ms);
                }

                info!(
                    message = "Configuration reset to defaults",
                    version = changed.version,
                );

                let _ = self
                    .http_channel
                    .http_response_tx
                    .send(MonitorHttpResponse::ConfigUpdated(self.config.snapshot()));
            }
            MonitorHttpRequest::SetTrackedInstruments(instruments) => {
                self.set_tracked_instruments(instruments);

                let tracked = self
                    .instruments
                    .0
                    .keys()
                    .cloned()
                    .sorted()
                    .collect::<Vec<Instrument>>();

                let _ = self
                    .http_channel
                    .http_response_tx
                    .send(MonitorHttpResponse::TrackedInstrumentsSet { tracked });
            }
            MonitorHttpRequest::ClearInstrument(instrument) => {
                let response = match self.instruments.0.get_mut(&instrument) {
                    Some(state) => {
                        // Wipe the data, keep the instrument tracked and its
                        // sweeper running
                        state.binance_queue = QuoteQueue::new();
                        state.okx_queue = QuoteQueue::new();
                        state.stats = MatchStats::default();
                        state.extremes.reset(Utc::now());
                        state.history = MatchHistory::new();
                        state.last_pair = None;

                        info!(
                            message = "Instrument data cleared",
                            instrument = %instrument,
                        );
                        MonitorHttpResponse::InstrumentCleared(instrument)
                    }
                    None => MonitorHttpResponse::UnknownInstrument(instrument),
                };
                let _ = self.http_channel.http_response_tx.send(response);
            }
            MonitorHttpRequest::ResetRealtimeStats(scope) => {
                let now = Utc::now();
                let response = match scope {
                    Some(instrument) => match self.instruments.0.get_mut(&instrument) {
                        Some(state) => {
                            state.extremes.reset(now);
                            MonitorHttpResponse::RealtimeStatsReset { reset: 1 }
                        }
                        None => MonitorHttpResponse::UnknownInstrument(instrument),
                    },
                    None => {
                        let mut reset = 0;
                        for state in self.instruments.0.values_mut() {
                            state.extremes.reset(now);
                            reset += 1;
                        }
                        MonitorHttpResponse::RealtimeStatsReset { reset }
                    }
                };
                let _ = self.http_channel.http_response_tx.send(response);
            }
        }
    }

    fn process_config_update(&mut self, update: ConfigUpdate) {
        match self.config.safe_update(update) {
            Ok(changed) => {
                if changed.cleanup_interval_changed {
                    self.restart_sweepers(changed.config.cleanup_interval_ms);
                }

                info!(
                    message = "Configuration updated",
                    version = changed.version,
                    cleanup_interval_changed = changed.cleanup_interval_changed,
                );

                let _ = self
                    .http_channel
                    .http_response_tx
                    .send(MonitorHttpResponse::ConfigUpdated(self.config.snapshot()));
            }
            Err(rejected) => {
                warn!(
                    message = "Configuration update rejected",
                    violations = rejected.0.len(),
                    action = "Leaving configuration unchanged",
                );

                let _ = self
                    .http_channel
                    .http_response_tx
                    .send(MonitorHttpResponse::ConfigRejected(rejected.0));
            }
        }
    }

    pub async fn run(mut self) {
        'spread_monitor: loop {
            tokio::select! {
                quote = self.quote_stream.recv() => match quote {
                    Some(quote) => self.process_quote(quote),
                    None => {
                        warn!(
                            message = "Quote stream for spread monitor has disconnected",
                            action = "Breaking Spread Monitor loop",
                        );
                        break 'spread_monitor;
                    }
                },
                tick = self.sweep_tick_rx.recv() => match tick {
                    Some(tick) => self.process_sweep_tick(tick),
                    None => {
                        warn!(
                            message = "Sweep tick channel has disconnected",
                            action = "Breaking Spread Monitor loop",
                        );
                        break 'spread_monitor;
                    }
                },
                request = self.http_channel.http_request_rx.recv() => match request {
                    Some(request) => self.process_http_request(request),
                    None => {
                        warn!(
                            message = "Http request channel has disconnected",
                            action = "Breaking Spread Monitor loop",
                        );
                        break 'spread_monitor;
                    }
                },
            }
        }
    }
}

/*----- */
// Test
/*----- */

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tickmatch_data::shared::subscription_models::{ExchangeId, Instrument};

use super::spread::SpreadPair;

// Accepted time differences kept for the rolling mean
const TIME_DIFF_WINDOW: usize = 100;

/*----- */
// Realtime extremes
/*----- */
// Running best spread per direction plus the worst value seen either way,
// kept since the instrument was activated. Seeded to infinity sentinels so
// the first observation always lands; only tightened afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealtimeExtremes {
    pub max_buy_binance_sell_okx: f64,
    pub max_sell_binance_buy_okx: f64,
    pub max_adverse: f64,
    pub tracking_since: DateTime<Utc>,
}

impl RealtimeExtremes {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            max_buy_binance_sell_okx: f64::NEG_INFINITY,
            max_sell_binance_buy_okx: f64::NEG_INFINITY,
            max_adverse: f64::INFINITY,
            tracking_since: now,
        }
    }

    // Each tracker moves independently: one spread pair can set a new
    // directional record and a new adverse record at once.
    pub fn observe(&mut self, spreads: &SpreadPair) {
        if spreads.buy_binance_sell_okx > self.max_buy_binance_sell_okx {
            self.max_buy_binance_sell_okx = spreads.buy_binance_sell_okx;
        }

        if spreads.sell_binance_buy_okx > self.max_sell_binance_buy_okx {
            self.max_sell_binance_buy_okx = spreads.sell_binance_buy_okx;
        }

        let adverse = spreads
            .buy_binance_sell_okx
            .min(spreads.sell_binance_buy_okx);
        if adverse < self.max_adverse {
            self.max_adverse = adverse;
        }
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }

    // Sentinels serialize as null rather than as infinities.
    pub fn summary(&self) -> ExtremesSummary {
        ExtremesSummary {
            max_buy_binance_sell_okx: self
                .max_buy_binance_sell_okx
                .is_finite()
                .then_some(self.max_buy_binance_sell_okx),
            max_sell_binance_buy_okx: self
                .max_sell_binance_buy_okx
                .is_finite()
                .then_some(self.max_sell_binance_buy_okx),
            max_adverse: self.max_adverse.is_finite().then_some(self.max_adverse),
            tracking_since: self.tracking_since,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtremesSummary {
    pub max_buy_binance_sell_okx: Option<f64>,
    pub max_sell_binance_buy_okx: Option<f64>,
    pub max_adverse: Option<f64>,
    pub tracking_since: DateTime<Utc>,
}

/*----- */
// Match stats
/*----- */
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchStats {
    pub received_binance: u64,
    pub received_okx: u64,
    pub success_count: u64,
    pub discard_count: u64,
    pub last_match_time: Option<DateTime<Utc>>,
    pub avg_time_diff_ms: f64,
    #[serde(skip)]
    time_diffs: VecDeque<i64>,
}

impl MatchStats {
    pub fn record_received(&mut self, exchange: ExchangeId) {
        match exchange {
            ExchangeId::BinancePerp => self.received_binance += 1,
            ExchangeId::OkxPerp => self.received_okx += 1,
        }
    }

    pub fn record_success(&mut self, time_diff_ms: i64, now: DateTime<Utc>) {
        self.success_count += 1;
        self.last_match_time = Some(now);

        self.time_diffs.push_back(time_diff_ms);
        if self.time_diffs.len() > TIME_DIFF_WINDOW {
            self.time_diffs.pop_front();
        }
        self.avg_time_diff_ms =
            self.time_diffs.iter().sum::<i64>() as f64 / self.time_diffs.len() as f64;
    }

    pub fn record_discard(&mut self) {
        self.discard_count += 1;
    }

    pub fn received_total(&self) -> u64 {
        self.received_binance + self.received_okx
    }
}

/*----- */
// Global stats
/*----- */
// Aggregates are never stored: they are re-derived by scanning every
// instrument's counters, so the per-instrument and global views cannot
// drift apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStats {
    pub tracked_instruments: usize,
    pub total_received: u64,
    pub total_matches: u64,
    pub total_discards: u64,
    pub queue_details: Vec<InstrumentQueueDepths>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentQueueDepths {
    pub instrument: Instrument,
    pub binance_depth: usize,
    pub okx_depth: usize,
}

/*----- */
// Test
/*----- */

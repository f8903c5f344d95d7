use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tickmatch_data::model::quote::QuoteEvent;

use super::spread::SpreadPair;

/*----- */
// History record
/*----- */
// One accepted match, frozen: both full quotes, the spreads they produced
// and the realized timestamp gap. recorded_at is the later of the two
// receive times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub recorded_at: DateTime<Utc>,
    pub spreads: SpreadPair,
    pub time_diff_ms: i64,
    pub binance: QuoteEvent,
    pub okx: QuoteEvent,
}

/*----- */
// Match history
/*----- */
#[derive(Debug, Clone, Default)]
pub struct MatchHistory {
    data: VecDeque<HistoryRecord>,
}

impl MatchHistory {
    pub fn new() -> Self {
        Self {
            data: VecDeque::new(),
        }
    }

    // Append a record, then trim a single block off the head if the cap is
    // exceeded. The cap is read per call so retention changes apply on the
    // next append.
    pub fn append(&mut self, record: HistoryRecord, retention_cap: usize) -> usize {
        self.data.push_back(record);

        let excess = self.data.len().saturating_sub(retention_cap);
        if excess > 0 {
            self.data.drain(0..excess);
        }

        excess
    }

    // The most recent `limit` records in chronological order.
    pub fn recent(&self, limit: usize) -> Vec<HistoryRecord> {
        let skip = self.data.len().saturating_sub(limit);
        self.data.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use chrono::Duration;
    use tickmatch_data::shared::subscription_models::ExchangeId;

    use super::*;
    use crate::mock_data::test_utils::{base_time, btc_usdt, quote_at};

    fn record(seq: i64) -> HistoryRecord {
        let time = base_time() + Duration::milliseconds(seq);
        HistoryRecord {
            recorded_at: time,
            spreads: SpreadPair {
                buy_binance_sell_okx: seq as f64,
                sell_binance_buy_okx: 0.0,
            },
            time_diff_ms: 0,
            binance: quote_at(ExchangeId::BinancePerp, btc_usdt(), 100.0, 101.0, time),
            okx: quote_at(ExchangeId::OkxPerp, btc_usdt(), 100.0, 101.0, time),
        }
    }

    #[test]
    fn test_append_keeps_arrival_order_under_cap() {
        let mut history = MatchHistory::new();

        for seq in 0..3 {
            assert_eq!(history.append(record(seq), 10), 0);
        }

        assert_eq!(history.len(), 3);
        let records = history.recent(10);
        assert_eq!(records[0].spreads.buy_binance_sell_okx, 0.0);
        assert_eq!(records[2].spreads.buy_binance_sell_okx, 2.0);
    }

    #[test]
    fn test_append_over_cap_keeps_most_recent() {
        let mut history = MatchHistory::new();

        for seq in 0..5 {
            history.append(record(seq), 3);
        }

        assert_eq!(history.len(), 3);
        let records = history.recent(10);
        assert_eq!(records[0].spreads.buy_binance_sell_okx, 2.0);
        assert_eq!(records[2].spreads.buy_binance_sell_okx, 4.0);
    }

    #[test]
    fn test_shrunk_cap_trims_one_block() {
        let mut history = MatchHistory::new();

        for seq in 0..5 {
            history.append(record(seq), 10);
        }

        // A retention cut applies on the next append: 6 records, cap 3,
        // one drain of 3 off the head.
        let trimmed = history.append(record(5), 3);

        assert_eq!(trimmed, 3);
        assert_eq!(history.len(), 3);
        assert_eq!(history.recent(10)[0].spreads.buy_binance_sell_okx, 3.0);
    }

    #[test]
    fn test_recent_returns_tail_window() {
        let mut history = MatchHistory::new();

        for seq in 0..4 {
            history.append(record(seq), 10);
        }

        let window = history.recent(2);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].spreads.buy_binance_sell_okx, 2.0);
        assert_eq!(window[1].spreads.buy_binance_sell_okx, 3.0);

        assert_eq!(history.recent(100).len(), 4);
    }
}

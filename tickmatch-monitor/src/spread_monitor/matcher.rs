use chrono::{DateTime, Utc};
use tickmatch_data::model::quote::QuoteEvent;
use tickmatch_data::shared::subscription_models::ExchangeId;

use super::config::{EngineConfig, TimeMatchingMode};

/*----- */
// Match decision
/*----- */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    // Both quotes lie inside the pairing window.
    Matched(MatchedTimes),
    // A venue timestamp lags the local clock beyond max_local_time_diff_ms.
    // Not a discard: the pair is skipped without touching any counter.
    StaleQuote { exchange: ExchangeId, lag_ms: i64 },
    // The quotes are too far apart in time to pair.
    TimeDiffExceeded { time_diff_ms: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedTimes {
    pub time_diff_ms: i64,
    // True when originalTimestamp mode fell back to receive times because a
    // venue timestamp was missing on either side.
    pub used_receive_fallback: bool,
}

/*----- */
// Pair evaluation
/*----- */
// Decide whether the newest quotes from both venues form a pair. Staleness
// is checked first against each venue timestamp that is present, regardless
// of the matching mode.
pub fn evaluate_pair(
    quote_a: &QuoteEvent,
    quote_b: &QuoteEvent,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> MatchDecision {
    for quote in [quote_a, quote_b] {
        if let Some(exchange_time) = quote.exchange_time {
            let lag_ms = (now - exchange_time).num_milliseconds();
            if lag_ms.abs() > config.max_local_time_diff_ms as i64 {
                return MatchDecision::StaleQuote {
                    exchange: quote.exchange,
                    lag_ms,
                };
            }
        }
    }

    let (time_a, time_b, used_receive_fallback) = select_times(quote_a, quote_b, config);
    let time_diff_ms = (time_a - time_b).num_milliseconds().abs();

    if time_diff_ms <= config.max_time_diff_ms as i64 {
        MatchDecision::Matched(MatchedTimes {
            time_diff_ms,
            used_receive_fallback,
        })
    } else {
        MatchDecision::TimeDiffExceeded { time_diff_ms }
    }
}

// In originalTimestamp mode both venue timestamps must be present. If
// either is missing the comparison drops to receive times on both sides so
// the two quotes are still measured on the same clock.
fn select_times(
    quote_a: &QuoteEvent,
    quote_b: &QuoteEvent,
    config: &EngineConfig,
) -> (DateTime<Utc>, DateTime<Utc>, bool) {
    match config.time_matching_mode {
        TimeMatchingMode::OriginalTimestamp => match (quote_a.exchange_time, quote_b.exchange_time)
        {
            (Some(time_a), Some(time_b)) => (time_a, time_b, false),
            _ => (quote_a.received_time, quote_b.received_time, true),
        },
        TimeMatchingMode::ReceiveTime => (quote_a.received_time, quote_b.received_time, false),
    }
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;
    use crate::mock_data::test_utils::{base_time, btc_usdt, quote_at, quote_with_exchange_time};

    #[test]
    fn test_receive_times_within_window_match() {
        let config = EngineConfig::default();
        let time = base_time();

        let binance = quote_at(ExchangeId::BinancePerp, btc_usdt(), 100.0, 101.0, time);
        let okx = quote_at(
            ExchangeId::OkxPerp,
            btc_usdt(),
            100.0,
            101.0,
            time + Duration::milliseconds(800),
        );

        assert_eq!(
            evaluate_pair(&binance, &okx, &config, time + Duration::milliseconds(800)),
            MatchDecision::Matched(MatchedTimes {
                time_diff_ms: 800,
                used_receive_fallback: false,
            })
        );
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let config = EngineConfig::default();
        let time = base_time();

        let binance = quote_at(ExchangeId::BinancePerp, btc_usdt(), 100.0, 101.0, time);
        let okx = quote_at(
            ExchangeId::OkxPerp,
            btc_usdt(),
            100.0,
            101.0,
            time + Duration::milliseconds(1000),
        );

        let decision = evaluate_pair(&binance, &okx, &config, time + Duration::milliseconds(1000));
        assert!(matches!(decision, MatchDecision::Matched(_)));
    }

    #[test]
    fn test_receive_times_beyond_window_discard() {
        let config = EngineConfig::default();
        let time = base_time();

        let binance = quote_at(ExchangeId::BinancePerp, btc_usdt(), 100.0, 101.0, time);
        let okx = quote_at(
            ExchangeId::OkxPerp,
            btc_usdt(),
            100.0,
            101.0,
            time + Duration::milliseconds(1500),
        );

        assert_eq!(
            evaluate_pair(&binance, &okx, &config, time + Duration::milliseconds(1500)),
            MatchDecision::TimeDiffExceeded { time_diff_ms: 1500 }
        );
    }

    #[test]
    fn test_stale_venue_timestamp_short_circuits() {
        let config = EngineConfig::default();
        let time = base_time();
        let now = time + Duration::milliseconds(600);

        // Receive times are identical, but the binance venue timestamp lags
        // the local clock by 600ms > 500ms.
        let binance =
            quote_with_exchange_time(ExchangeId::BinancePerp, btc_usdt(), 100.0, 101.0, time, now);
        let okx = quote_with_exchange_time(ExchangeId::OkxPerp, btc_usdt(), 100.0, 101.0, now, now);

        assert_eq!(
            evaluate_pair(&binance, &okx, &config, now),
            MatchDecision::StaleQuote {
                exchange: ExchangeId::BinancePerp,
                lag_ms: 600,
            }
        );
    }

    #[test]
    fn test_stale_check_skipped_without_venue_timestamp() {
        let config = EngineConfig::default();
        let time = base_time();
        // Quotes received long before `now`: no venue timestamps, so no
        // staleness verdict is possible and receive times decide.
        let now = time + Duration::milliseconds(30_000);

        let binance = quote_at(ExchangeId::BinancePerp, btc_usdt(), 100.0, 101.0, time);
        let okx = quote_at(
            ExchangeId::OkxPerp,
            btc_usdt(),
            100.0,
            101.0,
            time + Duration::milliseconds(100),
        );

        assert!(matches!(
            evaluate_pair(&binance, &okx, &config, now),
            MatchDecision::Matched(_)
        ));
    }

    #[test]
    fn test_original_timestamp_mode_uses_venue_times() {
        let config = EngineConfig {
            time_matching_mode: TimeMatchingMode::OriginalTimestamp,
            ..EngineConfig::default()
        };
        let time = base_time();

        // Venue times 200ms apart, receive times 1500ms apart. Only the
        // venue times fit the window.
        let binance =
            quote_with_exchange_time(ExchangeId::BinancePerp, btc_usdt(), 100.0, 101.0, time, time);
        let okx = quote_with_exchange_time(
            ExchangeId::OkxPerp,
            btc_usdt(),
            100.0,
            101.0,
            time + Duration::milliseconds(200),
            time + Duration::milliseconds(1500),
        );

        assert_eq!(
            evaluate_pair(&binance, &okx, &config, time + Duration::milliseconds(200)),
            MatchDecision::Matched(MatchedTimes {
                time_diff_ms: 200,
                used_receive_fallback: false,
            })
        );
    }

    #[test]
    fn test_original_timestamp_mode_falls_back_on_both_sides() {
        let config = EngineConfig {
            time_matching_mode: TimeMatchingMode::OriginalTimestamp,
            ..EngineConfig::default()
        };
        let time = base_time();
        let now = time + Duration::milliseconds(400);

        // Binance carries a venue timestamp, okx does not. The comparison
        // must not mix clocks: both sides drop to receive times.
        let binance =
            quote_with_exchange_time(ExchangeId::BinancePerp, btc_usdt(), 100.0, 101.0, time, time);
        let okx = quote_at(ExchangeId::OkxPerp, btc_usdt(), 100.0, 101.0, now);

        assert_eq!(
            evaluate_pair(&binance, &okx, &config, now),
            MatchDecision::Matched(MatchedTimes {
                time_diff_ms: 400,
                used_receive_fallback: true,
            })
        );
    }
}

use serde::Serialize;
use thiserror::Error;
use tickmatch_data::model::quote::QuoteEvent;
use tickmatch_data::shared::subscription_models::ExchangeId;
use tickmatch_data::shared::utils::round_dp;

pub const SPREAD_DECIMAL_PLACES: u32 = 6;

/*----- */
// Spread pair
/*----- */
// The two directional cross-venue spreads for one matched pair, in percent.
// buy_binance_sell_okx prices entering on binance's ask against okx's bid,
// sell_binance_buy_okx the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpreadPair {
    pub buy_binance_sell_okx: f64,
    pub sell_binance_buy_okx: f64,
}

// A reference bid at or below zero cannot anchor a percentage. The pair
// still counts as a time-match; only the spread side of the pipeline skips.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot compute spread against {exchange} bid of {bid_price}")]
pub struct DegenerateReferenceBid {
    pub exchange: ExchangeId,
    pub bid_price: f64,
}

/*----- */
// Spread computation
/*----- */
pub fn compute_spreads(
    binance: &QuoteEvent,
    okx: &QuoteEvent,
) -> Result<SpreadPair, DegenerateReferenceBid> {
    if okx.bid_price <= 0.0 {
        return Err(DegenerateReferenceBid {
            exchange: ExchangeId::OkxPerp,
            bid_price: okx.bid_price,
        });
    }

    if binance.bid_price <= 0.0 {
        return Err(DegenerateReferenceBid {
            exchange: ExchangeId::BinancePerp,
            bid_price: binance.bid_price,
        });
    }

    let buy_binance_sell_okx = (binance.ask_price - okx.bid_price) / okx.bid_price * 100.0;
    let sell_binance_buy_okx = (okx.ask_price - binance.bid_price) / binance.bid_price * 100.0;

    Ok(SpreadPair {
        buy_binance_sell_okx: round_dp(buy_binance_sell_okx, SPREAD_DECIMAL_PLACES),
        sell_binance_buy_okx: round_dp(sell_binance_buy_okx, SPREAD_DECIMAL_PLACES),
    })
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use super::*;
    use crate::mock_data::test_utils::{base_time, btc_usdt, quote_at};

    #[test]
    fn test_spreads_match_worked_example() {
        let time = base_time();
        let binance = quote_at(ExchangeId::BinancePerp, btc_usdt(), 100.00, 100.10, time);
        let okx = quote_at(ExchangeId::OkxPerp, btc_usdt(), 99.90, 100.05, time);

        let spreads = compute_spreads(&binance, &okx).unwrap();

        assert_eq!(spreads.buy_binance_sell_okx, 0.2002);
        assert_eq!(spreads.sell_binance_buy_okx, 0.05);
    }

    #[test]
    fn test_spread_can_be_negative() {
        let time = base_time();
        // binance asks below okx's bid: entering on binance is paid for
        let binance = quote_at(ExchangeId::BinancePerp, btc_usdt(), 99.00, 99.10, time);
        let okx = quote_at(ExchangeId::OkxPerp, btc_usdt(), 99.50, 99.60, time);

        let spreads = compute_spreads(&binance, &okx).unwrap();

        assert!(spreads.buy_binance_sell_okx < 0.0);
        assert!(spreads.sell_binance_buy_okx > 0.0);
    }

    #[test]
    fn test_zero_reference_bid_is_degenerate() {
        let time = base_time();
        let binance = quote_at(ExchangeId::BinancePerp, btc_usdt(), 100.00, 100.10, time);
        let okx = quote_at(ExchangeId::OkxPerp, btc_usdt(), 0.0, 100.05, time);

        assert_eq!(
            compute_spreads(&binance, &okx),
            Err(DegenerateReferenceBid {
                exchange: ExchangeId::OkxPerp,
                bid_price: 0.0,
            })
        );
    }

    #[test]
    fn test_negative_reference_bid_is_degenerate() {
        let time = base_time();
        let binance = quote_at(ExchangeId::BinancePerp, btc_usdt(), -1.0, 100.10, time);
        let okx = quote_at(ExchangeId::OkxPerp, btc_usdt(), 99.90, 100.05, time);

        assert_eq!(
            compute_spreads(&binance, &okx),
            Err(DegenerateReferenceBid {
                exchange: ExchangeId::BinancePerp,
                bid_price: -1.0,
            })
        );
    }
}

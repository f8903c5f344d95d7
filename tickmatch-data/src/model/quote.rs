use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::shared::subscription_models::{ExchangeId, Instrument};

/*----- */
// Quote event
/*----- */
// One normalised best-bid/best-ask observation from a single venue.
// `exchange_time` is whatever event time the venue attached and may be
// missing; `received_time` is stamped by this process on arrival.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuoteEvent {
    pub exchange: ExchangeId,
    pub instrument: Instrument,
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_qty: f64,
    pub ask_qty: f64,
    pub exchange_time: Option<DateTime<Utc>>,
    pub received_time: DateTime<Utc>,
}

impl QuoteEvent {
    pub fn new(
        exchange: ExchangeId,
        instrument: Instrument,
        bid_price: f64,
        ask_price: f64,
        bid_qty: f64,
        ask_qty: f64,
        exchange_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            exchange,
            instrument,
            bid_price,
            ask_price,
            bid_qty,
            ask_qty,
            exchange_time,
            received_time: Utc::now(),
        }
    }

    // Unparseable upstream fields surface as non-finite numbers after
    // normalisation, so finiteness is the ingestion gate. Zero or negative
    // prices pass here and are caught at spread computation instead.
    pub fn validate(&self) -> Result<(), DataError> {
        let fields = [
            ("bid_price", self.bid_price),
            ("ask_price", self.ask_price),
            ("bid_qty", self.bid_qty),
            ("ask_qty", self.ask_qty),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(DataError::MalformedQuote {
                    exchange: self.exchange,
                    instrument: self.instrument.clone(),
                    field,
                });
            }
        }

        Ok(())
    }
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use super::*;

    fn quote(bid_price: f64, ask_price: f64) -> QuoteEvent {
        QuoteEvent::new(
            ExchangeId::BinancePerp,
            Instrument::new("btc", "usdt"),
            bid_price,
            ask_price,
            1.0,
            1.0,
            None,
        )
    }

    #[test]
    fn test_validate_accepts_finite_quote() {
        assert!(quote(100.0, 100.1).validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_zero_price() {
        // A zero bid is degenerate for spreads but well-formed as data
        assert!(quote(0.0, 100.1).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite_fields() {
        let result = quote(f64::NAN, 100.1).validate();
        assert_eq!(
            result,
            Err(DataError::MalformedQuote {
                exchange: ExchangeId::BinancePerp,
                instrument: Instrument::new("btc", "usdt"),
                field: "bid_price",
            })
        );

        assert!(quote(100.0, f64::INFINITY).validate().is_err());

        let mut bad_qty = quote(100.0, 100.1);
        bad_qty.ask_qty = f64::NEG_INFINITY;
        assert!(bad_qty.validate().is_err());
    }
}

/*----- */
// Test utils
/*----- */
pub mod test_utils {
    use chrono::{DateTime, TimeZone, Utc};
    use tickmatch_data::model::quote::QuoteEvent;
    use tickmatch_data::shared::subscription_models::{ExchangeId, Instrument};
    use tokio::sync::mpsc;

    use crate::server::server_channels::{make_http_channels, ServerHttpChannel};
    use crate::spread_monitor::monitor::SpreadMonitor;

    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }

    pub fn btc_usdt() -> Instrument {
        Instrument::new("btc", "usdt")
    }

    pub fn eth_usdt() -> Instrument {
        Instrument::new("eth", "usdt")
    }

    pub fn sol_usdt() -> Instrument {
        Instrument::new("sol", "usdt")
    }

    pub fn quote_at(
        exchange: ExchangeId,
        instrument: Instrument,
        bid_price: f64,
        ask_price: f64,
        received_time: DateTime<Utc>,
    ) -> QuoteEvent {
        QuoteEvent {
            exchange,
            instrument,
            bid_price,
            ask_price,
            bid_qty: 1.0,
            ask_qty: 2.0,
            exchange_time: None,
            received_time,
        }
    }

    pub fn quote_with_exchange_time(
        exchange: ExchangeId,
        instrument: Instrument,
        bid_price: f64,
        ask_price: f64,
        exchange_time: DateTime<Utc>,
        received_time: DateTime<Utc>,
    ) -> QuoteEvent {
        QuoteEvent {
            exchange_time: Some(exchange_time),
            ..quote_at(exchange, instrument, bid_price, ask_price, received_time)
        }
    }

    pub fn spread_monitor() -> (
        SpreadMonitor,
        ServerHttpChannel,
        mpsc::UnboundedSender<QuoteEvent>,
    ) {
        let (quote_tx, quote_rx) = mpsc::unbounded_channel::<QuoteEvent>();
        let (monitor_channel, server_channel) = make_http_channels();

        (
            SpreadMonitor::new(quote_rx, monitor_channel),
            server_channel,
            quote_tx,
        )
    }
}

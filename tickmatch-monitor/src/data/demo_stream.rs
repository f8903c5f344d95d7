use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tickmatch_data::model::quote::QuoteEvent;
use tickmatch_data::shared::subscription_models::{ExchangeId, Instrument};
use tokio::sync::mpsc;
use tracing::debug;

fn starting_mid(instrument: &Instrument) -> f64 {
    match instrument.base.as_str() {
        "btc" => 60_000.0,
        "eth" => 3_000.0,
        "sol" => 150.0,
        _ => 100.0,
    }
}

/*----- */
// Demo quote stream
/*----- */
// Synthetic two-venue feed: one random-walking mid per instrument, each
// venue quoting a small independent offset around it. Roughly one quote in
// ten arrives without a venue timestamp so the fallback path gets
// exercised. Stands in for the exchange transports when none are wired up.
pub fn demo_quote_stream(
    instruments: Vec<Instrument>,
    tick_ms: u64,
) -> mpsc::UnboundedReceiver<QuoteEvent> {
    let (quote_tx, quote_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut mids = instruments
            .iter()
            .map(|instrument| (instrument.clone(), starting_mid(instrument)))
            .collect::<HashMap<Instrument, f64>>();

        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));

        loop {
            interval.tick().await;

            for (instrument, mid) in mids.iter_mut() {
                // The rng is not Send, so it lives and dies between awaits
                let quotes = {
                    let mut rng = rand::thread_rng();

                    *mid *= 1.0 + rng.gen_range(-0.0005..0.0005);

                    [ExchangeId::BinancePerp, ExchangeId::OkxPerp].map(|exchange| {
                        let venue_mid = *mid * (1.0 + rng.gen_range(-0.0002..0.0002));
                        let half_spread = venue_mid * rng.gen_range(0.00005..0.0003);

                        let exchange_time = rng.gen_bool(0.9).then(|| {
                            Utc::now() - chrono::Duration::milliseconds(rng.gen_range(0..50))
                        });

                        QuoteEvent::new(
                            exchange,
                            instrument.clone(),
                            venue_mid - half_spread,
                            venue_mid + half_spread,
                            rng.gen_range(0.1..25.0),
                            rng.gen_range(0.1..25.0),
                            exchange_time,
                        )
                    })
                };

                for quote in quotes {
                    if quote_tx.send(quote).is_err() {
                        debug!(
                            message = "Demo quote stream receiver dropped",
                            action = "Stopping demo feed",
                        );
                        return;
                    }
                }
            }
        }
    });

    quote_rx
}

/*----- */
// Test
/*----- */

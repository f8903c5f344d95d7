use serde::{Deserialize, Serialize};
use std::fmt::Display;

/*----- */
// Instrument model
/*----- */
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Instrument {
    pub base: String,
    pub quote: String,
}

impl Instrument {
    pub fn new<S>(base: S, quote: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.base, self.quote)
    }
}

impl From<(String, String)> for Instrument {
    fn from((base, quote): (String, String)) -> Self {
        Self::new(base, quote)
    }
}

/*----- */
// Exchange IDs
/*----- */
#[derive(Debug, PartialEq, Hash, Eq, Clone, Copy, Ord, PartialOrd, Deserialize, Serialize)]
pub enum ExchangeId {
    BinancePerp,
    OkxPerp,
}

impl ExchangeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::BinancePerp => "binanceperp",
            ExchangeId::OkxPerp => "okxperp",
        }
    }

    // The venue on the other side of every pairing decision.
    pub fn counterparty(&self) -> ExchangeId {
        match self {
            ExchangeId::BinancePerp => ExchangeId::OkxPerp,
            ExchangeId::OkxPerp => ExchangeId::BinancePerp,
        }
    }
}

impl Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instrument_display() {
        let instrument = Instrument::new("btc", "usdt");
        assert_eq!(instrument.to_string(), "btcusdt");
    }

    #[test]
    fn test_counterparty_is_involutive() {
        assert_eq!(
            ExchangeId::BinancePerp.counterparty(),
            ExchangeId::OkxPerp
        );
        assert_eq!(
            ExchangeId::OkxPerp.counterparty().counterparty(),
            ExchangeId::OkxPerp
        );
    }
}

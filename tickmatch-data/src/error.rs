use thiserror::Error;

use crate::shared::subscription_models::{ExchangeId, Instrument};

/*----- */
// DataError
/*----- */
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("quote for {instrument} from {exchange} has a non-finite {field}")]
    MalformedQuote {
        exchange: ExchangeId,
        instrument: Instrument,
        field: &'static str,
    },
}

//! Candle source port trait.

use crate::domain::candle::Candle;
use crate::domain::error::EngineError;

pub trait DataPort {
    fn load_candles(&self) -> Result<Vec<Candle>, EngineError>;
}

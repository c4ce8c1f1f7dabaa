//! Domain types shared by every layer: candles and node ids.

pub mod candle;
pub mod ids;

pub use candle::{Candle, CandleReference, OhlcSeries, PriceField};
pub use ids::{IdSource, RandomIds, SeededIds, INDICATOR_PREFIX, NODE_PREFIX};

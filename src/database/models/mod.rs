pub mod candle;
pub mod instrument;

pub use candle::{NewPriceCandle, PriceCandle};
pub use instrument::{Instrument, NewInstrument};

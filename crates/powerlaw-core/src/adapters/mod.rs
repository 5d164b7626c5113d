mod binance;

pub use binance::{BinanceAdapter, BINANCE_BASE_URL};

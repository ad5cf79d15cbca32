pub mod data_source;
pub mod export_roundtrip;
pub mod market_data;

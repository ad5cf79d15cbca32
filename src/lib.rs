pub mod analysis;
pub mod api;
pub mod data;
pub mod error;
pub mod export;
pub mod models;
pub mod ui;

pub use error::{Result, ScreenerError};

pub mod app;
pub mod components;
pub mod evaluator;
pub mod layout;
pub mod screener;
pub mod view;

pub use app::{run_app, ScreenerApp};

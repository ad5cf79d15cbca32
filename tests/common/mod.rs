//! Common test utilities and helpers

pub mod fixtures;

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::info;

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // test-log may already have installed a subscriber
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("stock_screener=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log a test step
    pub fn log_test_step(step: &str) {
        info!("🧪 {}", step);
    }
}

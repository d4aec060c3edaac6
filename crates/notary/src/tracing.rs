//! Logging utilities with notary segment prefixes.
//!
//! Provides consistent logging setup across the notary library and CLI.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with notary defaults.
///
/// Sets up tracing-subscriber with:
/// - Environment filter (RUST_LOG)
/// - Compact format on stderr, leaving stdout to command output
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing with a custom default filter.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Segment prefixes for log lines.
pub mod prefix {
    /// Content store operations
    pub const STORE: &str = "⊔";
    /// Ledger submissions and reads
    pub const LEDGER: &str = "꩜";
    /// Orchestrator phase transitions
    pub const PHASE: &str = "✿";
    /// Failures surfaced to the caller
    pub const FAIL: &str = "❀";
}

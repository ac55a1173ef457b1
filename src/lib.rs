//! AdaptLearn chatbot
//!
//! A subject-scoped keyword chatbot served over HTTP, plus the launcher
//! that runs the server alongside a browser session.

pub mod api;
pub mod config;
pub mod knowledge;
pub mod responder;
pub mod signals;
pub mod supervisor;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serializes tests that install or raise process-wide signals
#[cfg(test)]
pub(crate) static SIGNAL_TEST_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Install the JSON log subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adaptlearn_chatbot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();
}

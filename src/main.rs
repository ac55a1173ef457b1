//! AdaptLearn chatbot server
//!
//! Serves the chat page and answers `/ask` from the rule table.

use adaptlearn_chatbot::api::{create_router, AppState};
use adaptlearn_chatbot::config::ServerConfig;
use adaptlearn_chatbot::knowledge::KnowledgeBase;
use adaptlearn_chatbot::signals::shutdown_signal;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    adaptlearn_chatbot::init_logging();

    let config = ServerConfig::from_env();

    // Load the rule table once; a broken data file stops startup here
    tracing::info!(path = %config.data_path.display(), "Loading rule table");
    let knowledge = match KnowledgeBase::load(&config.data_path) {
        Ok(kb) => Arc::new(kb),
        Err(e) => {
            tracing::error!(error = %e, "Cannot start without a rule table");
            return Err(e.into());
        }
    };

    let table = knowledge.snapshot();
    tracing::info!(
        subjects = ?table.subjects(),
        rules = table.rule_count(),
        default_subject = %config.default_subject,
        "Rule table loaded"
    );

    let addr = config.bind_addr();
    let state = AppState::new(knowledge.clone(), config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    tracing::info!("AdaptLearn chatbot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(knowledge))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

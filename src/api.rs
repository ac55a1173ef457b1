//! HTTP front door: the chat page, its assets, and the `/ask` endpoint

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;
pub use types::{AskRequest, AskResponse, ErrorResponse, SubjectsResponse};

use crate::config::ServerConfig;
use crate::knowledge::KnowledgeBase;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub knowledge: Arc<KnowledgeBase>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(knowledge: Arc<KnowledgeBase>, config: ServerConfig) -> Self {
        Self {
            knowledge,
            config: Arc::new(config),
        }
    }
}

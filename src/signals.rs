//! Server signal handling
//!
//! SIGHUP re-reads the rule table without dropping the listener.
//! SIGINT and SIGTERM end the server after in-flight requests finish.

use crate::knowledge::KnowledgeBase;
use std::sync::Arc;

/// Resolves when the server should shut down. Reloads the rule table on
/// every SIGHUP received in the meantime.
pub async fn shutdown_signal(knowledge: Arc<KnowledgeBase>) {
    #[cfg(unix)]
    {
        if let Err(e) = unix_signals(&knowledge).await {
            tracing::error!(error = %e, "Failed to install signal handlers - falling back to Ctrl-C");
            ctrl_c().await;
        }
    }

    #[cfg(not(unix))]
    {
        let _ = knowledge;
        ctrl_c().await;
    }
}

#[cfg(unix)]
async fn unix_signals(knowledge: &KnowledgeBase) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        tokio::select! {
            _ = sighup.recv() => {
                tracing::info!(path = %knowledge.path().display(), "Received SIGHUP - reloading rule table");
                reload(knowledge);
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM - shutting down");
                return Ok(());
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT - shutting down");
                return Ok(());
            }
        }
    }
}

/// Reload, keeping the current table if the file is broken
pub fn reload(knowledge: &KnowledgeBase) {
    if let Err(e) = knowledge.reload() {
        tracing::error!(error = %e, "Rule table reload failed - keeping previous table");
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl-C - shutting down");
}

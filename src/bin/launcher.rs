//! AdaptLearn launcher
//!
//! Starts the chatbot server, opens the browser on it, and stops the
//! server when interrupted or when the server exits on its own.

use adaptlearn_chatbot::config::LauncherConfig;
use adaptlearn_chatbot::supervisor::{self, Outcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    adaptlearn_chatbot::init_logging();

    let config = LauncherConfig::from_env();
    tracing::info!(
        bin = %config.server_bin.display(),
        url = %config.url,
        grace_secs = config.grace.as_secs(),
        "Launcher starting"
    );

    let outcome = match supervisor::run(&config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, bin = %config.server_bin.display(), "Failed to run server");
            return Err(e.into());
        }
    };

    match outcome {
        Outcome::Exited(status) => tracing::info!(%status, "Server exited - launcher done"),
        Outcome::Stopped { forced, .. } => tracing::info!(forced, "Server stopped - launcher done"),
    }

    let code = outcome.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

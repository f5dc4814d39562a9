//! Signal handling for graceful shutdown

use futures::stream::StreamExt;
use signal_hook_tokio::Signals;
use tracing::{error, info};

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Falls back to Ctrl-C alone if the signal handler cannot be installed.
pub async fn shutdown_signal() {
    let signals = Signals::new([signal_hook::consts::SIGTERM, signal_hook::consts::SIGINT]);

    match signals {
        Ok(mut signals) => {
            if let Some(signal) = signals.next().await {
                info!("Received signal: {}", signal);
            }
            signals.handle().close();
        }
        Err(e) => {
            error!("Failed to install signal handler: {}, waiting for Ctrl-C only", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
        }
    }
}

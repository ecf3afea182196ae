//! Process signal handling

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Token cancelled on the first SIGINT or SIGTERM.
///
/// Handlers are installed before this returns, so failing to install them
/// is a startup error. Must be called from within a Tokio runtime.
pub fn install() -> std::io::Result<CancellationToken> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let token = CancellationToken::new();

    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM - shutting down");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT - shutting down");
            }
        }
        trigger.cancel();
    });

    Ok(token)
}

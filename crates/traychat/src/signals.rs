//! Termination signals.

use tokio::task::JoinHandle;
use tracing::{error, info};
use traychat_session::SessionHandle;

/// Turns the first SIGINT/SIGTERM into a forced quit.
pub fn forward_termination(handle: SessionHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        match termination().await {
            Ok(name) => {
                info!(signal = name, "termination signal received");
                handle.terminate();
            }
            Err(e) => error!(error = %e, "cannot listen for termination signals"),
        }
    })
}

#[cfg(unix)]
async fn termination() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => Ok("SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn termination() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

#[cfg(unix)]
use tokio::signal::unix::{self, SignalKind};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

/// Why the poll loop should stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// No shutdown requested yet
    None,
    /// Clean shutdown from user signal (ctrl-c, SIGTERM, SIGHUP)
    Signal,
}

/// Spawn a task that flips `exit_sender` to `ShutdownReason::Signal` on the
/// first interrupt, terminate or hangup signal.
#[cfg(unix)]
pub fn setup_signal_handler(exit_sender: watch::Sender<ShutdownReason>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (mut hangup, mut terminate) =
            match (unix::signal(SignalKind::hangup()), unix::signal(SignalKind::terminate())) {
                (Ok(hangup), Ok(terminate)) => (hangup, terminate),
                (Err(e), _) | (_, Err(e)) => {
                    warn!("Failed to install unix signal handlers, only ctrl-c will stop: {}", e);
                    wait_for_ctrl_c(exit_sender).await;
                    return;
                }
            };

        let sig = tokio::select! {
            _ = tokio::signal::ctrl_c() => SignalKind::interrupt(),
            _ = hangup.recv() => SignalKind::hangup(),
            _ = terminate.recv() => SignalKind::terminate(),
        };

        info!("Received signal {sig:?}. Stopping...");
        let _ = exit_sender.send(ShutdownReason::Signal);
    })
}

#[cfg(not(unix))]
pub fn setup_signal_handler(exit_sender: watch::Sender<ShutdownReason>) -> JoinHandle<()> {
    tokio::spawn(wait_for_ctrl_c(exit_sender))
}

async fn wait_for_ctrl_c(exit_sender: watch::Sender<ShutdownReason>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received ctrl-c. Stopping...");
            let _ = exit_sender.send(ShutdownReason::Signal);
        }
        Err(e) => {
            warn!("Failed to listen for ctrl-c: {}", e);
            // Dropping the sender would stop the poll loop
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handler_waits_for_a_signal() {
        let (exit_sender, mut exit_receiver) = watch::channel(ShutdownReason::None);
        let handle = setup_signal_handler(exit_sender);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());
        assert_eq!(*exit_receiver.borrow(), ShutdownReason::None);

        // Stopping the handler drops the sender and closes the channel
        handle.abort();
        let _ = handle.await;
        assert!(exit_receiver.changed().await.is_err());
        assert_eq!(*exit_receiver.borrow(), ShutdownReason::None);
    }
}

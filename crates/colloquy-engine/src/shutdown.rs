// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! SIGTERM and SIGINT (Ctrl+C) cancel a [`CancellationToken`] shared by the
//! dispatcher, the intake workers and the gateway. Background tasks are then
//! given a bounded amount of time to finish their current cycle.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Waits up to `timeout` for background tasks to finish.
///
/// Returns the number of tasks that were still running at the deadline; those
/// are aborted.
pub async fn await_tasks(handles: Vec<JoinHandle<()>>, timeout: Duration) -> usize {
    if handles.is_empty() {
        return 0;
    }
    info!(count = handles.len(), "waiting for background tasks to stop");

    let deadline = tokio::time::Instant::now() + timeout;
    let mut interrupted = 0;
    for mut handle in handles {
        match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "background task ended abnormally"),
            Err(_) => {
                handle.abort();
                interrupted += 1;
            }
        }
    }

    if interrupted == 0 {
        info!("all background tasks stopped");
    } else {
        warn!(
            remaining = interrupted,
            "shutdown timeout reached, aborted remaining tasks"
        );
    }
    interrupted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn await_no_tasks() {
        assert_eq!(await_tasks(Vec::new(), Duration::from_millis(10)).await, 0);
    }

    #[tokio::test]
    async fn cooperative_tasks_stop_in_time() {
        let cancel = CancellationToken::new();
        let handles = (0..3)
            .map(|_| {
                let cancel = cancel.clone();
                tokio::spawn(async move { cancel.cancelled().await })
            })
            .collect();
        cancel.cancel();
        assert_eq!(await_tasks(handles, Duration::from_secs(1)).await, 0);
    }

    #[tokio::test]
    async fn stuck_task_is_aborted_at_deadline() {
        let stuck = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        let quick = tokio::spawn(async {});
        let remaining = await_tasks(vec![stuck, quick], Duration::from_millis(50)).await;
        assert_eq!(remaining, 1);
    }
}

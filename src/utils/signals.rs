//! Shutdown signals
//!
//! SIGTERM arrives when the session ends or the service manager stops us;
//! either way the timer state has to be flushed before exit.

use futures::stream::StreamExt;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::error;

/// Human-readable name for the signals we listen for
pub fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGTERM => "SIGTERM",
        SIGINT => "SIGINT",
        SIGHUP => "SIGHUP",
        _ => "unknown signal",
    }
}

/// Resolve with the name of the first termination signal received.
///
/// If the handler cannot be installed this never resolves; the server
/// keeps running and state is still flushed on every mutation.
pub async fn shutdown_signal() -> &'static str {
    let mut signals = match Signals::new([SIGTERM, SIGINT, SIGHUP]) {
        Ok(signals) => signals,
        Err(e) => {
            error!("Failed to create signal handler: {}", e);
            return std::future::pending().await;
        }
    };

    match signals.next().await {
        Some(signal) => signal_name(signal),
        None => std::future::pending().await,
    }
}

//! Bounded wait for asynchronous window deletion

use std::time::Duration;

use crate::error::OperationError;
use crate::host::{DockHost, WindowId};

/// Interval between event-loop passes while waiting
pub const EVENT_LOOP_TICK: Duration = Duration::from_millis(5);

/// Pump the host's event loop until `window` no longer exists.
///
/// Gives up after `timeout` with [`OperationError::TeardownTimeout`]; a
/// window that never goes away is treated as a hang, not ignored.
pub async fn wait_for_deleted<H: DockHost>(
    host: &mut H,
    window: WindowId,
    timeout: Duration,
) -> Result<(), OperationError> {
    let wait = async {
        while host.window_exists(window) {
            host.process_events().await;
            if host.window_exists(window) {
                tokio::time::sleep(EVENT_LOOP_TICK).await;
            }
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(()) => {
            tracing::trace!(%window, "window deleted");
            Ok(())
        }
        Err(_) => {
            tracing::error!(%window, timeout_ms = timeout.as_millis() as u64, "teardown wait timed out");
            Err(OperationError::TeardownTimeout {
                window,
                waited: timeout,
            })
        }
    }
}

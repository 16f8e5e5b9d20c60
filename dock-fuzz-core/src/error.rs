//! Error types surfaced by operation execution and replay files

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::host::{HostError, WindowId};

/// Hard failure of a single operation. Any of these ends the fuzz run.
#[derive(Debug)]
pub enum OperationError {
    /// A recorded dock widget name no longer resolves
    UnknownDockWidget(String),
    /// A recorded main window name no longer resolves
    UnknownMainWindow(String),
    /// A floating window was scheduled for deletion but never went away
    TeardownTimeout { window: WindowId, waited: Duration },
    /// The docking library rejected the effect
    Host(HostError),
    /// The host's invariants broke after a step
    Sanity(HostError),
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::UnknownDockWidget(name) => {
                write!(f, "dock widget {name} does not exist")
            }
            OperationError::UnknownMainWindow(name) => {
                write!(f, "main window {name} does not exist")
            }
            OperationError::TeardownTimeout { window, waited } => write!(
                f,
                "{window} was not deleted after {}ms",
                waited.as_millis()
            ),
            OperationError::Host(e) => write!(f, "host rejected operation: {e}"),
            OperationError::Sanity(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for OperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OperationError::Host(e) | OperationError::Sanity(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HostError> for OperationError {
    fn from(e: HostError) -> Self {
        OperationError::Host(e)
    }
}

/// Failure reading or writing a replay log file
#[derive(Debug)]
pub enum ReplayError {
    Io { path: PathBuf, source: io::Error },
    Json(serde_json::Error),
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Io { path, source } => {
                write!(f, "replay log {}: {}", path.display(), source)
            }
            ReplayError::Json(e) => write!(f, "malformed replay log: {e}"),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Io { source, .. } => Some(source),
            ReplayError::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(e: serde_json::Error) -> Self {
        ReplayError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_teardown_timeout_display() {
        let err = OperationError::TeardownTimeout {
            window: WindowId(3),
            waited: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "window#3 was not deleted after 250ms");
    }

    #[test]
    fn test_host_error_is_source() {
        let err = OperationError::from(HostError::UnknownDockWidget("A".into()));
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "host rejected operation: unknown dock widget: A"
        );
    }
}

//! Core types for dock-fuzz
//!
//! A randomized-operation fuzz harness for docking layout managers. The
//! harness drives a docking library through long random sequences of
//! user-visible operations, records each one in a replayable form, and
//! reproduces a failing sequence from that record.
//!
//! # Core Concepts
//!
//! - **Operation**: one replayable step (close, show, dock, tab, save, restore)
//! - **Driver**: supplies randomness, live lookup and layout storage
//! - **DockHost**: the docking library under test
//! - **ReplayLog**: the recorded run, written as JSON
//!
//! # Basic Example
//!
//! ```ignore
//! use dock_fuzz_core::prelude::*;
//!
//! let config = FuzzerConfig::default().with_seed(42).with_tests(5);
//! let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);
//!
//! let summary = fuzzer.fuzz(&CancellationToken::new()).await?;
//! println!("{} operations executed", summary.executed);
//! ```
//!
//! # Asynchronous teardown
//!
//! Closing the last dock widget of a floating window does not delete the
//! window right away; the host deletes it on a later event-loop pass.
//! Operations that can trigger this remember the floating window before the
//! effect and block on [`teardown::wait_for_deleted`] afterwards, bounded by
//! [`Driver::teardown_timeout`]. A window that never goes away fails the run.

pub mod config;
pub mod driver;
pub mod error;
pub mod fuzzer;
pub mod host;
pub mod kind;
pub mod location;
pub mod operation;
pub mod oplog;
pub mod params;
pub mod record;
pub mod replay;
pub mod sim;
pub mod teardown;
pub mod testing;

pub use config::{FuzzerConfig, OperationWeights};
pub use driver::{Driver, DEFAULT_TEARDOWN_TIMEOUT};
pub use error::{OperationError, ReplayError};
pub use fuzzer::{FuzzFailure, FuzzSummary, Fuzzer, RunReport};
pub use host::{
    DockHost, DockWidgetDescriptor, DockWidgetInfo, FrameId, HostError, InitialLayout, WindowId,
};
pub use kind::OperationKind;
pub use location::{AddingOptions, Location};
pub use operation::{Operation, OperationParams, StepOutcome};
pub use oplog::{OperationLog, OperationLogConfig, OperationLogEntry, OperationLogFilter};
pub use params::AddDockWidgetParams;
pub use record::{OperationRecord, RecordError};
pub use replay::{ReplayLog, REPLAY_FORMAT_VERSION};
pub use sim::{LayoutSnapshot, Placement, SimulatedDockHost};
pub use testing::FakeDriver;

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{FuzzerConfig, OperationWeights};
    pub use crate::driver::Driver;
    pub use crate::error::{OperationError, ReplayError};
    pub use crate::fuzzer::{FuzzFailure, FuzzSummary, Fuzzer, RunReport};
    pub use crate::host::{DockHost, DockWidgetInfo, HostError, InitialLayout};
    pub use crate::kind::OperationKind;
    pub use crate::location::{AddingOptions, Location};
    pub use crate::operation::{Operation, StepOutcome};
    pub use crate::oplog::{OperationLogConfig, OperationLogFilter};
    pub use crate::params::AddDockWidgetParams;
    pub use crate::replay::ReplayLog;
    pub use crate::sim::SimulatedDockHost;
    pub use tokio_util::sync::CancellationToken;
}

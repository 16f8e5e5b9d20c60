//! Test utilities for operations and hosts
//!
//! [`FakeDriver`] is a deterministic [`Driver`]: it always picks the first
//! qualifying dock widget in host order and hands out add-dock-widget
//! placements from a queue the test fills. Combined with
//! [`SimulatedDockHost`] it lets a test state exactly which target each
//! operation will hit.
//!
//! ```ignore
//! use dock_fuzz_core::testing::FakeDriver;
//! use dock_fuzz_core::{assert_hidden, InitialLayout, Operation};
//!
//! let mut driver = FakeDriver::from_layout(
//!     &InitialLayout::new().main_window("main").dock_widget("A", true),
//! );
//! Operation::close("A").execute(&mut driver).await?;
//! assert_hidden!(driver.host(), "A");
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use crate::driver::{Driver, DEFAULT_TEARDOWN_TIMEOUT};
use crate::error::OperationError;
use crate::host::{DockHost, DockWidgetInfo, InitialLayout};
use crate::operation::{Operation, StepOutcome};
use crate::params::AddDockWidgetParams;
use crate::sim::SimulatedDockHost;

/// Deterministic driver for tests
#[derive(Debug, Clone)]
pub struct FakeDriver<H = SimulatedDockHost> {
    host: H,
    add_params: VecDeque<AddDockWidgetParams>,
    saved_layout: Option<Vec<u8>>,
    teardown_timeout: Duration,
}

impl FakeDriver<SimulatedDockHost> {
    /// A driver over a simulated host reset to `layout`.
    ///
    /// # Panics
    ///
    /// Panics if the layout has duplicate names.
    pub fn from_layout(layout: &InitialLayout) -> Self {
        let host = SimulatedDockHost::from_layout(layout)
            .unwrap_or_else(|e| panic!("Invalid test layout: {e}"));
        Self::new(host)
    }
}

impl<H: DockHost> FakeDriver<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            add_params: VecDeque::new(),
            saved_layout: None,
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
        }
    }

    /// Queue a placement for the next add-dock-widget generation
    pub fn with_add_params(mut self, params: AddDockWidgetParams) -> Self {
        self.push_add_params(params);
        self
    }

    pub fn push_add_params(&mut self, params: AddDockWidgetParams) {
        self.add_params.push_back(params);
    }

    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    /// Execute operations in order, stopping at the first error
    pub async fn execute_all(
        &mut self,
        operations: &mut [Operation],
    ) -> Result<Vec<StepOutcome>, OperationError> {
        let mut outcomes = Vec::with_capacity(operations.len());
        for operation in operations.iter_mut() {
            outcomes.push(operation.execute(self).await?);
            self.host.check_sanity().map_err(OperationError::Sanity)?;
        }
        Ok(outcomes)
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

impl<H: DockHost> Driver for FakeDriver<H> {
    type Host = H;

    fn host(&self) -> &H {
        &self.host
    }

    fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn random_dock_widget(
        &mut self,
        filter: &dyn Fn(&DockWidgetInfo) -> bool,
        exclude: &[String],
    ) -> Option<String> {
        self.host
            .dock_widgets()
            .into_iter()
            .find(|dw| filter(dw) && !exclude.contains(&dw.name))
            .map(|dw| dw.name)
    }

    fn random_add_dock_widget_params(&mut self) -> Option<AddDockWidgetParams> {
        self.add_params.pop_front()
    }

    fn set_last_saved_layout(&mut self, blob: Vec<u8>) {
        self.saved_layout = Some(blob);
    }

    fn last_saved_layout(&self) -> Option<&[u8]> {
        self.saved_layout.as_deref()
    }

    fn teardown_timeout(&self) -> Duration {
        self.teardown_timeout
    }
}

/// Pause the tokio clock so timers complete instantly and deterministically.
///
/// Must be called from a current-thread runtime.
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

/// Resume the tokio clock after [`pause_time`]
#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Move the paused clock forward
#[cfg(feature = "testing-time")]
pub async fn advance_time(duration: Duration) {
    tokio::time::advance(duration).await;
}

/// Assert that a dock widget exists and is visible.
///
/// ```ignore
/// assert_visible!(driver.host(), "A");
/// ```
#[macro_export]
macro_rules! assert_visible {
    ($host:expr, $name:expr) => {
        match $crate::host::DockHost::dock_widget($host, $name) {
            Some(info) => assert!(
                info.visible,
                "Expected dock widget `{}` to be visible, but got: {:?}",
                $name,
                info
            ),
            None => panic!("Expected dock widget `{}` to exist", $name),
        }
    };
}

/// Assert that a dock widget exists and is hidden.
#[macro_export]
macro_rules! assert_hidden {
    ($host:expr, $name:expr) => {
        match $crate::host::DockHost::dock_widget($host, $name) {
            Some(info) => assert!(
                !info.visible,
                "Expected dock widget `{}` to be hidden, but got: {:?}",
                $name,
                info
            ),
            None => panic!("Expected dock widget `{}` to exist", $name),
        }
    };
}

/// Assert that a dock widget is docked in the named main window.
#[macro_export]
macro_rules! assert_docked_in {
    ($host:expr, $name:expr, $main_window:expr) => {{
        let host = $host;
        let info = $crate::host::DockHost::dock_widget(host, $name);
        let window = $crate::host::DockHost::main_window_id(host, $main_window);
        assert!(
            window.is_some() && info.as_ref().is_some_and(|i| i.window == window && !i.floating),
            "Expected dock widget `{}` to be docked in `{}`, but got: {:?}",
            $name,
            $main_window,
            info
        );
    }};
}

/// Assert that two dock widgets are tabbed into the same frame.
#[macro_export]
macro_rules! assert_same_frame {
    ($host:expr, $a:expr, $b:expr) => {{
        let host = $host;
        let a = $crate::host::DockHost::dock_widget(host, $a);
        let b = $crate::host::DockHost::dock_widget(host, $b);
        let frame_a = a.as_ref().and_then(|i| i.frame);
        let frame_b = b.as_ref().and_then(|i| i.frame);
        assert!(
            frame_a.is_some() && frame_a == frame_b,
            "Expected `{}` and `{}` to share a frame, but got: {:?} and {:?}",
            $a,
            $b,
            a,
            b
        );
    }};
}

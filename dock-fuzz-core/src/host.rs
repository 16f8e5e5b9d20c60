//! Boundary of the docking library under test
//!
//! Operations never hold live objects. They carry names and resolve them
//! through a [`DockHost`] at the moment they execute, which is what lets a
//! recorded run be replayed against a fresh but equivalent set of windows.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::params::AddDockWidgetParams;

/// Opaque identifier of a top-level window (main or floating)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Opaque identifier of a frame (a tab group of dock widgets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameId(pub u64);

/// Snapshot of a dock widget as the host sees it right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockWidgetInfo {
    /// Unique name, the identity carried through replay logs
    pub name: String,
    /// Whether the widget is currently shown
    pub visible: bool,
    /// Frame hosting the widget, `None` while closed
    pub frame: Option<FrameId>,
    /// Top-level window hosting the frame
    pub window: Option<WindowId>,
    /// Whether `window` is a floating window (and may be deleted when emptied)
    pub floating: bool,
}

impl DockWidgetInfo {
    /// The floating window hosting this widget, if any
    pub fn floating_window(&self) -> Option<WindowId> {
        if self.floating {
            self.window
        } else {
            None
        }
    }
}

/// Descriptor of one dock widget in an [`InitialLayout`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockWidgetDescriptor {
    pub name: String,
    pub visible: bool,
}

/// The set of windows and dock widgets a test starts from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialLayout {
    pub main_windows: Vec<String>,
    pub dock_widgets: Vec<DockWidgetDescriptor>,
}

impl InitialLayout {
    /// Create an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a main window
    pub fn main_window(mut self, name: impl Into<String>) -> Self {
        self.main_windows.push(name.into());
        self
    }

    /// Add a dock widget, shown floating when `visible`
    pub fn dock_widget(mut self, name: impl Into<String>, visible: bool) -> Self {
        self.dock_widgets.push(DockWidgetDescriptor {
            name: name.into(),
            visible,
        });
        self
    }
}

/// Failure reported by the docking library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    UnknownDockWidget(String),
    UnknownMainWindow(String),
    /// The relative-to widget is not docked in the destination main window
    InvalidRelativeTo { relative_to: String, main_window: String },
    /// The target of a tab operation has no frame to tab into
    NotDocked(String),
    /// A layout blob could not be decoded
    InvalidLayout(String),
    /// A topology invariant no longer holds
    Sanity(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::UnknownDockWidget(name) => write!(f, "unknown dock widget: {name}"),
            HostError::UnknownMainWindow(name) => write!(f, "unknown main window: {name}"),
            HostError::InvalidRelativeTo {
                relative_to,
                main_window,
            } => write!(
                f,
                "dock widget {relative_to} is not docked in main window {main_window}"
            ),
            HostError::NotDocked(name) => write!(f, "dock widget {name} is not docked"),
            HostError::InvalidLayout(reason) => write!(f, "invalid layout: {reason}"),
            HostError::Sanity(reason) => write!(f, "layout sanity check failed: {reason}"),
        }
    }
}

impl std::error::Error for HostError {}

/// The docking library surface the harness drives.
///
/// Effects may schedule a floating window for deferred deletion; that
/// deletion only happens while [`DockHost::process_events`] runs, mirroring
/// an event loop that drains a deferred-delete queue.
pub trait DockHost {
    /// Resolve a dock widget by name
    fn dock_widget(&self, name: &str) -> Option<DockWidgetInfo>;

    /// All registered dock widgets, in a stable order
    fn dock_widgets(&self) -> Vec<DockWidgetInfo>;

    /// Names of all main windows, in a stable order
    fn main_windows(&self) -> Vec<String>;

    /// The window id of a main window, by name
    fn main_window_id(&self, name: &str) -> Option<WindowId>;

    /// Whether a main window with this name exists
    fn has_main_window(&self, name: &str) -> bool {
        self.main_window_id(name).is_some()
    }

    /// Whether the window still exists (including while pending deletion)
    fn window_exists(&self, window: WindowId) -> bool;

    /// Whether the window has been scheduled for deferred deletion
    fn is_being_deleted(&self, window: WindowId) -> bool;

    /// Close a dock widget
    fn close_dock_widget(&mut self, name: &str) -> Result<(), HostError>;

    /// Show a hidden dock widget
    fn show_dock_widget(&mut self, name: &str) -> Result<(), HostError>;

    /// Dock a widget into a main window
    fn add_dock_widget(&mut self, params: &AddDockWidgetParams) -> Result<(), HostError>;

    /// Add `to_add` as a tab next to `target`
    fn add_dock_widget_as_tab(&mut self, target: &str, to_add: &str) -> Result<(), HostError>;

    /// Serialize the whole layout into an opaque blob
    fn serialize_layout(&self) -> Vec<u8>;

    /// Restore a layout previously produced by `serialize_layout`
    fn restore_layout(&mut self, blob: &[u8]) -> Result<(), HostError>;

    /// Tear everything down and recreate the windows described by `layout`
    fn reset(&mut self, layout: &InitialLayout) -> Result<(), HostError>;

    /// Run one pass of the event loop (deferred deletions included)
    fn process_events(&mut self) -> impl Future<Output = ()>;

    /// Verify internal invariants after a step
    fn check_sanity(&self) -> Result<(), HostError> {
        Ok(())
    }
}

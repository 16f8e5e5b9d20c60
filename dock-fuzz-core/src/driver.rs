//! The collaborator that supplies randomness, live lookup and layout storage

use std::time::Duration;

use crate::host::{DockHost, DockWidgetInfo};
use crate::params::AddDockWidgetParams;

/// How long a teardown wait may take before the run is declared hung
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything an operation needs from outside itself.
///
/// All randomness and all knowledge of what currently exists live behind
/// this trait. Operations borrow the driver for the duration of one call and
/// never keep it.
pub trait Driver {
    type Host: DockHost;

    /// The docking library being driven
    fn host(&self) -> &Self::Host;

    /// Mutable access to the docking library
    fn host_mut(&mut self) -> &mut Self::Host;

    /// Pick a random dock widget matching `filter`, skipping `exclude`.
    ///
    /// Returns `None` when no candidate qualifies.
    fn random_dock_widget(
        &mut self,
        filter: &dyn Fn(&DockWidgetInfo) -> bool,
        exclude: &[String],
    ) -> Option<String>;

    /// A full random placement for an add-dock-widget operation
    fn random_add_dock_widget_params(&mut self) -> Option<AddDockWidgetParams>;

    /// Keep a serialized layout for a later restore
    fn set_last_saved_layout(&mut self, blob: Vec<u8>);

    /// The most recently saved layout, if any
    fn last_saved_layout(&self) -> Option<&[u8]>;

    /// Bound on how long to wait for a floating window to be deleted
    fn teardown_timeout(&self) -> Duration {
        DEFAULT_TEARDOWN_TIMEOUT
    }
}

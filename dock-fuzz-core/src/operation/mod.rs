//! Replayable fuzz operations
//!
//! An [`Operation`] is one atomic step of a fuzz run. It is created either
//! fresh from the registry ([`Operation::new`]) or rebuilt from a log
//! ([`Operation::from_map`]), executed once, and thrown away.
//!
//! # Lifecycle
//!
//! ```ignore
//! let mut op = Operation::new(OperationKind::CloseViaDockWidgetApi).unwrap();
//!
//! // Generates params through the driver when none are present. Without a
//! // valid target the step is skipped, which is not an error.
//! match op.execute(&mut driver).await? {
//!     StepOutcome::Executed => log.push(&op),
//!     StepOutcome::Skipped => {}
//! }
//! ```
//!
//! Every kind has its own typed parameter schema; only the envelope built by
//! [`Operation::to_record`] is generic.

mod add;
mod layout;
mod visibility;

use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::driver::Driver;
use crate::error::OperationError;
use crate::host::{DockHost, WindowId};
use crate::kind::OperationKind;
use crate::params::AddDockWidgetParams;
use crate::record::OperationRecord;
use crate::teardown::wait_for_deleted;

pub use add::{AddDockWidget, AddDockWidgetAsTab};
pub use layout::{RestoreLayout, SaveLayout};
pub use visibility::{CloseViaDockWidgetApi, HideViaDockWidgetApi, ShowViaDockWidgetApi};

/// Contract every concrete operation implements
pub(crate) trait Step {
    /// Enough data is present to execute meaningfully
    fn has_params(&self) -> bool;

    /// Ask the driver for targets; leaves params empty on a miss
    fn generate_random_params<D: Driver>(&mut self, driver: &mut D);

    /// Human readable summary of the current params
    fn describe<H: DockHost>(&self, host: &H) -> String;

    /// Perform the effect. Only called when `has_params()` holds.
    async fn execute_impl<D: Driver>(&self, driver: &mut D) -> Result<(), OperationError>;

    /// Serialize params, empty when there are none
    fn params_to_map(&self) -> Map<String, Value>;

    /// Replace params from a map; leaves them untouched on error
    fn fill_params_from_map(&mut self, map: &Map<String, Value>) -> Result<(), serde_json::Error>;
}

/// Typed parameters, one variant per operation kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationParams {
    CloseViaDockWidgetApi(CloseViaDockWidgetApi),
    HideViaDockWidgetApi(HideViaDockWidgetApi),
    ShowViaDockWidgetApi(ShowViaDockWidgetApi),
    AddDockWidget(AddDockWidget),
    AddDockWidgetAsTab(AddDockWidgetAsTab),
    SaveLayout(SaveLayout),
    RestoreLayout(RestoreLayout),
}

macro_rules! dispatch {
    ($params:expr, $p:ident => $body:expr) => {
        match $params {
            OperationParams::CloseViaDockWidgetApi($p) => $body,
            OperationParams::HideViaDockWidgetApi($p) => $body,
            OperationParams::ShowViaDockWidgetApi($p) => $body,
            OperationParams::AddDockWidget($p) => $body,
            OperationParams::AddDockWidgetAsTab($p) => $body,
            OperationParams::SaveLayout($p) => $body,
            OperationParams::RestoreLayout($p) => $body,
        }
    };
}

impl OperationParams {
    /// The kind tag for these params
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationParams::CloseViaDockWidgetApi(_) => OperationKind::CloseViaDockWidgetApi,
            OperationParams::HideViaDockWidgetApi(_) => OperationKind::HideViaDockWidgetApi,
            OperationParams::ShowViaDockWidgetApi(_) => OperationKind::ShowViaDockWidgetApi,
            OperationParams::AddDockWidget(_) => OperationKind::AddDockWidget,
            OperationParams::AddDockWidgetAsTab(_) => OperationKind::AddDockWidgetAsTab,
            OperationParams::SaveLayout(_) => OperationKind::SaveLayout,
            OperationParams::RestoreLayout(_) => OperationKind::RestoreLayout,
        }
    }
}

/// Result of [`Operation::execute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The effect ran
    Executed,
    /// No valid target existed, nothing happened
    Skipped,
}

impl StepOutcome {
    pub fn is_executed(self) -> bool {
        self == StepOutcome::Executed
    }
}

/// One replayable fuzz step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    params: OperationParams,
    pause: Duration,
    description: String,
}

impl Operation {
    /// Create a fresh, unparameterized operation of `kind`.
    ///
    /// Returns `None` for the sentinel kinds.
    pub fn new(kind: OperationKind) -> Option<Self> {
        let params = match kind {
            OperationKind::None | OperationKind::Count => {
                tracing::warn!(operation = "new", kind = ?kind, "Invalid type");
                return None;
            }
            OperationKind::CloseViaDockWidgetApi => {
                OperationParams::CloseViaDockWidgetApi(CloseViaDockWidgetApi::default())
            }
            OperationKind::HideViaDockWidgetApi => {
                OperationParams::HideViaDockWidgetApi(HideViaDockWidgetApi::default())
            }
            OperationKind::ShowViaDockWidgetApi => {
                OperationParams::ShowViaDockWidgetApi(ShowViaDockWidgetApi::default())
            }
            OperationKind::AddDockWidget => OperationParams::AddDockWidget(AddDockWidget::default()),
            OperationKind::AddDockWidgetAsTab => {
                OperationParams::AddDockWidgetAsTab(AddDockWidgetAsTab::default())
            }
            OperationKind::SaveLayout => OperationParams::SaveLayout(SaveLayout),
            OperationKind::RestoreLayout => OperationParams::RestoreLayout(RestoreLayout),
        };
        Some(Self::from_params(params))
    }

    /// Create from a raw integer kind code, `None` if the code is not a real kind
    pub fn from_code(code: i64) -> Option<Self> {
        match OperationKind::from_code(code) {
            Some(kind) => Self::new(kind),
            None => {
                tracing::warn!(operation = "new", code, "Invalid type");
                None
            }
        }
    }

    /// Wrap already-built params
    pub fn from_params(params: OperationParams) -> Self {
        Self {
            params,
            pause: Duration::ZERO,
            description: String::new(),
        }
    }

    /// Close `dock_widget_name`
    pub fn close(dock_widget_name: impl Into<String>) -> Self {
        Self::from_params(OperationParams::CloseViaDockWidgetApi(
            CloseViaDockWidgetApi::new(dock_widget_name),
        ))
    }

    /// Hide `dock_widget_name`
    pub fn hide(dock_widget_name: impl Into<String>) -> Self {
        Self::from_params(OperationParams::HideViaDockWidgetApi(
            HideViaDockWidgetApi::new(dock_widget_name),
        ))
    }

    /// Show `dock_widget_name`
    pub fn show(dock_widget_name: impl Into<String>) -> Self {
        Self::from_params(OperationParams::ShowViaDockWidgetApi(
            ShowViaDockWidgetApi::new(dock_widget_name),
        ))
    }

    /// Dock a widget into a main window
    pub fn add_dock_widget(params: AddDockWidgetParams) -> Self {
        Self::from_params(OperationParams::AddDockWidget(AddDockWidget::new(params)))
    }

    /// Add `to_add` as a tab of `target`
    pub fn add_dock_widget_as_tab(target: impl Into<String>, to_add: impl Into<String>) -> Self {
        Self::from_params(OperationParams::AddDockWidgetAsTab(AddDockWidgetAsTab::new(
            target, to_add,
        )))
    }

    /// Save the whole layout into the driver
    pub fn save_layout() -> Self {
        Self::from_params(OperationParams::SaveLayout(SaveLayout))
    }

    /// Restore the driver's last saved layout
    pub fn restore_layout() -> Self {
        Self::from_params(OperationParams::RestoreLayout(RestoreLayout))
    }

    pub fn kind(&self) -> OperationKind {
        self.params.kind()
    }

    /// Kind name, used for logging and filtering
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn params(&self) -> &OperationParams {
        &self.params
    }

    /// Delay applied after execution
    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// The description as last computed (or as read from a log comment)
    pub fn description(&self) -> &str {
        &self.description
    }

    /// `type=<Kind>;description=<text>`
    pub fn summary(&self) -> String {
        format!("type={};description={}", self.name(), self.description)
    }

    pub fn has_params(&self) -> bool {
        dispatch!(&self.params, p => p.has_params())
    }

    pub fn generate_random_params<D: Driver>(&mut self, driver: &mut D) {
        dispatch!(&mut self.params, p => p.generate_random_params(driver))
    }

    /// Recompute the description against the host's current state
    pub fn update_description<H: DockHost>(&mut self, host: &H) -> &str {
        self.description = dispatch!(&self.params, p => p.describe(host));
        &self.description
    }

    /// Run this step.
    ///
    /// Generates params when none are present, then executes if that
    /// produced any. A step without a valid target is skipped silently.
    pub async fn execute<D: Driver>(&mut self, driver: &mut D) -> Result<StepOutcome, OperationError> {
        if !self.has_params() {
            self.generate_random_params(driver);
        }

        // Check again, generation can miss
        if !self.has_params() {
            self.update_description(driver.host());
            tracing::trace!(operation = self.name(), "no valid target, skipping");
            return Ok(StepOutcome::Skipped);
        }

        self.update_description(driver.host());
        tracing::debug!(
            operation = self.name(),
            description = %self.description,
            "executing"
        );

        dispatch!(&self.params, p => p.execute_impl(driver).await)?;

        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }

        Ok(StepOutcome::Executed)
    }

    /// Kind-specific params as a generic map, empty when there are none
    pub fn params_to_map(&self) -> Map<String, Value> {
        dispatch!(&self.params, p => p.params_to_map())
    }

    /// Replace params from a generic map
    pub fn fill_params_from_map(&mut self, map: &Map<String, Value>) -> Result<(), serde_json::Error> {
        dispatch!(&mut self.params, p => p.fill_params_from_map(map))
    }

    /// The log record for this operation, `None` when there is nothing to replay
    pub fn to_record(&self) -> Option<OperationRecord> {
        let params = self.params_to_map();
        if params.is_empty() {
            return None;
        }

        Some(OperationRecord {
            kind: self.kind().code(),
            params,
            comment: self.description.clone(),
            pause: (!self.pause.is_zero()).then(|| self.pause.as_millis() as u64),
        })
    }

    /// Generic-map form of [`to_record`](Self::to_record); empty when there is
    /// nothing to replay
    pub fn to_map(&self) -> Map<String, Value> {
        self.to_record()
            .map(OperationRecord::into_map)
            .unwrap_or_default()
    }

    /// Rebuild an operation from a generic map.
    ///
    /// `None` when `type` or `params` is missing or the kind is unknown. An
    /// operation whose params are empty or do not match its schema is still
    /// returned, unparameterized; check [`has_params`](Self::has_params).
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        match OperationRecord::from_map(map) {
            Ok(record) => Self::from_record(&record),
            Err(e) => {
                tracing::warn!(operation = "from_map", error = %e, map = ?map, "Invalid map");
                None
            }
        }
    }

    /// Rebuild an operation from a typed record
    pub fn from_record(record: &OperationRecord) -> Option<Self> {
        let Some(mut operation) = Self::from_code(record.kind) else {
            tracing::warn!(operation = "from_map", record = ?record, "Failed to fill params");
            return None;
        };

        if record.params.is_empty() {
            tracing::warn!(operation = "from_map", record = ?record, "Invalid params");
        } else if let Err(e) = operation.fill_params_from_map(&record.params) {
            tracing::warn!(
                operation = "from_map",
                error = %e,
                params = ?record.params,
                "Invalid params"
            );
        }

        if let Some(pause) = record.pause {
            operation.pause = Duration::from_millis(pause);
        }
        operation.description = record.comment.clone();

        Some(operation)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// `name`, `name-[hidden]` or `null` depending on the widget's current state
pub(crate) fn dock_str<H: DockHost>(host: &H, name: &str) -> String {
    match host.dock_widget(name) {
        Some(info) if info.visible => name.to_string(),
        Some(_) => format!("{name}-[hidden]"),
        None => "null".to_string(),
    }
}

/// Block the step until `window` is gone, if the effect scheduled its deletion
pub(crate) async fn wait_if_being_deleted<D: Driver>(
    driver: &mut D,
    window: Option<WindowId>,
) -> Result<(), OperationError> {
    let Some(window) = window else {
        return Ok(());
    };
    if !driver.host().is_being_deleted(window) {
        return Ok(());
    }

    let timeout = driver.teardown_timeout();
    wait_for_deleted(driver.host_mut(), window, timeout).await
}

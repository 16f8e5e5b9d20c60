//! Placement parameters for adding a dock widget to a main window

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::host::{DockHost, DockWidgetInfo};
use crate::location::{AddingOptions, Location};

/// Everything needed to re-issue an "add dock widget" call.
///
/// Targets are stored by name; the accessors resolve them against the host
/// at execution time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDockWidgetParams {
    pub main_window_name: String,
    pub dock_widget_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_to_name: Option<String>,
    pub location: Location,
    #[serde(default)]
    pub adding_option: AddingOptions,
}

impl AddDockWidgetParams {
    /// Params with no relative-to widget and no options
    pub fn new(
        main_window_name: impl Into<String>,
        dock_widget_name: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            main_window_name: main_window_name.into(),
            dock_widget_name: dock_widget_name.into(),
            relative_to_name: None,
            location,
            adding_option: AddingOptions::empty(),
        }
    }

    /// Dock relative to another widget instead of the main window edge
    pub fn relative_to(mut self, name: impl Into<String>) -> Self {
        self.relative_to_name = Some(name.into());
        self
    }

    /// Set the adding options
    pub fn with_option(mut self, option: AddingOptions) -> Self {
        self.adding_option = option;
        self
    }

    /// Whether there is nothing to execute
    pub fn is_null(&self) -> bool {
        self.main_window_name.is_empty()
            || self.dock_widget_name.is_empty()
            || self.location.is_sentinel()
    }

    /// Resolve the dock widget being added
    pub fn dock_widget<H: DockHost>(&self, host: &H) -> Option<DockWidgetInfo> {
        host.dock_widget(&self.dock_widget_name)
    }

    /// Whether the destination main window exists
    pub fn main_window<H: DockHost>(&self, host: &H) -> bool {
        host.has_main_window(&self.main_window_name)
    }

    /// Resolve the relative-to widget, `None` when unset or gone
    pub fn relative_to_widget<H: DockHost>(&self, host: &H) -> Option<DockWidgetInfo> {
        self.relative_to_name
            .as_deref()
            .and_then(|name| host.dock_widget(name))
    }

    /// Serialize into a generic map
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Deserialize from a generic map
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(map.clone()))
    }
}

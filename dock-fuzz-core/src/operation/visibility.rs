//! Close, hide and show through the dock widget API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{dock_str, wait_if_being_deleted, Step};
use crate::driver::Driver;
use crate::error::OperationError;
use crate::host::DockHost;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetParams {
    dock_widget_name: String,
}

fn target_to_map(name: &Option<String>) -> Map<String, Value> {
    let mut map = Map::new();
    if let Some(name) = name {
        map.insert("dockWidgetName".into(), Value::String(name.clone()));
    }
    map
}

fn target_from_map(map: &Map<String, Value>) -> Result<Option<String>, serde_json::Error> {
    let params: TargetParams = serde_json::from_value(Value::Object(map.clone()))?;
    Ok(Some(params.dock_widget_name).filter(|name| !name.is_empty()))
}

fn has_target(name: &Option<String>) -> bool {
    name.as_deref().is_some_and(|name| !name.is_empty())
}

/// Close the widget and wait for its floating window if that emptied it
async fn close_and_wait<D: Driver>(driver: &mut D, name: &str) -> Result<(), OperationError> {
    let info = driver
        .host()
        .dock_widget(name)
        .ok_or_else(|| OperationError::UnknownDockWidget(name.to_string()))?;
    let floating = info.floating_window();

    driver.host_mut().close_dock_widget(name)?;
    wait_if_being_deleted(driver, floating).await
}

/// Close a visible dock widget
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseViaDockWidgetApi {
    dock_widget_name: Option<String>,
}

impl CloseViaDockWidgetApi {
    pub fn new(dock_widget_name: impl Into<String>) -> Self {
        Self {
            dock_widget_name: Some(dock_widget_name.into()),
        }
    }

    pub fn dock_widget_name(&self) -> Option<&str> {
        self.dock_widget_name.as_deref()
    }
}

impl Step for CloseViaDockWidgetApi {
    fn has_params(&self) -> bool {
        has_target(&self.dock_widget_name)
    }

    fn generate_random_params<D: Driver>(&mut self, driver: &mut D) {
        if let Some(name) = driver.random_dock_widget(&|dw| dw.visible, &[]) {
            self.dock_widget_name = Some(name);
        }
    }

    fn describe<H: DockHost>(&self, host: &H) -> String {
        format!(
            "Closing {}",
            dock_str(host, self.dock_widget_name().unwrap_or_default())
        )
    }

    async fn execute_impl<D: Driver>(&self, driver: &mut D) -> Result<(), OperationError> {
        close_and_wait(driver, self.dock_widget_name().unwrap_or_default()).await
    }

    fn params_to_map(&self) -> Map<String, Value> {
        target_to_map(&self.dock_widget_name)
    }

    fn fill_params_from_map(&mut self, map: &Map<String, Value>) -> Result<(), serde_json::Error> {
        self.dock_widget_name = target_from_map(map)?;
        Ok(())
    }
}

/// Hide a visible dock widget.
///
/// The effect is a close, same as [`CloseViaDockWidgetApi`]; recorded logs
/// depend on that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HideViaDockWidgetApi {
    dock_widget_name: Option<String>,
}

impl HideViaDockWidgetApi {
    pub fn new(dock_widget_name: impl Into<String>) -> Self {
        Self {
            dock_widget_name: Some(dock_widget_name.into()),
        }
    }

    pub fn dock_widget_name(&self) -> Option<&str> {
        self.dock_widget_name.as_deref()
    }
}

impl Step for HideViaDockWidgetApi {
    fn has_params(&self) -> bool {
        has_target(&self.dock_widget_name)
    }

    fn generate_random_params<D: Driver>(&mut self, driver: &mut D) {
        if let Some(name) = driver.random_dock_widget(&|dw| dw.visible, &[]) {
            self.dock_widget_name = Some(name);
        }
    }

    fn describe<H: DockHost>(&self, host: &H) -> String {
        format!(
            "Hidding {}",
            dock_str(host, self.dock_widget_name().unwrap_or_default())
        )
    }

    async fn execute_impl<D: Driver>(&self, driver: &mut D) -> Result<(), OperationError> {
        close_and_wait(driver, self.dock_widget_name().unwrap_or_default()).await
    }

    fn params_to_map(&self) -> Map<String, Value> {
        target_to_map(&self.dock_widget_name)
    }

    fn fill_params_from_map(&mut self, map: &Map<String, Value>) -> Result<(), serde_json::Error> {
        self.dock_widget_name = target_from_map(map)?;
        Ok(())
    }
}

/// Show a hidden dock widget
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowViaDockWidgetApi {
    dock_widget_name: Option<String>,
}

impl ShowViaDockWidgetApi {
    pub fn new(dock_widget_name: impl Into<String>) -> Self {
        Self {
            dock_widget_name: Some(dock_widget_name.into()),
        }
    }

    pub fn dock_widget_name(&self) -> Option<&str> {
        self.dock_widget_name.as_deref()
    }
}

impl Step for ShowViaDockWidgetApi {
    fn has_params(&self) -> bool {
        has_target(&self.dock_widget_name)
    }

    fn generate_random_params<D: Driver>(&mut self, driver: &mut D) {
        if let Some(name) = driver.random_dock_widget(&|dw| !dw.visible, &[]) {
            self.dock_widget_name = Some(name);
        }
    }

    fn describe<H: DockHost>(&self, host: &H) -> String {
        format!(
            "Showing {}",
            dock_str(host, self.dock_widget_name().unwrap_or_default())
        )
    }

    async fn execute_impl<D: Driver>(&self, driver: &mut D) -> Result<(), OperationError> {
        let name = self.dock_widget_name().unwrap_or_default();
        if driver.host().dock_widget(name).is_none() {
            return Err(OperationError::UnknownDockWidget(name.to_string()));
        }

        driver.host_mut().show_dock_widget(name)?;
        Ok(())
    }

    fn params_to_map(&self) -> Map<String, Value> {
        target_to_map(&self.dock_widget_name)
    }

    fn fill_params_from_map(&mut self, map: &Map<String, Value>) -> Result<(), serde_json::Error> {
        self.dock_widget_name = target_from_map(map)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InitialLayout;
    use crate::operation::{Operation, StepOutcome};
    use crate::testing::FakeDriver;
    use serde_json::json;

    fn floating_pair() -> FakeDriver {
        FakeDriver::from_layout(
            &InitialLayout::new()
                .main_window("main")
                .dock_widget("A", true)
                .dock_widget("B", false),
        )
    }

    #[tokio::test]
    async fn test_close_waits_for_floating_window() {
        let mut driver = floating_pair();
        let window = driver.host().dock_widget("A").unwrap().window.unwrap();

        let mut op = Operation::close("A");
        assert_eq!(op.execute(&mut driver).await.unwrap(), StepOutcome::Executed);

        assert_eq!(op.description(), "Closing A");
        assert!(!driver.host().dock_widget("A").unwrap().visible);
        assert!(!driver.host().window_exists(window));
    }

    #[tokio::test]
    async fn test_hide_behaves_as_close() {
        let mut driver = floating_pair();
        let window = driver.host().dock_widget("A").unwrap().window.unwrap();

        let mut op = Operation::hide("A");
        op.execute(&mut driver).await.unwrap();

        assert_eq!(op.description(), "Hidding A");
        assert!(!driver.host().dock_widget("A").unwrap().visible);
        assert!(!driver.host().window_exists(window));
    }

    #[tokio::test]
    async fn test_show_only_targets_hidden_widgets() {
        let mut driver = floating_pair();

        let mut op = Operation::new(crate::kind::OperationKind::ShowViaDockWidgetApi).unwrap();
        op.generate_random_params(&mut driver);
        assert_eq!(op.params_to_map()["dockWidgetName"], json!("B"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_times_out_when_teardown_stalls() {
        let mut driver = floating_pair();
        driver.host_mut().set_stall_teardown(true);

        let mut op = Operation::close("A");
        let err = op.execute(&mut driver).await.unwrap_err();
        assert!(matches!(err, OperationError::TeardownTimeout { .. }));
    }

    #[test]
    fn test_empty_name_is_no_params() {
        let mut op = CloseViaDockWidgetApi::default();
        let map = json!({ "dockWidgetName": "" });
        op.fill_params_from_map(map.as_object().unwrap()).unwrap();
        assert!(!op.has_params());
        assert!(op.params_to_map().is_empty());
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let mut op = ShowViaDockWidgetApi::new("A");
        let map = json!({ "name": "B" });
        assert!(op.fill_params_from_map(map.as_object().unwrap()).is_err());
        // Untouched on error
        assert_eq!(op.dock_widget_name(), Some("A"));
    }
}

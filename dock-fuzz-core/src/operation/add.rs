//! Docking operations: add to a main window, add as a tab

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{dock_str, wait_if_being_deleted, Step};
use crate::driver::Driver;
use crate::error::OperationError;
use crate::host::DockHost;
use crate::params::AddDockWidgetParams;

/// Dock a widget into a main window at a random placement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddDockWidget {
    params: Option<AddDockWidgetParams>,
}

impl AddDockWidget {
    pub fn new(params: AddDockWidgetParams) -> Self {
        Self {
            params: Some(params),
        }
    }

    pub fn params(&self) -> Option<&AddDockWidgetParams> {
        self.params.as_ref()
    }
}

impl Step for AddDockWidget {
    fn has_params(&self) -> bool {
        self.params.as_ref().is_some_and(|p| !p.is_null())
    }

    fn generate_random_params<D: Driver>(&mut self, driver: &mut D) {
        self.params = driver.random_add_dock_widget_params();
    }

    fn describe<H: DockHost>(&self, host: &H) -> String {
        let Some(params) = &self.params else {
            return "AddDockWidget null".to_string();
        };

        let location = params.location.name();
        match &params.relative_to_name {
            None => format!(
                "AddDockWidget {} to {}",
                dock_str(host, &params.dock_widget_name),
                location
            ),
            Some(relative_to) => format!(
                "AddDockWidget {} to {}, relative to {}",
                dock_str(host, &params.dock_widget_name),
                location,
                dock_str(host, relative_to)
            ),
        }
    }

    async fn execute_impl<D: Driver>(&self, driver: &mut D) -> Result<(), OperationError> {
        let Some(params) = &self.params else {
            return Ok(());
        };

        let host = driver.host();
        let dock_widget = params
            .dock_widget(host)
            .ok_or_else(|| OperationError::UnknownDockWidget(params.dock_widget_name.clone()))?;
        if !params.main_window(host) {
            return Err(OperationError::UnknownMainWindow(
                params.main_window_name.clone(),
            ));
        }
        if let Some(relative_to) = &params.relative_to_name {
            if params.relative_to_widget(host).is_none() {
                return Err(OperationError::UnknownDockWidget(relative_to.clone()));
            }
        }

        let floating = dock_widget.floating_window();
        driver.host_mut().add_dock_widget(params)?;
        wait_if_being_deleted(driver, floating).await
    }

    fn params_to_map(&self) -> Map<String, Value> {
        match &self.params {
            Some(params) if !params.is_null() => params.to_map(),
            _ => Map::new(),
        }
    }

    fn fill_params_from_map(&mut self, map: &Map<String, Value>) -> Result<(), serde_json::Error> {
        self.params = Some(AddDockWidgetParams::from_map(map)?);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TabParams {
    dock_widget_name: String,
    dock_widget_to_add_name: String,
}

/// Add one widget as a tab next to another that lives in a different window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddDockWidgetAsTab {
    dock_widget_name: Option<String>,
    dock_widget_to_add_name: Option<String>,
}

impl AddDockWidgetAsTab {
    pub fn new(target: impl Into<String>, to_add: impl Into<String>) -> Self {
        Self {
            dock_widget_name: Some(target.into()),
            dock_widget_to_add_name: Some(to_add.into()),
        }
    }

    /// The widget whose frame receives the new tab
    pub fn dock_widget_name(&self) -> Option<&str> {
        self.dock_widget_name.as_deref()
    }

    /// The widget moved into that frame
    pub fn dock_widget_to_add_name(&self) -> Option<&str> {
        self.dock_widget_to_add_name.as_deref()
    }
}

impl Step for AddDockWidgetAsTab {
    fn has_params(&self) -> bool {
        let present = |name: &Option<String>| name.as_deref().is_some_and(|n| !n.is_empty());
        present(&self.dock_widget_name) && present(&self.dock_widget_to_add_name)
    }

    fn generate_random_params<D: Driver>(&mut self, driver: &mut D) {
        let Some(target) = driver.random_dock_widget(&|_| true, &[]) else {
            return;
        };
        let Some(info) = driver.host().dock_widget(&target) else {
            return;
        };
        let Some(frame) = info.frame else {
            return;
        };

        // The target's tab siblings and everything sharing its window
        let exclude: Vec<String> = driver
            .host()
            .dock_widgets()
            .into_iter()
            .filter(|dw| {
                dw.frame == Some(frame) || (info.window.is_some() && dw.window == info.window)
            })
            .map(|dw| dw.name)
            .collect();

        let Some(to_add) = driver.random_dock_widget(&|dw| dw.window.is_some(), &exclude) else {
            return;
        };

        self.dock_widget_name = Some(target);
        self.dock_widget_to_add_name = Some(to_add);
    }

    fn describe<H: DockHost>(&self, host: &H) -> String {
        format!(
            "AddDockWidgetAsTab {} onto {}",
            dock_str(host, self.dock_widget_to_add_name().unwrap_or_default()),
            dock_str(host, self.dock_widget_name().unwrap_or_default())
        )
    }

    async fn execute_impl<D: Driver>(&self, driver: &mut D) -> Result<(), OperationError> {
        let target = self.dock_widget_name().unwrap_or_default();
        let to_add = self.dock_widget_to_add_name().unwrap_or_default();

        if driver.host().dock_widget(target).is_none() {
            return Err(OperationError::UnknownDockWidget(target.to_string()));
        }
        let floating = driver
            .host()
            .dock_widget(to_add)
            .ok_or_else(|| OperationError::UnknownDockWidget(to_add.to_string()))?
            .floating_window();

        driver.host_mut().add_dock_widget_as_tab(target, to_add)?;
        wait_if_being_deleted(driver, floating).await
    }

    fn params_to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if self.has_params() {
            map.insert(
                "dockWidgetName".into(),
                Value::String(self.dock_widget_name().unwrap_or_default().to_string()),
            );
            map.insert(
                "dockWidgetToAddName".into(),
                Value::String(self.dock_widget_to_add_name().unwrap_or_default().to_string()),
            );
        }
        map
    }

    fn fill_params_from_map(&mut self, map: &Map<String, Value>) -> Result<(), serde_json::Error> {
        let params: TabParams = serde_json::from_value(Value::Object(map.clone()))?;
        self.dock_widget_name = Some(params.dock_widget_name);
        self.dock_widget_to_add_name = Some(params.dock_widget_to_add_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DockHost, InitialLayout};
    use crate::location::{AddingOptions, Location};
    use crate::operation::Operation;
    use crate::testing::FakeDriver;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_dock_widget_waits_for_old_floating_window() {
        let mut driver = FakeDriver::from_layout(
            &InitialLayout::new()
                .main_window("main")
                .dock_widget("A", true),
        );
        let old_window = driver.host().dock_widget("A").unwrap().window.unwrap();

        let mut op = Operation::add_dock_widget(AddDockWidgetParams::new(
            "main",
            "A",
            Location::OnTop,
        ));
        op.execute(&mut driver).await.unwrap();

        assert_eq!(op.description(), "AddDockWidget A to top");
        let info = driver.host().dock_widget("A").unwrap();
        assert!(info.visible);
        assert!(!info.floating);
        assert!(!driver.host().window_exists(old_window));
    }

    #[tokio::test]
    async fn test_add_dock_widget_generates_from_driver_queue() {
        let mut driver = FakeDriver::from_layout(
            &InitialLayout::new()
                .main_window("main")
                .dock_widget("A", false),
        )
        .with_add_params(
            AddDockWidgetParams::new("main", "A", Location::OnBottom)
                .with_option(AddingOptions::START_HIDDEN),
        );

        let mut op = Operation::new(crate::kind::OperationKind::AddDockWidget).unwrap();
        assert!(op.execute(&mut driver).await.unwrap().is_executed());
        assert_eq!(op.params_to_map()["addingOption"], json!(1));
        assert!(!driver.host().dock_widget("A").unwrap().visible);
    }

    #[tokio::test]
    async fn test_add_dock_widget_unknown_main_window() {
        let mut driver = FakeDriver::from_layout(
            &InitialLayout::new()
                .main_window("main")
                .dock_widget("A", true),
        );

        let mut op = Operation::add_dock_widget(AddDockWidgetParams::new(
            "other",
            "A",
            Location::OnTop,
        ));
        let err = op.execute(&mut driver).await.unwrap_err();
        assert!(matches!(err, OperationError::UnknownMainWindow(name) if name == "other"));
    }

    #[tokio::test]
    async fn test_tab_generation_excludes_same_window() {
        // A and C share a main window frame, B floats on its own
        let mut driver = FakeDriver::from_layout(
            &InitialLayout::new()
                .main_window("main")
                .dock_widget("A", true)
                .dock_widget("C", true)
                .dock_widget("B", true),
        );
        driver
            .host_mut()
            .add_dock_widget(&AddDockWidgetParams::new("main", "A", Location::OnLeft))
            .unwrap();
        driver.host_mut().add_dock_widget_as_tab("A", "C").unwrap();
        driver.host_mut().process_events().await;

        let mut op = AddDockWidgetAsTab::default();
        op.generate_random_params(&mut driver);

        assert_eq!(op.dock_widget_name(), Some("A"));
        assert_eq!(op.dock_widget_to_add_name(), Some("B"));
    }

    #[tokio::test]
    async fn test_tab_generation_misses_without_other_window() {
        let mut driver = FakeDriver::from_layout(
            &InitialLayout::new()
                .main_window("main")
                .dock_widget("A", true)
                .dock_widget("C", true),
        );
        driver.host_mut().add_dock_widget_as_tab("A", "C").unwrap();
        driver.host_mut().process_events().await;

        let mut op = AddDockWidgetAsTab::default();
        op.generate_random_params(&mut driver);
        assert!(!op.has_params());
        assert!(op.params_to_map().is_empty());
    }

    #[tokio::test]
    async fn test_tab_execute_moves_widget() {
        let mut driver = FakeDriver::from_layout(
            &InitialLayout::new()
                .main_window("main")
                .dock_widget("A", true)
                .dock_widget("B", true),
        );
        let b_window = driver.host().dock_widget("B").unwrap().window.unwrap();

        let mut op = Operation::add_dock_widget_as_tab("A", "B");
        op.execute(&mut driver).await.unwrap();

        assert_eq!(op.description(), "AddDockWidgetAsTab B onto A");
        let a = driver.host().dock_widget("A").unwrap();
        let b = driver.host().dock_widget("B").unwrap();
        assert_eq!(a.frame, b.frame);
        assert!(!driver.host().window_exists(b_window));
    }

    #[test]
    fn test_tab_params_map() {
        let op = AddDockWidgetAsTab::new("A", "B");
        let map = op.params_to_map();
        assert_eq!(map["dockWidgetName"], json!("A"));
        assert_eq!(map["dockWidgetToAddName"], json!("B"));

        let mut restored = AddDockWidgetAsTab::default();
        restored.fill_params_from_map(&map).unwrap();
        assert_eq!(restored, op);
    }
}

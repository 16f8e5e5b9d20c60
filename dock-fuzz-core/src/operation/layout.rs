//! Save and restore the whole layout

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::{wait_if_being_deleted, Step};
use crate::driver::Driver;
use crate::error::OperationError;
use crate::host::{DockHost, DockWidgetInfo};

/// Serialize the layout and hand the blob to the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveLayout;

impl Step for SaveLayout {
    fn has_params(&self) -> bool {
        true
    }

    fn generate_random_params<D: Driver>(&mut self, _driver: &mut D) {}

    fn describe<H: DockHost>(&self, _host: &H) -> String {
        "SaveLayout".to_string()
    }

    async fn execute_impl<D: Driver>(&self, driver: &mut D) -> Result<(), OperationError> {
        let blob = driver.host().serialize_layout();
        tracing::debug!(bytes = blob.len(), "layout saved");
        driver.set_last_saved_layout(blob);
        Ok(())
    }

    fn params_to_map(&self) -> Map<String, Value> {
        Map::new()
    }

    fn fill_params_from_map(&mut self, _map: &Map<String, Value>) -> Result<(), serde_json::Error> {
        Ok(())
    }
}

/// Restore the driver's last saved blob
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreLayout;

impl Step for RestoreLayout {
    fn has_params(&self) -> bool {
        true
    }

    fn generate_random_params<D: Driver>(&mut self, _driver: &mut D) {}

    fn describe<H: DockHost>(&self, _host: &H) -> String {
        "RestoreLayout".to_string()
    }

    async fn execute_impl<D: Driver>(&self, driver: &mut D) -> Result<(), OperationError> {
        let blob = match driver.last_saved_layout() {
            Some(blob) if !blob.is_empty() => blob.to_vec(),
            _ => {
                tracing::debug!("Skipping, nothing to restore");
                return Ok(());
            }
        };

        let floating: BTreeSet<_> = driver
            .host()
            .dock_widgets()
            .iter()
            .filter_map(DockWidgetInfo::floating_window)
            .collect();

        driver.host_mut().restore_layout(&blob)?;

        for window in floating {
            wait_if_being_deleted(driver, Some(window)).await?;
        }
        Ok(())
    }

    fn params_to_map(&self) -> Map<String, Value> {
        Map::new()
    }

    fn fill_params_from_map(&mut self, _map: &Map<String, Value>) -> Result<(), serde_json::Error> {
        Ok(())
    }
}

//! Replay log files
//!
//! A replay log is everything needed to reproduce a run: the layout the host
//! was reset to and the ordered operation records. Failure dumps also carry
//! the host's final layout blob, base64 encoded, for comparison after a
//! replay.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ReplayError;
use crate::host::InitialLayout;
use crate::operation::Operation;

/// Current file format version
pub const REPLAY_FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    REPLAY_FORMAT_VERSION
}

mod base64_blob {
    use base64::prelude::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(blob: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match blob {
            Some(bytes) => serializer.serialize_str(&BASE64_STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        BASE64_STANDARD
            .decode(text.as_bytes())
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// A recorded run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayLog {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub initial_layout: InitialLayout,
    /// Operation records in execution order, kept as raw maps so a single
    /// malformed record does not make the whole file unreadable
    #[serde(default)]
    pub operations: Vec<Map<String, Value>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_blob"
    )]
    pub final_layout: Option<Vec<u8>>,
}

impl ReplayLog {
    pub fn new(initial_layout: InitialLayout) -> Self {
        Self {
            version: REPLAY_FORMAT_VERSION,
            initial_layout,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Append an operation's record. Returns false for operations with
    /// nothing to replay (save/restore, unparameterized).
    pub fn push(&mut self, operation: &Operation) -> bool {
        let map = operation.to_map();
        if map.is_empty() {
            return false;
        }
        self.operations.push(map);
        true
    }

    /// Rebuild the operations, dropping records that do not deserialize
    pub fn decode_operations(&self) -> Vec<Operation> {
        self.operations
            .iter()
            .filter_map(Operation::from_map)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let log = Self::from_json(&json)?;
        if log.version != REPLAY_FORMAT_VERSION {
            tracing::warn!(
                path = %path.display(),
                version = log.version,
                "Unexpected replay log version"
            );
        }
        Ok(log)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use crate::params::AddDockWidgetParams;
    use serde_json::json;

    fn layout() -> InitialLayout {
        InitialLayout::new()
            .main_window("MyMainWindow-0")
            .dock_widget("DockWidget-0", true)
    }

    #[test]
    fn test_push_skips_empty_records() {
        let mut log = ReplayLog::new(layout());
        assert!(log.push(&Operation::close("DockWidget-0")));
        assert!(!log.push(&Operation::save_layout()));
        assert!(!log.push(&Operation::new(crate::kind::OperationKind::ShowViaDockWidgetApi).unwrap()));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_file_envelope() {
        let mut log = ReplayLog::new(layout()).with_seed(42);
        log.push(&Operation::add_dock_widget(AddDockWidgetParams::new(
            "MyMainWindow-0",
            "DockWidget-0",
            Location::OnLeft,
        )));
        log.final_layout = Some(b"{}".to_vec());

        let value: Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(value["version"], json!(1));
        assert_eq!(value["seed"], json!(42));
        assert_eq!(value["initialLayout"]["mainWindows"], json!(["MyMainWindow-0"]));
        assert_eq!(value["operations"][0]["type"], json!(4));
        assert_eq!(value["finalLayout"], json!("e30="));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");

        let mut log = ReplayLog::new(layout());
        log.push(&Operation::hide("DockWidget-0"));
        log.final_layout = Some(vec![1, 2, 3]);
        log.save(&path).unwrap();

        let loaded = ReplayLog::load(&path).unwrap();
        assert_eq!(loaded, log);
        assert_eq!(loaded.decode_operations().len(), 1);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = ReplayLog::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ReplayError::Io { .. }));

        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ReplayLog::load(&path), Err(ReplayError::Json(_))));
    }

    #[test]
    fn test_malformed_records_are_dropped_on_decode() {
        let log = ReplayLog::from_json(
            r#"{
                "initialLayout": { "mainWindows": [], "dockWidgets": [] },
                "operations": [
                    { "type": 1, "params": { "dockWidgetName": "A" } },
                    { "type": 99, "params": { "dockWidgetName": "A" } },
                    { "params": {} }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(log.version, REPLAY_FORMAT_VERSION);
        assert_eq!(log.decode_operations().len(), 1);
    }
}

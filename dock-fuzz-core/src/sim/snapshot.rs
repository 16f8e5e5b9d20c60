//! Serialized layout blob of the simulated host

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Where a frame sits inside its window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Side it was docked to, `None` for floating frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Dock widget it was docked relative to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<String>,
}

impl Placement {
    pub fn floating() -> Self {
        Self::default()
    }

    pub fn docked(location: Location, relative_to: Option<String>) -> Self {
        Self {
            location: Some(location),
            relative_to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    #[serde(flatten)]
    pub placement: Placement,
    /// Tab order
    pub dock_widgets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainWindowSnapshot {
    pub name: String,
    pub frames: Vec<FrameSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingWindowSnapshot {
    pub frames: Vec<FrameSnapshot>,
}

/// Topology only; window and frame ids are not part of it, so two hosts with
/// the same arrangement produce the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub main_windows: Vec<MainWindowSnapshot>,
    pub floating_windows: Vec<FloatingWindowSnapshot>,
}

impl LayoutSnapshot {
    /// Every dock widget name that appears in the snapshot, in order
    pub fn dock_widget_names(&self) -> impl Iterator<Item = &str> {
        let main = self.main_windows.iter().flat_map(|w| w.frames.iter());
        let floating = self.floating_windows.iter().flat_map(|w| w.frames.iter());
        main.chain(floating)
            .flat_map(|f| f.dock_widgets.iter().map(String::as_str))
    }
}

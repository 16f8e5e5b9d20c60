//! In-memory docking host
//!
//! Models topology only: which dock widget sits in which frame, which frame
//! in which window, and the placement each frame was docked with. There is
//! no geometry.
//!
//! Emptied floating windows are not removed right away. They are queued for
//! deletion and disappear on the next [`DockHost::process_events`], the same
//! deferred teardown a GUI toolkit performs.

mod snapshot;

pub use snapshot::{
    FloatingWindowSnapshot, FrameSnapshot, LayoutSnapshot, MainWindowSnapshot, Placement,
};

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::host::{DockHost, DockWidgetInfo, FrameId, HostError, InitialLayout, WindowId};
use crate::location::AddingOptions;
use crate::params::AddDockWidgetParams;

#[derive(Debug, Clone)]
struct Window {
    /// Set for main windows, `None` for floating ones
    main_name: Option<String>,
    frames: Vec<FrameId>,
}

#[derive(Debug, Clone)]
struct Frame {
    window: WindowId,
    placement: Placement,
    members: Vec<String>,
}

#[derive(Debug, Clone)]
struct DockWidget {
    name: String,
    frame: Option<FrameId>,
}

/// A docking library that lives entirely in memory
#[derive(Debug, Clone, Default)]
pub struct SimulatedDockHost {
    windows: BTreeMap<WindowId, Window>,
    frames: BTreeMap<FrameId, Frame>,
    // Registration order
    dock_widgets: Vec<DockWidget>,
    pending_deletion: BTreeSet<WindowId>,
    next_id: u64,
    stall_teardown: bool,
}

impl SimulatedDockHost {
    /// An empty host with no windows
    pub fn new() -> Self {
        Self::default()
    }

    /// A host reset to `layout`
    pub fn from_layout(layout: &InitialLayout) -> Result<Self, HostError> {
        let mut host = Self::new();
        host.reset(layout)?;
        Ok(host)
    }

    /// Keep deferred deletions pending forever
    pub fn set_stall_teardown(&mut self, stall: bool) {
        self.stall_teardown = stall;
    }

    /// Placement of the frame currently holding `name`
    pub fn placement_of(&self, name: &str) -> Option<&Placement> {
        let frame = self.find(name)?.frame?;
        self.frames.get(&frame).map(|f| &f.placement)
    }

    /// Tab members of the frame holding `name`, in tab order
    pub fn frame_members(&self, name: &str) -> Vec<String> {
        self.find(name)
            .and_then(|dw| dw.frame)
            .and_then(|frame| self.frames.get(&frame))
            .map(|f| f.members.clone())
            .unwrap_or_default()
    }

    /// Floating windows still alive, pending ones included
    pub fn floating_window_count(&self) -> usize {
        self.windows.values().filter(|w| w.main_name.is_none()).count()
    }

    /// Windows queued for deletion
    pub fn pending_deletions(&self) -> usize {
        self.pending_deletion.len()
    }

    /// Decode a blob produced by [`DockHost::serialize_layout`]
    pub fn decode_layout(blob: &[u8]) -> Result<LayoutSnapshot, HostError> {
        serde_json::from_slice(blob).map_err(|e| HostError::InvalidLayout(e.to_string()))
    }

    /// The current topology as a snapshot
    pub fn snapshot(&self) -> LayoutSnapshot {
        let frames_of = |window: &Window| -> Vec<FrameSnapshot> {
            window
                .frames
                .iter()
                .filter_map(|id| self.frames.get(id))
                .map(|f| FrameSnapshot {
                    placement: f.placement.clone(),
                    dock_widgets: f.members.clone(),
                })
                .collect()
        };

        let mut snapshot = LayoutSnapshot::default();
        for window in self.windows.values() {
            match &window.main_name {
                Some(name) => snapshot.main_windows.push(MainWindowSnapshot {
                    name: name.clone(),
                    frames: frames_of(window),
                }),
                None if !window.frames.is_empty() => {
                    snapshot.floating_windows.push(FloatingWindowSnapshot {
                        frames: frames_of(window),
                    })
                }
                None => {}
            }
        }
        snapshot
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn find(&self, name: &str) -> Option<&DockWidget> {
        self.dock_widgets.iter().find(|dw| dw.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut DockWidget> {
        self.dock_widgets.iter_mut().find(|dw| dw.name == name)
    }

    fn require(&self, name: &str) -> Result<&DockWidget, HostError> {
        self.find(name)
            .ok_or_else(|| HostError::UnknownDockWidget(name.to_string()))
    }

    fn info(&self, dw: &DockWidget) -> DockWidgetInfo {
        let frame = dw.frame.and_then(|id| self.frames.get(&id).map(|f| (id, f)));
        let window = frame.and_then(|(_, f)| self.windows.get(&f.window).map(|w| (f.window, w)));

        DockWidgetInfo {
            name: dw.name.clone(),
            visible: dw.frame.is_some(),
            frame: frame.map(|(id, _)| id),
            window: window.map(|(id, _)| id),
            floating: window.is_some_and(|(_, w)| w.main_name.is_none()),
        }
    }

    fn new_floating_window(&mut self) -> WindowId {
        let id = WindowId(self.alloc_id());
        self.windows.insert(
            id,
            Window {
                main_name: None,
                frames: Vec::new(),
            },
        );
        id
    }

    fn new_frame(&mut self, window: WindowId, placement: Placement, members: Vec<String>) -> FrameId {
        let id = FrameId(self.alloc_id());
        for member in &members {
            if let Some(dw) = self.find_mut(member) {
                dw.frame = Some(id);
            }
        }
        self.frames.insert(
            id,
            Frame {
                window,
                placement,
                members,
            },
        );
        if let Some(w) = self.windows.get_mut(&window) {
            w.frames.push(id);
        }
        id
    }

    /// Take a widget out of its frame, dropping the frame when emptied and
    /// queueing the floating window when that emptied it
    fn detach(&mut self, name: &str) {
        let Some(frame_id) = self.find_mut(name).and_then(|dw| dw.frame.take()) else {
            return;
        };
        let Some(frame) = self.frames.get_mut(&frame_id) else {
            return;
        };
        frame.members.retain(|m| m != name);
        if !frame.members.is_empty() {
            return;
        }

        let window_id = frame.window;
        self.frames.remove(&frame_id);
        if let Some(window) = self.windows.get_mut(&window_id) {
            window.frames.retain(|f| *f != frame_id);
            if window.main_name.is_none() && window.frames.is_empty() {
                tracing::trace!(window = %window_id, "floating window scheduled for deletion");
                self.pending_deletion.insert(window_id);
            }
        }
    }

    fn float(&mut self, name: &str) {
        let window = self.new_floating_window();
        self.new_frame(window, Placement::floating(), vec![name.to_string()]);
    }

    fn validate_snapshot(&self, snapshot: &LayoutSnapshot) -> Result<(), HostError> {
        for window in &snapshot.main_windows {
            if self.main_window_id(&window.name).is_none() {
                return Err(HostError::InvalidLayout(format!(
                    "unknown main window {}",
                    window.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for name in snapshot.dock_widget_names() {
            if self.find(name).is_none() {
                return Err(HostError::InvalidLayout(format!("unknown dock widget {name}")));
            }
            if !seen.insert(name) {
                return Err(HostError::InvalidLayout(format!(
                    "dock widget {name} appears twice"
                )));
            }
        }

        let empty_frame = snapshot
            .main_windows
            .iter()
            .flat_map(|w| w.frames.iter())
            .chain(snapshot.floating_windows.iter().flat_map(|w| w.frames.iter()))
            .any(|f| f.dock_widgets.is_empty());
        if empty_frame {
            return Err(HostError::InvalidLayout("empty frame".into()));
        }

        Ok(())
    }
}

impl DockHost for SimulatedDockHost {
    fn dock_widget(&self, name: &str) -> Option<DockWidgetInfo> {
        self.find(name).map(|dw| self.info(dw))
    }

    fn dock_widgets(&self) -> Vec<DockWidgetInfo> {
        self.dock_widgets.iter().map(|dw| self.info(dw)).collect()
    }

    fn main_windows(&self) -> Vec<String> {
        self.windows
            .values()
            .filter_map(|w| w.main_name.clone())
            .collect()
    }

    fn main_window_id(&self, name: &str) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|(_, w)| w.main_name.as_deref() == Some(name))
            .map(|(id, _)| *id)
    }

    fn window_exists(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }

    fn is_being_deleted(&self, window: WindowId) -> bool {
        self.pending_deletion.contains(&window)
    }

    fn close_dock_widget(&mut self, name: &str) -> Result<(), HostError> {
        self.require(name)?;
        self.detach(name);
        Ok(())
    }

    fn show_dock_widget(&mut self, name: &str) -> Result<(), HostError> {
        if self.require(name)?.frame.is_some() {
            return Ok(());
        }
        self.float(name);
        Ok(())
    }

    fn add_dock_widget(&mut self, params: &AddDockWidgetParams) -> Result<(), HostError> {
        let name = params.dock_widget_name.as_str();
        self.require(name)?;
        let window = self
            .main_window_id(&params.main_window_name)
            .ok_or_else(|| HostError::UnknownMainWindow(params.main_window_name.clone()))?;

        if let Some(relative_to) = &params.relative_to_name {
            let docked_in_window = self
                .dock_widget(relative_to)
                .is_some_and(|info| info.window == Some(window) && !info.floating);
            if relative_to == name || !docked_in_window {
                return Err(HostError::InvalidRelativeTo {
                    relative_to: relative_to.clone(),
                    main_window: params.main_window_name.clone(),
                });
            }
        }

        self.detach(name);
        if params.adding_option.contains(AddingOptions::START_HIDDEN) {
            return Ok(());
        }

        let placement = Placement::docked(params.location, params.relative_to_name.clone());
        self.new_frame(window, placement, vec![name.to_string()]);
        Ok(())
    }

    fn add_dock_widget_as_tab(&mut self, target: &str, to_add: &str) -> Result<(), HostError> {
        let frame_id = self
            .require(target)?
            .frame
            .ok_or_else(|| HostError::NotDocked(target.to_string()))?;
        let current = self.require(to_add)?.frame;
        if current == Some(frame_id) {
            return Ok(());
        }

        self.detach(to_add);
        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.members.push(to_add.to_string());
        }
        if let Some(dw) = self.find_mut(to_add) {
            dw.frame = Some(frame_id);
        }
        Ok(())
    }

    fn serialize_layout(&self) -> Vec<u8> {
        // Plain data, serializing it cannot fail
        serde_json::to_vec(&self.snapshot()).unwrap_or_default()
    }

    fn restore_layout(&mut self, blob: &[u8]) -> Result<(), HostError> {
        let snapshot = Self::decode_layout(blob)?;
        self.validate_snapshot(&snapshot)?;

        // Tear down the current arrangement
        let names: Vec<String> = self.dock_widgets.iter().map(|dw| dw.name.clone()).collect();
        for name in &names {
            self.detach(name);
        }

        for window in snapshot.main_windows {
            let Some(id) = self.main_window_id(&window.name) else {
                continue;
            };
            for frame in window.frames {
                self.new_frame(id, frame.placement, frame.dock_widgets);
            }
        }
        for window in snapshot.floating_windows {
            let id = self.new_floating_window();
            for frame in window.frames {
                self.new_frame(id, frame.placement, frame.dock_widgets);
            }
        }

        tracing::debug!(
            pending = self.pending_deletion.len(),
            "layout restored"
        );
        Ok(())
    }

    fn reset(&mut self, layout: &InitialLayout) -> Result<(), HostError> {
        let mut main_names = HashSet::new();
        if let Some(dup) = layout.main_windows.iter().find(|n| !main_names.insert(n.as_str())) {
            return Err(HostError::InvalidLayout(format!("duplicate main window {dup}")));
        }
        let mut dock_names = HashSet::new();
        if let Some(dup) = layout
            .dock_widgets
            .iter()
            .find(|d| !dock_names.insert(d.name.as_str()))
        {
            return Err(HostError::InvalidLayout(format!(
                "duplicate dock widget {}",
                dup.name
            )));
        }

        self.windows.clear();
        self.frames.clear();
        self.pending_deletion.clear();
        self.dock_widgets = layout
            .dock_widgets
            .iter()
            .map(|d| DockWidget {
                name: d.name.clone(),
                frame: None,
            })
            .collect();

        for name in &layout.main_windows {
            let id = WindowId(self.alloc_id());
            self.windows.insert(
                id,
                Window {
                    main_name: Some(name.clone()),
                    frames: Vec::new(),
                },
            );
        }
        for descriptor in layout.dock_widgets.iter().filter(|d| d.visible) {
            self.float(&descriptor.name);
        }

        tracing::debug!(
            main_windows = layout.main_windows.len(),
            dock_widgets = layout.dock_widgets.len(),
            "host reset"
        );
        Ok(())
    }

    async fn process_events(&mut self) {
        if !self.stall_teardown {
            for window in std::mem::take(&mut self.pending_deletion) {
                self.windows.remove(&window);
                tracing::trace!(%window, "window deleted");
            }
        }
        tokio::task::yield_now().await;
    }

    fn check_sanity(&self) -> Result<(), HostError> {
        let fail = |msg: String| Err(HostError::Sanity(msg));

        for dw in &self.dock_widgets {
            let Some(frame_id) = dw.frame else {
                continue;
            };
            let Some(frame) = self.frames.get(&frame_id) else {
                return fail(format!("{} points at a missing frame", dw.name));
            };
            if frame.members.iter().filter(|m| **m == dw.name).count() != 1 {
                return fail(format!("{} is not listed once in its frame", dw.name));
            }
        }

        for (id, frame) in &self.frames {
            if frame.members.is_empty() {
                return fail(format!("frame {} is empty", id.0));
            }
            for member in &frame.members {
                if self.find(member).and_then(|dw| dw.frame) != Some(*id) {
                    return fail(format!("frame {} lists {member} which lives elsewhere", id.0));
                }
            }
            let Some(window) = self.windows.get(&frame.window) else {
                return fail(format!("frame {} has no window", id.0));
            };
            if !window.frames.contains(id) {
                return fail(format!("{} does not list frame {}", frame.window, id.0));
            }
            if self.pending_deletion.contains(&frame.window) {
                return fail(format!("frame {} lives in a window being deleted", id.0));
            }
        }

        for (id, window) in &self.windows {
            let pending = self.pending_deletion.contains(id);
            if window.main_name.is_none() && window.frames.is_empty() && !pending {
                return fail(format!("empty floating {id} is not scheduled for deletion"));
            }
            if window.main_name.is_some() && pending {
                return fail(format!("main {id} is scheduled for deletion"));
            }
        }

        Ok(())
    }
}

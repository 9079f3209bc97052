// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The platform object: window registry with deferred destruction, modal
//! child bookkeeping, and theme/scale broadcast.

use hashbrown::HashMap;
use kurbo::Size;

use crate::backend::{WindowBackend, WindowFlags, WindowState};
use crate::window::Window;

/// Identifier for a window in the platform registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct WindowId(u64);

impl WindowId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Registry of live windows with deferred destruction.
///
/// [`WindowMap::remove`] only queues the window; it is destroyed (dropping
/// it, which runs backend cleanup) by [`WindowMap::purge`], called by the
/// platform once the current event-loop iteration finishes. This keeps a
/// window alive while an event is still being processed for it.
#[derive(Debug, Default)]
pub struct WindowMap {
    map: HashMap<WindowId, Window>,
    pending: Vec<Window>,
}

impl WindowMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window.
    pub fn insert(&mut self, window: Window) {
        self.map.insert(window.id(), window);
    }

    /// Look up a window.
    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.map.get(&id)
    }

    /// Look up a window mutably.
    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.map.get_mut(&id)
    }

    /// Unregister a window, deferring its destruction to the next
    /// [`WindowMap::purge`]. Returns whether the id was present.
    pub fn remove(&mut self, id: WindowId) -> bool {
        match self.map.remove(&id) {
            Some(window) => {
                self.pending.push(window);
                true
            }
            None => false,
        }
    }

    /// Destroy all windows removed since the last purge.
    pub fn purge(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(count = self.pending.len(), "destroying removed windows");
            self.pending.clear();
        }
    }

    /// Ids of all registered windows.
    pub fn ids(&self) -> Vec<WindowId> {
        self.map.keys().copied().collect()
    }

    /// Number of registered windows (pending destructions excluded).
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no window is registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Owns every window and the cross-window concerns: ids, modal counters, and
/// theme/scale broadcast. Hosts create one per process and thread it through
/// explicitly; there is no global instance.
#[derive(Debug)]
pub struct Platform {
    windows: WindowMap,
    next_window_id: u64,
    scale_factor: f64,
}

impl Default for Platform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform {
    /// Create a platform with no windows.
    pub fn new() -> Self {
        Self {
            windows: WindowMap::new(),
            next_window_id: 1,
            scale_factor: 1.0,
        }
    }

    /// Create and register a window. The window is not shown yet.
    pub fn create_window(
        &mut self,
        backend: Box<dyn WindowBackend>,
        flags: WindowFlags,
        parent: Option<WindowId>,
        size: Size,
    ) -> WindowId {
        let id = WindowId::new(self.next_window_id);
        self.next_window_id += 1;
        let window = Window::new(id, parent, flags, backend, size);
        self.windows.insert(window);
        id
    }

    /// Look up a window.
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    /// Look up a window mutably.
    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    /// Ids of all live windows.
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.ids()
    }

    /// Current scale factor.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Show a window. A modal window blocks input on its parent until it is
    /// closed.
    pub fn show_window(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        window.backend.show();
        window.handle_window_state_change(WindowState::Normal, None);
        let modal_parent = window
            .flags
            .contains(WindowFlags::MODAL)
            .then_some(window.parent)
            .flatten();
        if let Some(pid) = modal_parent
            && let Some(parent) = self.windows.get_mut(pid)
        {
            parent.modal_above += 1;
        }
    }

    /// Close a window: backend close, modal counter release on the parent,
    /// and deferred removal from the registry.
    pub fn close_window(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        window.state = WindowState::Closed;
        window.backend.close();
        let modal_parent = window
            .flags
            .contains(WindowFlags::MODAL)
            .then_some(window.parent)
            .flatten();
        if let Some(pid) = modal_parent
            && let Some(parent) = self.windows.get_mut(pid)
        {
            parent.modal_above = parent.modal_above.saturating_sub(1);
        }
        self.windows.remove(id);
    }

    /// Destroy windows closed during the last event-loop iteration. Called
    /// by the host once per pump iteration, after all events are handled.
    pub fn purge_closed_windows(&mut self) {
        self.windows.purge();
    }

    /// Apply a new scale factor and relayout every window.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor == self.scale_factor {
            return;
        }
        self.scale_factor = scale_factor;
        self.broadcast_appearance_change();
    }

    /// The system theme changed: restyle and relayout every window.
    pub fn on_theme_changed(&mut self) {
        self.broadcast_appearance_change();
    }

    fn broadcast_appearance_change(&mut self) {
        for id in self.windows.ids() {
            if let Some(window) = self.windows.get_mut(id) {
                window.request_style_recalculation();
                window.request_layout();
                window.update(true);
            }
        }
    }
}

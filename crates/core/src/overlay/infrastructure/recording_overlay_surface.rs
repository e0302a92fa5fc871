use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::overlay::domain::overlay_surface::{OverlaySurface, ShapeHandle, ShapeSpec};

#[derive(Default)]
struct SurfaceLog {
    next_handle: u64,
    created: usize,
    updated: usize,
    visibility_changes: usize,
    destroyed: usize,
    live: BTreeMap<u64, (ShapeSpec, bool)>,
}

/// Headless surface that keeps the current scene and counts every call.
///
/// Clones share the same log, so one clone can be handed to the renderer
/// while another is kept for inspection.
#[derive(Clone, Default)]
pub struct RecordingOverlaySurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingOverlaySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, SurfaceLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn created(&self) -> usize {
        self.log().created
    }

    pub fn updated(&self) -> usize {
        self.log().updated
    }

    pub fn visibility_changes(&self) -> usize {
        self.log().visibility_changes
    }

    pub fn destroyed(&self) -> usize {
        self.log().destroyed
    }

    pub fn live_count(&self) -> usize {
        self.log().live.len()
    }

    pub fn visible_count(&self) -> usize {
        self.log().live.values().filter(|(_, visible)| *visible).count()
    }

    /// Shapes currently shown, in creation order.
    pub fn visible_shapes(&self) -> Vec<ShapeSpec> {
        self.log()
            .live
            .values()
            .filter(|(_, visible)| *visible)
            .map(|(spec, _)| spec.clone())
            .collect()
    }
}

impl OverlaySurface for RecordingOverlaySurface {
    fn create(&mut self, spec: &ShapeSpec) -> ShapeHandle {
        let mut log = self.log();
        let handle = log.next_handle;
        log.next_handle += 1;
        log.created += 1;
        log.live.insert(handle, (spec.clone(), true));
        ShapeHandle(handle)
    }

    fn update(&mut self, handle: ShapeHandle, spec: &ShapeSpec) {
        let mut log = self.log();
        log.updated += 1;
        match log.live.get_mut(&handle.0) {
            Some(entry) => entry.0 = spec.clone(),
            None => log::warn!("Update of unknown overlay shape {}", handle.0),
        }
    }

    fn set_visible(&mut self, handle: ShapeHandle, visible: bool) {
        let mut log = self.log();
        log.visibility_changes += 1;
        if let Some(entry) = log.live.get_mut(&handle.0) {
            entry.1 = visible;
        }
    }

    fn destroy(&mut self, handle: ShapeHandle) {
        let mut log = self.log();
        if log.live.remove(&handle.0).is_some() {
            log.destroyed += 1;
        }
    }
}

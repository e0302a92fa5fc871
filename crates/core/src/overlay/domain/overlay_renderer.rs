use std::collections::HashMap;

use crate::overlay::domain::overlay_surface::{OverlayColor, OverlaySurface, ShapeHandle, ShapeSpec};
use crate::shared::rect::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayCategory {
    /// The single face/spoof box.
    Face,
    /// One box per detected object.
    Objects,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeId {
    pub category: OverlayCategory,
    pub key: u32,
}

impl ShapeId {
    pub const FACE: ShapeId = ShapeId {
        category: OverlayCategory::Face,
        key: 0,
    };

    pub fn object(index: usize) -> Self {
        Self {
            category: OverlayCategory::Objects,
            key: index as u32,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedShape {
    pub handle: ShapeHandle,
    pub spec: ShapeSpec,
    pub visible: bool,
}

/// Owns every overlay shape handle and keeps them alive across frames.
///
/// A shape is created once per id and afterwards edited in place; it is
/// destroyed only when its id drops out of use.
pub struct OverlayRenderer {
    surface: Box<dyn OverlaySurface>,
    shapes: HashMap<ShapeId, RenderedShape>,
}

impl OverlayRenderer {
    pub fn new(surface: Box<dyn OverlaySurface>) -> Self {
        Self {
            surface,
            shapes: HashMap::new(),
        }
    }

    pub fn update_or_create(
        &mut self,
        id: ShapeId,
        rect: Rect,
        color: OverlayColor,
        label: Option<String>,
    ) {
        let spec = ShapeSpec { rect, color, label };
        match self.shapes.get_mut(&id) {
            Some(shape) => {
                if shape.spec != spec {
                    self.surface.update(shape.handle, &spec);
                    shape.spec = spec;
                }
                if !shape.visible {
                    self.surface.set_visible(shape.handle, true);
                    shape.visible = true;
                }
            }
            None => {
                let handle = self.surface.create(&spec);
                self.shapes.insert(
                    id,
                    RenderedShape {
                        handle,
                        spec,
                        visible: true,
                    },
                );
            }
        }
    }

    /// Keeps the handle for reuse.
    pub fn hide(&mut self, id: ShapeId) {
        if let Some(shape) = self.shapes.get_mut(&id) {
            if shape.visible {
                self.surface.set_visible(shape.handle, false);
                shape.visible = false;
            }
        }
    }

    pub fn remove(&mut self, id: ShapeId) {
        if let Some(shape) = self.shapes.remove(&id) {
            self.surface.destroy(shape.handle);
        }
    }

    pub fn remove_all(&mut self, category: OverlayCategory) {
        let ids: Vec<ShapeId> = self
            .shapes
            .keys()
            .filter(|id| id.category == category)
            .copied()
            .collect();
        for id in ids {
            self.remove(id);
        }
    }

    /// Makes `category` show exactly `specs`, reusing existing handles by
    /// position and destroying any surplus.
    pub fn sync_category(&mut self, category: OverlayCategory, specs: Vec<ShapeSpec>) {
        let count = specs.len();
        for (key, spec) in specs.into_iter().enumerate() {
            let id = ShapeId {
                category,
                key: key as u32,
            };
            self.update_or_create(id, spec.rect, spec.color, spec.label);
        }
        let surplus: Vec<ShapeId> = self
            .shapes
            .keys()
            .filter(|id| id.category == category && id.key as usize >= count)
            .copied()
            .collect();
        for id in surplus {
            self.remove(id);
        }
    }

    pub fn shape(&self, id: ShapeId) -> Option<&RenderedShape> {
        self.shapes.get(&id)
    }

    pub fn is_visible(&self, id: ShapeId) -> bool {
        self.shapes.get(&id).is_some_and(|s| s.visible)
    }

    pub fn count(&self, category: OverlayCategory) -> usize {
        self.shapes.keys().filter(|id| id.category == category).count()
    }
}

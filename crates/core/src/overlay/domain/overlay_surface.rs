use crate::shared::rect::Rect;

/// Opaque reference to a shape living on a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayColor {
    Green,
    Red,
    Yellow,
    White,
}

/// Geometry and content of one annotation, in surface coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeSpec {
    pub rect: Rect,
    pub color: OverlayColor,
    pub label: Option<String>,
}

impl ShapeSpec {
    pub fn new(rect: Rect, color: OverlayColor) -> Self {
        Self {
            rect,
            color,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Drawing layer the overlay renderer writes to.
///
/// Creating and destroying shapes is the expensive path; `update` and
/// `set_visible` are expected to be cheap in-place edits.
pub trait OverlaySurface: Send {
    fn create(&mut self, spec: &ShapeSpec) -> ShapeHandle;

    fn update(&mut self, handle: ShapeHandle, spec: &ShapeSpec);

    fn set_visible(&mut self, handle: ShapeHandle, visible: bool);

    fn destroy(&mut self, handle: ShapeHandle);
}

use crate::shared::rect::{Rect, Size};

/// Maps a rect in sensor pixels onto a rendering surface.
///
/// X and Y scale independently. When `mirrored`, the source's left edge
/// lands on the surface's right side, so the X origin is
/// `(1 - left / source.width) * surface.width - scaled_width`.
///
/// Returns `None` when either size is empty.
pub fn transform(rect: &Rect, source: Size, surface: Size, mirrored: bool) -> Option<Rect> {
    if source.is_empty() || surface.is_empty() {
        return None;
    }
    let scale_x = surface.width / source.width;
    let scale_y = surface.height / source.height;
    let width = rect.width * scale_x;
    let height = rect.height * scale_y;
    let x = if mirrored {
        (1.0 - rect.left() / source.width) * surface.width - width
    } else {
        rect.left() * scale_x
    };
    Some(Rect::new(x, rect.top() * scale_y, width, height))
}

/// A [`transform`] with its geometry fixed, applied to faces and objects alike.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateTransformer {
    pub source: Size,
    pub surface: Size,
    pub mirrored: bool,
}

impl CoordinateTransformer {
    pub fn new(source: Size, surface: Size, mirrored: bool) -> Self {
        Self {
            source,
            surface,
            mirrored,
        }
    }

    pub fn apply(&self, rect: &Rect) -> Option<Rect> {
        transform(rect, self.source, self.surface, self.mirrored)
    }
}

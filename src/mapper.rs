//! Pointer-to-image coordinate mapping.

use egui::{Pos2, Rect};

use crate::geometry::Point;

/// The on-screen placement of the canvas together with the resolution of its
/// backing pixel buffer (the natural size of the loaded image).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MountedCanvas {
    pub rect: Rect,
    pub pixel_size: [usize; 2],
}

impl MountedCanvas {
    pub fn new(rect: Rect, pixel_size: [usize; 2]) -> Self {
        Self { rect, pixel_size }
    }

    /// Map a screen position to image-pixel coordinates, correcting for the
    /// displayed size differing from the backing buffer size.
    ///
    /// Returns `None` when either size is degenerate.
    pub fn image_point(&self, pointer: Pos2) -> Option<Point> {
        let [width, height] = self.pixel_size;
        if width == 0 || height == 0 || self.rect.width() <= 0.0 || self.rect.height() <= 0.0 {
            return None;
        }
        let scale_x = width as f32 / self.rect.width();
        let scale_y = height as f32 / self.rect.height();
        Some(Point::new(
            (pointer.x - self.rect.left()) * scale_x,
            (pointer.y - self.rect.top()) * scale_y,
        ))
    }

    /// Inverse of [`Self::image_point`]: where an image pixel is shown.
    pub fn screen_pos(&self, point: Point) -> Pos2 {
        Pos2::new(
            self.rect.left() + point.x * self.display_scale_x(),
            self.rect.top() + point.y * self.display_scale_y(),
        )
    }

    /// Screen points per image pixel, horizontally.
    pub fn display_scale_x(&self) -> f32 {
        self.rect.width() / self.pixel_size[0].max(1) as f32
    }

    pub fn display_scale_y(&self) -> f32 {
        self.rect.height() / self.pixel_size[1].max(1) as f32
    }
}

/// Map a pointer position onto the canvas, or `None` if the canvas is not
/// mounted yet.
pub fn map_pointer(canvas: Option<&MountedCanvas>, pointer: Pos2) -> Option<Point> {
    canvas?.image_point(pointer)
}

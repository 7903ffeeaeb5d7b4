use crate::colors::Rgb;
use image::RgbaImage;
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

/// An inset frame drawn as four separate filled bars.
///
/// Each edge is its own rectangle so the corners are plain overlaps of
/// solid color, never a stroked join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatBorder {
    pub inset: u32,
    pub width: u32,
}

impl MatBorder {
    pub const FULL_SIZE: MatBorder = MatBorder { inset: 18, width: 4 };
    pub const THUMBNAIL: MatBorder = MatBorder { inset: 3, width: 1 };

    /// Top, bottom, left, right as `(x, y, w, h)`.
    pub fn bars(&self, width: u32, height: u32) -> [(u32, u32, u32, u32); 4] {
        let inner_w = width.saturating_sub(self.inset * 2);
        let inner_h = height.saturating_sub(self.inset * 2);
        let right = width.saturating_sub(self.inset + self.width);
        let bottom = height.saturating_sub(self.inset + self.width);

        [
            (self.inset, self.inset, inner_w, self.width),
            (self.inset, bottom, inner_w, self.width),
            (self.inset, self.inset, self.width, inner_h),
            (right, self.inset, self.width, inner_h),
        ]
    }

    pub fn apply(&self, img: &mut RgbaImage, color: Rgb) {
        let (width, height) = img.dimensions();
        for (x, y, w, h) in self.bars(width, height) {
            if w == 0 || h == 0 {
                continue;
            }
            draw_filled_rect_mut(img, Rect::at(x as i32, y as i32).of_size(w, h), color.to_rgba());
        }
    }
}

//! Centered crop to a target aspect ratio.

/// Region of the source frame to keep, in source pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// Compute the largest centered region of a `width` x `height` frame
    /// whose aspect ratio equals `target_ratio`.
    ///
    /// Wider sources lose equal strips left and right, taller sources lose
    /// equal strips top and bottom. Nothing is ever letterboxed.
    pub fn centered(width: u32, height: u32, target_ratio: f64) -> Self {
        let width = f64::from(width);
        let height = f64::from(height);
        let source_ratio = width / height;

        if source_ratio > target_ratio {
            let crop_width = height * target_ratio;
            Self {
                x: (width - crop_width) / 2.0,
                y: 0.0,
                width: crop_width,
                height,
            }
        } else {
            let crop_height = width / target_ratio;
            Self {
                x: 0.0,
                y: (height - crop_height) / 2.0,
                width,
                height: crop_height,
            }
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Snap to whole pixels as `(x, y, width, height)`, never exceeding the
    /// source bounds and never collapsing to zero.
    pub fn to_pixels(&self, source_width: u32, source_height: u32) -> (u32, u32, u32, u32) {
        let width = (self.width.round() as u32).clamp(1, source_width.max(1));
        let height = (self.height.round() as u32).clamp(1, source_height.max(1));
        let x = (self.x.round() as u32).min(source_width.saturating_sub(width));
        let y = (self.y.round() as u32).min(source_height.saturating_sub(height));
        (x, y, width, height)
    }
}

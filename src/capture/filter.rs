//! Brightness filter shared by the live preview and captured output.

use image::RgbaImage;

use crate::config::{BRIGHTNESS_DEFAULT, BRIGHTNESS_MAX, BRIGHTNESS_MIN, BRIGHTNESS_STEP};

/// Brightness multiplier in percent (100 = unchanged).
///
/// Both the preview CSS and the pixel filter are derived from this one value,
/// so what the guest sees is what gets printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brightness(u32);

impl Brightness {
    /// Clamp into the slider range
    pub fn new(percent: u32) -> Self {
        Self(percent.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX))
    }

    /// Snap a raw slider position to the nearest step
    pub fn snapped(value: f64) -> Self {
        let step = f64::from(BRIGHTNESS_STEP);
        let snapped = ((value / step).round() * step).max(0.0);
        Self::new(snapped as u32)
    }

    pub fn percent(self) -> u32 {
        self.0
    }

    pub fn factor(self) -> f32 {
        self.0 as f32 / 100.0
    }

    /// CSS filter value for the preview widget
    pub fn css_filter(self) -> String {
        format!("brightness({}%)", self.0)
    }

    /// Multiply the colour channels in place, leaving alpha alone
    pub fn apply(self, image: &mut RgbaImage) {
        if self.0 == 100 {
            return;
        }
        let factor = self.factor();
        for pixel in image.pixels_mut() {
            for channel in pixel.0.iter_mut().take(3) {
                *channel = (f32::from(*channel) * factor).round().min(255.0) as u8;
            }
        }
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self(BRIGHTNESS_DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_snaps_to_step() {
        assert_eq!(Brightness::snapped(102.4).percent(), 100);
        assert_eq!(Brightness::snapped(103.0).percent(), 105);
        assert_eq!(Brightness::snapped(-20.0).percent(), 50);
        assert_eq!(Brightness::snapped(400.0).percent(), 150);
    }

    #[test]
    fn test_clamps_to_slider_range() {
        assert_eq!(Brightness::new(10).percent(), 50);
        assert_eq!(Brightness::new(500).percent(), 150);
        assert_eq!(Brightness::new(120).percent(), 120);
    }

    #[test]
    fn test_css_and_pixels_use_same_value() {
        for percent in (50..=150).step_by(5) {
            let brightness = Brightness::new(percent);
            assert_eq!(brightness.css_filter(), format!("brightness({}%)", percent));

            let mut image = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
            brightness.apply(&mut image);
            let expected = (100.0 * percent as f32 / 100.0).round().min(255.0) as u8;
            assert_eq!(image.get_pixel(0, 0).0, [expected, expected, expected, 255]);
        }
    }

    #[test]
    fn test_apply_saturates_and_keeps_alpha() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([200, 10, 0, 128]));
        Brightness::new(150).apply(&mut image);
        assert_eq!(image.get_pixel(1, 0).0, [255, 15, 0, 128]);
    }

    #[test]
    fn test_default_is_identity() {
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([33, 66, 99, 255]));
        Brightness::default().apply(&mut image);
        assert_eq!(image.get_pixel(0, 0).0, [33, 66, 99, 255]);
    }
}

//! QR code rendering into GDK textures.

use gtk4 as gtk;
use gtk4::prelude::*;

use fotobox::share::{self, ShareError};

/// Render `data` as a QR code texture of roughly `size` pixels
pub fn qr_texture(data: &str, size: u32) -> Result<gtk::gdk::Texture, ShareError> {
    let gray = share::render_qr(data, size)?;
    let rgb = image::DynamicImage::ImageLuma8(gray).to_rgb8();
    let (width, height) = rgb.dimensions();

    let bytes = glib::Bytes::from_owned(rgb.into_raw());
    let texture = gtk::gdk::MemoryTexture::new(
        width as i32,
        height as i32,
        gtk::gdk::MemoryFormat::R8g8b8,
        &bytes,
        width as usize * 3,
    );

    Ok(texture.upcast())
}

/// Decode a JPEG into a texture for display
pub fn jpeg_texture(jpeg: &[u8]) -> Result<gtk::gdk::Texture, glib::Error> {
    gtk::gdk::Texture::from_bytes(&glib::Bytes::from(jpeg))
}

//! Printing through the platform print dialog.

use gtk4 as gtk;
use gtk4::cairo;
use gtk4::prelude::*;

use fotobox::capture::{CapturedImage, CropRect};
use fotobox::config::{PRINT_HEIGHT_MM, PRINT_WIDTH_MM};
use fotobox::print::{PrintError, PRINT_TITLE};

/// 6x4 inch borderless page
fn page_setup() -> gtk::PageSetup {
    let paper = gtk::PaperSize::new_custom(
        "fotobox-6x4",
        "10x15 cm photo",
        PRINT_WIDTH_MM,
        PRINT_HEIGHT_MM,
        gtk::Unit::Mm,
    );

    let setup = gtk::PageSetup::new();
    setup.set_paper_size(&paper);
    // The custom paper is already wider than tall
    setup.set_orientation(gtk::PageOrientation::Portrait);
    setup.set_top_margin(0.0, gtk::Unit::Mm);
    setup.set_bottom_margin(0.0, gtk::Unit::Mm);
    setup.set_left_margin(0.0, gtk::Unit::Mm);
    setup.set_right_margin(0.0, gtk::Unit::Mm);
    setup
}

/// Decode the photo into a cairo surface
fn photo_surface(image: &CapturedImage) -> Result<cairo::ImageSurface, PrintError> {
    let jpeg = image.jpeg_bytes()?;
    let rgb = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg)
        .map_err(|e| PrintError::Load(e.to_string()))?
        .to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut surface = cairo::ImageSurface::create(cairo::Format::Rgb24, width as i32, height as i32)
        .map_err(|e| PrintError::Load(e.to_string()))?;
    let stride = surface.stride() as usize;
    {
        let mut data = surface
            .data()
            .map_err(|e| PrintError::Load(e.to_string()))?;
        for (y, row) in rgb.rows().enumerate() {
            for (x, pixel) in row.enumerate() {
                let [r, g, b] = pixel.0;
                let value = u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b);
                let offset = y * stride + x * 4;
                data[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
            }
        }
    }
    surface.mark_dirty();

    Ok(surface)
}

/// Show the print dialog for `image` and wait for it to finish.
///
/// The photo is fully decoded before the dialog opens, so the printer never
/// sees a blank page.
pub fn run_print_dialog(
    parent: &impl IsA<gtk::Window>,
    image: &CapturedImage,
) -> Result<(), PrintError> {
    let surface = photo_surface(image)?;

    let operation = gtk::PrintOperation::new();
    operation.set_job_name(PRINT_TITLE);
    operation.set_n_pages(1);
    operation.set_use_full_page(true);
    operation.set_unit(gtk::Unit::Points);
    operation.set_default_page_setup(Some(&page_setup()));

    operation.connect_draw_page(move |_, context, _page| {
        let cr = context.cairo_context();
        let (page_width, page_height) = (context.width(), context.height());

        // Cover the page, cropping the centre like the preview does
        let crop = CropRect::centered(
            surface.width() as u32,
            surface.height() as u32,
            page_width / page_height,
        );
        let scale = page_width / crop.width;

        cr.scale(scale, scale);
        let painted = cr
            .set_source_surface(&surface, -crop.x, -crop.y)
            .and_then(|_| cr.paint());
        if let Err(e) = painted {
            log::error!("Failed to draw print page: {}", e);
        }
    });

    let result = operation
        .run(gtk::PrintOperationAction::PrintDialog, Some(parent))
        .map_err(|e| PrintError::Operation(e.to_string()))?;
    log::info!("Print dialog finished: {:?}", result);
    Ok(())
}

//! Print jobs for the 6x4 inch photo page.
//!
//! The page geometry is shared by the GTK print dialog and the standalone
//! HTML document written in spool mode.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::capture::{CaptureError, CapturedImage};
use crate::config::{PRINT_HEIGHT_MM, PRINT_WIDTH_MM};

/// Title of the print document / job
pub const PRINT_TITLE: &str = "Fotobox Druck";

#[derive(Error, Debug)]
pub enum PrintError {
    #[error("Failed to decode photo: {0}")]
    Decode(#[from] CaptureError),
    #[error("Failed to load photo into printer surface: {0}")]
    Load(String),
    #[error("Print operation failed: {0}")]
    Operation(String),
    #[error("Failed to write print document: {0}")]
    Io(#[from] std::io::Error),
}

/// Standalone HTML document printing `image` full-bleed on a 6x4 page
pub fn print_document(image: &CapturedImage) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>{title}</title>
    <style>
      @page {{
        size: {w}mm {h}mm;
        margin: 0;
      }}
      body {{
        margin: 0;
        padding: 0;
        width: {w}mm;
        height: {h}mm;
        display: flex;
        justify-content: center;
        align-items: center;
        overflow: hidden;
      }}
      img {{
        width: {w}mm;
        height: {h}mm;
        object-fit: cover;
        object-position: center;
      }}
      @media print {{
        body {{
          -webkit-print-color-adjust: exact;
          print-color-adjust: exact;
        }}
      }}
    </style>
  </head>
  <body>
    <img src="{src}" alt="Foto" />
  </body>
</html>
"#,
        title = PRINT_TITLE,
        w = PRINT_WIDTH_MM,
        h = PRINT_HEIGHT_MM,
        src = image.data_uri(),
    )
}

/// File name for a spooled print document
pub fn spool_filename(now: DateTime<Utc>) -> String {
    format!("print-{}.html", now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

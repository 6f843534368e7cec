//! Final image encoding: surface to PNG to self-contained data URL.

use std::io::Cursor;

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    error::{AdmillError, AdmillResult},
    raster::{Surface, unpremultiply_rgba8_in_place},
};

/// Encodes the surface as a PNG, converting back to straight alpha first.
pub fn surface_to_png(surface: &Surface) -> AdmillResult<Vec<u8>> {
    let mut rgba = surface.data().to_vec();
    unpremultiply_rgba8_in_place(&mut rgba);
    let img = image::RgbaImage::from_raw(surface.width(), surface.height(), rgba)
        .ok_or_else(|| AdmillError::render("surface buffer does not match its dimensions"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode surface as png")?;
    Ok(buf)
}

/// `data:image/png;base64,...` URL carrying the encoded image inline.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Unique id for one generated record.
pub fn fresh_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

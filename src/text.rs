//! Text painting: registered font faces with canvas-style box alignment
//! and coverage-blended glyph stamping.

use std::collections::HashMap;

use fontdue::{Font, FontSettings};

use crate::{
    error::{AdmillError, AdmillResult},
    model::{HorizontalAlign, Layer, VerticalAlign, solid_paint},
    raster::Surface,
};

pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_FONT_WEIGHT: u16 = 400;

/// Font faces keyed by family and weight, with one fallback face used
/// whenever a layer's request cannot be matched. An empty library makes
/// every text layer a no-op.
#[derive(Default)]
pub struct FontLibrary {
    fonts: Vec<Font>,
    by_family: HashMap<(String, u16), usize>,
    fallback: Option<usize>,
}

impl FontLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Library with a single fallback face.
    pub fn with_default(bytes: &[u8]) -> AdmillResult<Self> {
        let mut library = Self::default();
        library.push_font(bytes)?;
        Ok(library)
    }

    /// Registers a face for a family/weight pair. The first face loaded
    /// into the library doubles as the fallback.
    pub fn register(&mut self, family: &str, weight: u16, bytes: &[u8]) -> AdmillResult<()> {
        let idx = self.push_font(bytes)?;
        self.by_family.insert((family.to_lowercase(), weight), idx);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    fn push_font(&mut self, bytes: &[u8]) -> AdmillResult<usize> {
        let font =
            Font::from_bytes(bytes, FontSettings::default()).map_err(AdmillError::render)?;
        self.fonts.push(font);
        let idx = self.fonts.len() - 1;
        if self.fallback.is_none() {
            self.fallback = Some(idx);
        }
        Ok(idx)
    }

    /// Exact family+weight, else the nearest weight within the family,
    /// else the fallback face.
    fn select(&self, family: Option<&str>, weight: u16) -> Option<&Font> {
        if let Some(family) = family {
            let family = family.to_lowercase();
            if let Some(&idx) = self.by_family.get(&(family.clone(), weight)) {
                return Some(&self.fonts[idx]);
            }
            let nearest = self
                .by_family
                .iter()
                .filter(|((name, _), _)| *name == family)
                .min_by_key(|((_, w), _)| w.abs_diff(weight));
            if let Some((_, &idx)) = nearest {
                return Some(&self.fonts[idx]);
            }
        }
        self.fallback.map(|idx| &self.fonts[idx])
    }
}

struct MeasuredText {
    width: f64,
    descent: f64,
}

fn measure(font: &Font, text: &str, px: f32) -> MeasuredText {
    let mut width = 0.0f64;
    let mut descent = 0i32;
    for ch in text.chars() {
        let metrics = font.metrics(ch, px);
        descent = descent.max(-metrics.ymin);
        width += f64::from(metrics.advance_width);
    }
    MeasuredText {
        width,
        descent: f64::from(descent),
    }
}

/// Pen position and alphabetic baseline for one line inside a box.
/// Vertical centering sits the baseline a third of the font size below
/// the box midline; bottom alignment backs off by the measured descent,
/// or two pixels when the text has none.
fn aligned_origin(
    bounds: kurbo::Rect,
    h_align: HorizontalAlign,
    v_align: VerticalAlign,
    font_size: f64,
    text_width: f64,
    descent: f64,
) -> (f64, f64) {
    let pen_x = match h_align {
        HorizontalAlign::Left => bounds.x0,
        HorizontalAlign::Center => bounds.x0 + (bounds.width() - text_width) / 2.0,
        HorizontalAlign::Right => bounds.x1 - text_width,
    };
    let baseline = match v_align {
        VerticalAlign::Top => bounds.y0 + font_size,
        VerticalAlign::Center => bounds.y0 + bounds.height() / 2.0 + font_size / 3.0,
        VerticalAlign::Bottom => {
            let descent = if descent > 0.0 { descent } else { 2.0 };
            bounds.y1 - descent
        }
    };
    (pen_x, baseline)
}

/// Paints a text layer. Uses the layer's first visible solid fill as the
/// color (black when it has none); text is not clipped to the layer box.
pub fn draw_text(surface: &mut Surface, fonts: &FontLibrary, layer: &Layer) {
    let text = layer.characters.as_deref().unwrap_or("");
    if text.is_empty() {
        return;
    }
    let font_size = layer.font_size.unwrap_or(DEFAULT_FONT_SIZE);
    if font_size <= 0.0 {
        return;
    }
    let weight = layer.font_weight.unwrap_or(DEFAULT_FONT_WEIGHT);
    let Some(font) = fonts.select(layer.font_family.as_deref(), weight) else {
        tracing::debug!(layer = %layer.name, "no font registered, skipping text layer");
        return;
    };
    let color = match solid_paint(&layer.fills) {
        Some((color, opacity)) => color.to_rgba8_premul(opacity),
        None => [0, 0, 0, 255],
    };

    let px = font_size as f32;
    let measured = measure(font, text, px);
    let (pen_x, baseline) = aligned_origin(
        layer.rect(),
        layer.text_align_horizontal,
        layer.text_align_vertical,
        font_size,
        measured.width,
        measured.descent,
    );

    let mut cursor = pen_x;
    for ch in text.chars() {
        let (glyph, bitmap) = font.rasterize(ch, px);
        let origin_x = (cursor + f64::from(glyph.xmin)).round() as i64;
        let origin_y = (baseline - f64::from(glyph.height as i32 + glyph.ymin)).round() as i64;
        for gy in 0..glyph.height {
            for gx in 0..glyph.width {
                let coverage = bitmap[gy * glyph.width + gx];
                if coverage == 0 {
                    continue;
                }
                let x = origin_x + gx as i64;
                let y = origin_y + gy as i64;
                if x < 0
                    || y < 0
                    || x >= i64::from(surface.width())
                    || y >= i64::from(surface.height())
                {
                    continue;
                }
                surface.blend_pixel(x as u32, y as u32, color, f32::from(coverage) / 255.0);
            }
        }
        cursor += f64::from(glyph.advance_width);
    }
}

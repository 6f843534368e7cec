//! CPU compositing surface: premultiplied RGBA8, painter's order.

pub type PremulRgba8 = [u8; 4];

/// Premultiplied source-over blend. `opacity` scales the source on top of
/// its own alpha.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

/// Uniform scale that makes a `src_w x src_h` bitmap fully cover a
/// `box_w x box_h` box, cropping overflow rather than letterboxing.
pub fn cover_scale(box_w: f64, box_h: f64, src_w: f64, src_h: f64) -> f64 {
    f64::max(box_w / src_w, box_h / src_h)
}

/// Converts a premultiplied buffer back to straight alpha, in place.
pub fn unpremultiply_rgba8_in_place(px: &mut [u8]) {
    for chunk in px.chunks_exact_mut(4) {
        let a = u32::from(chunk[3]);
        if a == 0 {
            continue;
        }
        for c in chunk.iter_mut().take(3) {
            let straight = (u32::from(*c) * 255 + a / 2) / a;
            *c = straight.min(255) as u8;
        }
    }
}

/// One render canvas. Starts fully transparent.
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> PremulRgba8 {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    fn bounds(&self) -> kurbo::Rect {
        kurbo::Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    pub(crate) fn blend_pixel(&mut self, x: u32, y: u32, src: PremulRgba8, opacity: f32) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let dst = [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ];
        let out = over(dst, src, opacity);
        self.data[idx..idx + 4].copy_from_slice(&out);
    }

    /// Source-over fill of the rect's pixel-center coverage.
    pub fn fill_rect(&mut self, rect: kurbo::Rect, color: PremulRgba8) {
        let clip = rect.intersect(self.bounds());
        if clip.width() <= 0.0 || clip.height() <= 0.0 {
            return;
        }
        for y in clip.y0.floor().max(0.0) as u32..(clip.y1.ceil() as u32).min(self.height) {
            for x in clip.x0.floor().max(0.0) as u32..(clip.x1.ceil() as u32).min(self.width) {
                let cx = f64::from(x) + 0.5;
                let cy = f64::from(y) + 0.5;
                if cx < clip.x0 || cx >= clip.x1 || cy < clip.y0 || cy >= clip.y1 {
                    continue;
                }
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    /// Cover-draw: scales the source uniformly until it fills `dst`,
    /// centering and cropping the overflow. Nearest-neighbour sampled. An
    /// empty source draws nothing.
    pub fn draw_bitmap_cover(&mut self, src_w: u32, src_h: u32, src: &[u8], dst: kurbo::Rect) {
        if src_w == 0 || src_h == 0 || src.len() < src_w as usize * src_h as usize * 4 {
            return;
        }
        let scale = cover_scale(dst.width(), dst.height(), f64::from(src_w), f64::from(src_h));
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        let draw_w = f64::from(src_w) * scale;
        let draw_h = f64::from(src_h) * scale;
        let origin_x = dst.x0 + (dst.width() - draw_w) / 2.0;
        let origin_y = dst.y0 + (dst.height() - draw_h) / 2.0;

        let clip = dst.intersect(self.bounds());
        if clip.width() <= 0.0 || clip.height() <= 0.0 {
            return;
        }
        for y in clip.y0.floor().max(0.0) as u32..(clip.y1.ceil() as u32).min(self.height) {
            for x in clip.x0.floor().max(0.0) as u32..(clip.x1.ceil() as u32).min(self.width) {
                let cx = f64::from(x) + 0.5;
                let cy = f64::from(y) + 0.5;
                if cx < clip.x0 || cx >= clip.x1 || cy < clip.y0 || cy >= clip.y1 {
                    continue;
                }
                let sx = (((cx - origin_x) / scale).floor() as i64).clamp(0, i64::from(src_w) - 1);
                let sy = (((cy - origin_y) / scale).floor() as i64).clamp(0, i64::from(src_h) - 1);
                let idx = (sy as usize * src_w as usize + sx as usize) * 4;
                let pixel = [src[idx], src[idx + 1], src[idx + 2], src[idx + 3]];
                self.blend_pixel(x, y, pixel, 1.0);
            }
        }
    }
}

use serde::{Deserialize, Serialize};

/// A color record as delivered by the design-source manifest. Channels are
/// either normalized (0..=1) or already in integer range (0..=255); any
/// channel above 1 switches the whole record to integer interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRecord {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "one")]
    pub a: f64,
}

fn one() -> f64 {
    1.0
}

impl ColorRecord {
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Straight-alpha RGBA8. `opacity` multiplies the record's own alpha.
    pub fn to_rgba8(self, opacity: f64) -> [u8; 4] {
        let integer_range = self.r > 1.0 || self.g > 1.0 || self.b > 1.0;
        let channel = |x: f64| -> u8 {
            if integer_range {
                x.clamp(0.0, 255.0).round() as u8
            } else {
                (x.clamp(0.0, 1.0) * 255.0).round() as u8
            }
        };
        let a = (self.a * opacity).clamp(0.0, 1.0);
        [
            channel(self.r),
            channel(self.g),
            channel(self.b),
            (a * 255.0).round() as u8,
        ]
    }

    /// Premultiplied RGBA8, suitable for the raster surface.
    pub fn to_rgba8_premul(self, opacity: f64) -> [u8; 4] {
        let [r, g, b, a] = self.to_rgba8(opacity);
        let premul = |c: u8| -> u8 { ((u16::from(c) * u16::from(a) + 127) / 255) as u8 };
        [premul(r), premul(g), premul(b), a]
    }
}

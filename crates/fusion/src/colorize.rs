//! Depth visualization: dense depth → RGBA

/// Hue steps between the nearest and farthest in-range depth
pub const PALETTE_SIZE: usize = 240;

/// First and last palette hue (degrees)
const HUE_BEGIN: f32 = 0.0;
const HUE_END: f32 = 240.0;

/// Depth at or beyond the max range (and unfilled pixels)
pub const TOO_FAR_RGBA: [u8; 4] = [255, 255, 255, 32];

/// Depth below one palette step, including zero, negative and NaN
pub const TOO_CLOSE_RGBA: [u8; 4] = [255, 0, 255, 1];

/// Alpha of in-range depth pixels
pub const MID_ALPHA: u8 = 128;

/// Where a depth value falls on the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthBand {
    TooClose,
    /// Palette index in `1..PALETTE_SIZE`
    InRange(usize),
    TooFar,
}

/// Depth colorizer with a precomputed hue palette
#[derive(Debug, Clone)]
pub struct DepthColorizer {
    max_depth: f32,
    palette: [[u8; 3]; PALETTE_SIZE],
}

impl DepthColorizer {
    pub fn new(max_depth: f32) -> Self {
        let mut palette = [[0u8; 3]; PALETTE_SIZE];
        for (i, entry) in palette.iter_mut().enumerate() {
            *entry = hsv_to_rgb(palette_hue(i), 1.0, 1.0);
        }
        Self { max_depth, palette }
    }

    pub fn max_depth(&self) -> f32 {
        self.max_depth
    }

    pub fn band(&self, depth: f32) -> DepthBand {
        // `as` saturates: NaN → 0, +inf → i32::MAX
        let i = (depth / self.max_depth * PALETTE_SIZE as f32) as i32;
        if i >= PALETTE_SIZE as i32 {
            DepthBand::TooFar
        } else if i <= 0 {
            DepthBand::TooClose
        } else {
            DepthBand::InRange(i as usize)
        }
    }

    /// Palette hue of an in-range depth, in degrees
    pub fn depth_hue(&self, depth: f32) -> Option<f32> {
        match self.band(depth) {
            DepthBand::InRange(i) => Some(palette_hue(i)),
            _ => None,
        }
    }

    #[inline]
    pub fn rgba(&self, depth: f32) -> [u8; 4] {
        match self.band(depth) {
            DepthBand::TooFar => TOO_FAR_RGBA,
            DepthBand::TooClose => TOO_CLOSE_RGBA,
            DepthBand::InRange(i) => {
                let [r, g, b] = self.palette[i];
                [r, g, b, MID_ALPHA]
            }
        }
    }

    /// Fill `dst` with one RGBA pixel per depth value
    pub fn colorize(&self, depth: &[f32], dst: &mut Vec<u8>) {
        dst.resize(depth.len() * 4, 0);
        for (px, &z) in dst.chunks_exact_mut(4).zip(depth) {
            px.copy_from_slice(&self.rgba(z));
        }
    }
}

#[inline]
fn palette_hue(i: usize) -> f32 {
    HUE_BEGIN + (HUE_END - HUE_BEGIN) * i as f32 / PALETTE_SIZE as f32
}

/// HSV (hue in degrees, s/v in [0, 1]) → RGB
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [u8; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = value * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = value - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

use std::str::FromStr;

use crate::error::{RainbowError, RainbowResult};

/// Output frames-per-second.
///
/// Stored as a validated positive finite float; GIF frame delays and the
/// ffmpeg input rate are both derived from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fps(f64);

impl Fps {
    /// Create a validated FPS value.
    pub fn new(fps: f64) -> RainbowResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(RainbowError::validation(format!(
                "fps must be a positive finite number, got {fps}"
            )));
        }
        Ok(Self(fps))
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        1.0 / self.0
    }
}

/// Requested output dimensions for a generated sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutputSize {
    /// Use the source image dimensions unchanged.
    Source,
    /// Multiply source width/height by a factor, truncating to integers.
    Scale(f64),
    /// Explicit output dimensions in pixels.
    Exact {
        /// Output width in pixels.
        width: u32,
        /// Output height in pixels.
        height: u32,
    },
}

impl OutputSize {
    /// Resolve against a source image's dimensions.
    ///
    /// Scale factors truncate (a 0.5 scale of 5x5 resolves to 2x2). A
    /// resolved dimension of zero is rejected before any frame work starts.
    pub fn resolve(self, src_width: u32, src_height: u32) -> RainbowResult<(u32, u32)> {
        let (w, h) = match self {
            Self::Source => (src_width, src_height),
            Self::Scale(factor) => {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(RainbowError::validation(format!(
                        "output scale factor must be a positive finite number, got {factor}"
                    )));
                }
                (
                    (f64::from(src_width) * factor) as u32,
                    (f64::from(src_height) * factor) as u32,
                )
            }
            Self::Exact { width, height } => (width, height),
        };
        if w == 0 || h == 0 {
            return Err(RainbowError::validation(format!(
                "output size resolves to {w}x{h}; both dimensions must be non-zero"
            )));
        }
        Ok((w, h))
    }
}

impl Default for OutputSize {
    fn default() -> Self {
        Self::Source
    }
}

impl FromStr for OutputSize {
    type Err = RainbowError;

    /// Parse either `WIDTHxHEIGHT` (e.g. `640x480`) or a scale factor
    /// (e.g. `0.5`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((w, h)) = s.split_once(['x', 'X']) {
            let width: u32 = w.trim().parse().map_err(|_| {
                RainbowError::validation(format!("invalid output width \"{w}\""))
            })?;
            let height: u32 = h.trim().parse().map_err(|_| {
                RainbowError::validation(format!("invalid output height \"{h}\""))
            })?;
            return Ok(Self::Exact { width, height });
        }
        let factor: f64 = s.parse().map_err(|_| {
            RainbowError::validation(format!(
                "output size must be WIDTHxHEIGHT or a scale factor, got \"{s}\""
            ))
        })?;
        Ok(Self::Scale(factor))
    }
}

/// One rendered frame: tightly packed row-major 8-bit pixels in B, G, R
/// channel order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBgr {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// BGR8 bytes, `width * height * 3` long.
    pub data: Vec<u8>,
}

impl FrameBgr {
    /// Create a zero-filled (black) frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 3],
        }
    }

    /// Byte offset of pixel `(x, y)`.
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 3
    }

    /// Read pixel `(x, y)` as a `[b, g, r]` triple.
    pub fn bgr_at(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Convert to an RGB image (swapping channel order at the boundary).
    pub fn to_rgb_image(&self) -> image::RgbImage {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(3) {
            out.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        image::RgbImage::from_raw(self.width, self.height, out)
            .expect("bgr frame buffer length matches its dimensions")
    }

    /// Build a frame from an RGB image.
    pub fn from_rgb_image(img: &image::RgbImage) -> Self {
        let mut data = Vec::with_capacity((img.width() as usize) * (img.height() as usize) * 3);
        for px in img.pixels() {
            data.extend_from_slice(&[px.0[2], px.0[1], px.0[0]]);
        }
        Self {
            width: img.width(),
            height: img.height(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_non_positive_and_non_finite() {
        assert!(Fps::new(0.0).is_err());
        assert!(Fps::new(-1.0).is_err());
        assert!(Fps::new(f64::NAN).is_err());
        assert!(Fps::new(f64::INFINITY).is_err());
        assert!((Fps::new(60.0).unwrap().frame_duration_secs() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn output_size_scale_truncates() {
        // 5 * 0.5 = 2.5 truncates to 2, never rounds to 3.
        assert_eq!(OutputSize::Scale(0.5).resolve(5, 5).unwrap(), (2, 2));
        assert_eq!(OutputSize::Scale(0.5).resolve(320, 240).unwrap(), (160, 120));
    }

    #[test]
    fn output_size_zero_dimension_is_an_error() {
        assert!(OutputSize::Scale(0.01).resolve(5, 5).is_err());
        assert!(OutputSize::Exact { width: 0, height: 4 }.resolve(8, 8).is_err());
        assert!(OutputSize::Scale(-1.0).resolve(8, 8).is_err());
    }

    #[test]
    fn output_size_parses_dimensions_and_factors() {
        assert_eq!(
            "640x480".parse::<OutputSize>().unwrap(),
            OutputSize::Exact {
                width: 640,
                height: 480
            }
        );
        assert_eq!("0.5".parse::<OutputSize>().unwrap(), OutputSize::Scale(0.5));
        assert!("640x".parse::<OutputSize>().is_err());
        assert!("huge".parse::<OutputSize>().is_err());
    }

    #[test]
    fn frame_rgb_round_trip_swaps_channels() {
        let mut frame = FrameBgr::new(2, 1);
        frame.data.copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        let rgb = frame.to_rgb_image();
        assert_eq!(rgb.get_pixel(0, 0).0, [3, 2, 1]);
        assert_eq!(FrameBgr::from_rgb_image(&rgb), frame);
    }
}

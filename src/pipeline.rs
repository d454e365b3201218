use std::path::Path;

use crate::core::{Fps, OutputSize};
use crate::encode::{OutputFormat, SinkConfig};
use crate::error::{RainbowError, RainbowResult};
use crate::generate::rainbowify;
use crate::overlay::overlay;
use crate::palette::Palette;

/// Options for a one-shot effect render.
#[derive(Clone, Debug)]
pub struct EffectOpts {
    /// Output dimensions; defaults to the source image size.
    pub output_size: OutputSize,
    /// Output frames per second.
    pub speed: f64,
    /// Output duration in seconds; `frame_count = round(speed * duration)`.
    pub duration: f64,
    /// Color scheme to cycle.
    pub palette: Palette,
    /// Caption stamped across the top of every frame; empty for none.
    pub caption: String,
}

impl Default for EffectOpts {
    fn default() -> Self {
        Self {
            output_size: OutputSize::Source,
            speed: 60.0,
            duration: 10.0,
            palette: Palette::party_parrot(),
            caption: String::new(),
        }
    }
}

/// Number of frames for a speed/duration pair: `round(speed * duration)`,
/// clamped at zero.
pub fn frame_count(speed: f64, duration: f64) -> RainbowResult<u32> {
    if !speed.is_finite() || speed < 0.0 {
        return Err(RainbowError::validation(format!(
            "speed must be a non-negative finite number, got {speed}"
        )));
    }
    if !duration.is_finite() || duration < 0.0 {
        return Err(RainbowError::validation(format!(
            "duration must be a non-negative finite number, got {duration}"
        )));
    }
    let n = (speed * duration).round();
    if n > f64::from(u32::MAX) {
        return Err(RainbowError::validation(format!(
            "speed * duration requests {n} frames; that cannot be materialized"
        )));
    }
    Ok(n as u32)
}

/// Run the whole effect: decode the input image, generate the palette-cycling
/// sequence, overlay the caption, and encode to the container selected by the
/// output extension.
///
/// Fails fast before any frame work if the output extension is unsupported or
/// the input image is missing/unreadable; nothing is written in either case.
/// A zero frame count produces no output file.
#[tracing::instrument(skip(opts), fields(caption = !opts.caption.is_empty()))]
pub fn render_effect(input: &Path, output: &Path, opts: &EffectOpts) -> RainbowResult<()> {
    let format = OutputFormat::from_path(output)?;
    let n = frame_count(opts.speed, opts.duration)?;

    let image = image::open(input)
        .map_err(|e| {
            RainbowError::decode(format!(
                "failed to read input image '{}': {e}",
                input.display()
            ))
        })?
        .to_rgb8();

    let frames = rainbowify(&image, n, opts.output_size, &opts.palette)?;
    let frames = overlay(frames, &opts.caption)?;

    let Some(first) = frames.first() else {
        tracing::warn!("frame count is zero; no output file written");
        return Ok(());
    };
    let cfg = SinkConfig {
        width: first.width,
        height: first.height,
        fps: Fps::new(opts.speed)?,
    };

    let mut sink = format.create_sink(output);
    sink.begin(cfg)?;
    for (idx, frame) in frames.iter().enumerate() {
        sink.push_frame(idx as u32, frame)?;
    }
    sink.end()
}

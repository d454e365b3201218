//! rainbowfx turns a single still image into an animated palette-cycling
//! sequence ("rainbowify") and encodes it as a looping GIF or an MP4 video.
//!
//! The effect converts the image to a per-pixel brightness field, partitions
//! the brightness range into one band per palette color, and advances the
//! field by `+1 mod 256` between frames so colors flow through the image. An
//! optional caption is stamped across the top of every frame.
//!
//! - One-shot use: [`render_effect`] with [`EffectOpts`]
//! - Library use: [`rainbowify`] then [`overlay`], feeding any [`FrameSink`]
#![forbid(unsafe_code)]

pub mod core;
pub mod encode;
pub mod error;
pub mod field;
pub mod generate;
pub mod overlay;
pub mod palette;
pub mod pipeline;

pub use crate::core::{Fps, FrameBgr, OutputSize};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::gif::GifSink;
pub use crate::encode::{FrameSink, InMemorySink, OutputFormat, SinkConfig};
pub use crate::error::{RainbowError, RainbowResult};
pub use crate::field::BrightnessField;
pub use crate::generate::rainbowify;
pub use crate::overlay::{overlay, render_caption};
pub use crate::palette::{Color, Palette};
pub use crate::pipeline::{EffectOpts, frame_count, render_effect};

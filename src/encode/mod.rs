//! Encoding sinks: frame sequences go out as animated GIFs or MP4 video.

pub mod ffmpeg;
pub mod gif;

use std::path::Path;

use crate::core::{Fps, FrameBgr};
use crate::error::{RainbowError, RainbowResult};

/// Configuration provided to a [`FrameSink`] before any frames are pushed.
#[derive(Debug, Clone, Copy)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second; each frame displays for `1 / fps` seconds.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in display order.
///
/// Ordering contract: `push_frame` is called in strictly increasing frame
/// index order, starting at 0.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> RainbowResult<()>;
    /// Push one frame in strictly increasing display order.
    fn push_frame(&mut self, idx: u32, frame: &FrameBgr) -> RainbowResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> RainbowResult<()>;
}

/// Output container, selected by the output file's extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Animated GIF, looping forever.
    Gif,
    /// MP4 video via the system `ffmpeg`.
    Mp4,
}

impl OutputFormat {
    /// Dispatch on the output path's extension (ASCII case-insensitive).
    ///
    /// Anything other than `.gif` or `.mp4` is a validation error; callers
    /// must not have written any file by the time this is checked.
    pub fn from_path(path: &Path) -> RainbowResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("gif") => Ok(Self::Gif),
            Some("mp4") => Ok(Self::Mp4),
            _ => Err(RainbowError::validation(format!(
                "unsupported output extension for '{}': only .gif and .mp4 are supported",
                path.display()
            ))),
        }
    }

    /// Create the sink for this format writing to `path`.
    pub fn create_sink(self, path: &Path) -> Box<dyn FrameSink> {
        match self {
            Self::Gif => Box::new(gif::GifSink::new(path)),
            Self::Mp4 => Box::new(ffmpeg::FfmpegSink::new(ffmpeg::FfmpegSinkOpts::new(path))),
        }
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u32, FrameBgr)>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(u32, FrameBgr)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> RainbowResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: u32, frame: &FrameBgr) -> RainbowResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> RainbowResult<()> {
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
pub(crate) fn ensure_parent_dir(path: &Path) -> RainbowResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};

use crate::core::FrameBgr;
use crate::encode::{FrameSink, SinkConfig, ensure_parent_dir};
use crate::error::{RainbowError, RainbowResult};

/// Sink that writes an infinitely-looping animated GIF through the image
/// crate's GIF encoder.
pub struct GifSink {
    out_path: PathBuf,
    encoder: Option<GifEncoder<BufWriter<File>>>,
    cfg: Option<SinkConfig>,
    delay: Delay,
    last_idx: Option<u32>,
}

impl GifSink {
    /// Create a sink writing to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            encoder: None,
            cfg: None,
            delay: Delay::from_numer_denom_ms(0, 1),
            last_idx: None,
        }
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> RainbowResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(RainbowError::validation(
                "gif sink width/height must be non-zero",
            ));
        }

        ensure_parent_dir(&self.out_path)?;
        let file = File::create(&self.out_path).map_err(|e| {
            RainbowError::encode(format!(
                "failed to create output file '{}': {e}",
                self.out_path.display()
            ))
        })?;

        let mut encoder = GifEncoder::new(BufWriter::new(file));
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| RainbowError::encode(format!("failed to write gif loop header: {e}")))?;

        self.delay =
            Delay::from_saturating_duration(Duration::from_secs_f64(cfg.fps.frame_duration_secs()));
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.last_idx = None;
        tracing::debug!(path = %self.out_path.display(), "gif sink started");
        Ok(())
    }

    fn push_frame(&mut self, idx: u32, frame: &FrameBgr) -> RainbowResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| RainbowError::encode("gif sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(RainbowError::encode(
                "gif sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(RainbowError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        let Some(encoder) = self.encoder.as_mut() else {
            return Err(RainbowError::encode("gif sink is already finalized"));
        };

        // GIF frames carry no alpha in this pipeline; expand BGR to opaque RGBA.
        let mut rgba = Vec::with_capacity(frame.data.len() / 3 * 4);
        for px in frame.data.chunks_exact(3) {
            rgba.extend_from_slice(&[px[2], px[1], px[0], 255]);
        }
        let buffer = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
            .ok_or_else(|| RainbowError::encode("gif frame buffer length mismatch (bug)"))?;

        encoder
            .encode_frame(Frame::from_parts(buffer, 0, 0, self.delay))
            .map_err(|e| RainbowError::encode(format!("failed to encode gif frame {idx}: {e}")))?;
        Ok(())
    }

    fn end(&mut self) -> RainbowResult<()> {
        if self.cfg.is_none() {
            return Err(RainbowError::encode("gif sink not started"));
        }
        // Dropping the encoder flushes the trailer through the BufWriter.
        drop(self.encoder.take());
        self.cfg = None;
        tracing::debug!(path = %self.out_path.display(), "gif sink finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Fps;
    use image::AnimationDecoder as _;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from("target").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_a_decodable_looping_gif() {
        let out = scratch_dir("gif_sink").join("two_frames.gif");
        let _ = std::fs::remove_file(&out);

        let mut sink = GifSink::new(&out);
        sink.begin(SinkConfig {
            width: 4,
            height: 3,
            fps: Fps::new(10.0).unwrap(),
        })
        .unwrap();

        let mut red = FrameBgr::new(4, 3);
        for px in red.data.chunks_exact_mut(3) {
            px.copy_from_slice(&[0, 0, 255]);
        }
        sink.push_frame(0, &FrameBgr::new(4, 3)).unwrap();
        sink.push_frame(1, &red).unwrap();
        sink.end().unwrap();

        let decoder =
            image::codecs::gif::GifDecoder::new(std::io::BufReader::new(File::open(&out).unwrap()))
                .unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].buffer().dimensions(), (4, 3));
    }

    #[test]
    fn rejects_out_of_order_and_mismatched_frames() {
        let out = scratch_dir("gif_sink").join("ordering.gif");
        let mut sink = GifSink::new(&out);
        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            fps: Fps::new(10.0).unwrap(),
        })
        .unwrap();

        sink.push_frame(1, &FrameBgr::new(2, 2)).unwrap();
        assert!(sink.push_frame(1, &FrameBgr::new(2, 2)).is_err());
        assert!(sink.push_frame(2, &FrameBgr::new(3, 2)).is_err());
    }

    #[test]
    fn push_before_begin_is_an_error() {
        let mut sink = GifSink::new("target/gif_sink/never.gif");
        assert!(sink.push_frame(0, &FrameBgr::new(1, 1)).is_err());
        assert!(sink.end().is_err());
    }
}

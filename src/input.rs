use crate::all::*;

// Raw 8-bit frame as supplied by a frame source. `channels` is 1 for
// grayscale or 3 for interleaved RGB.
#[derive(Clone, Debug)]
pub struct VideoFrame {
  pub data: Vec<u8>,
  pub width: usize,
  pub height: usize,
  pub channels: usize,
}

impl VideoFrame {
  pub fn gray(image: &Image) -> VideoFrame {
    VideoFrame {
      data: image.data.clone(),
      width: image.width,
      height: image.height,
      channels: 1,
    }
  }

  // Luminance conversion with ITU-R BT.601 weights.
  pub fn to_gray(&self, out: &mut Image) -> Result<()> {
    if self.data.len() != self.width * self.height * self.channels {
      bail!("Frame has {} bytes, expected {}x{}x{}.", self.data.len(), self.width, self.height, self.channels);
    }
    out.width = self.width;
    out.height = self.height;
    out.data.clear();
    match self.channels {
      1 => out.data.extend_from_slice(&self.data),
      3 => {
        out.data.extend(self.data.chunks_exact(3).map(|rgb| {
          let v = 0.299 * rgb[0] as f64 + 0.587 * rgb[1] as f64 + 0.114 * rgb[2] as f64;
          v.round().min(255.) as u8
        }));
      },
      n => bail!("Unsupported channel count {}.", n),
    }
    Ok(())
  }

  // Packed 0RGB value used by the window buffer.
  pub fn rgb_u32(&self, x: usize, y: usize) -> u32 {
    let i = (y * self.width + x) * self.channels;
    if self.channels == 3 {
      ((self.data[i] as u32) << 16) | ((self.data[i + 1] as u32) << 8) | self.data[i + 2] as u32
    }
    else {
      let gray = self.data[i] as u32;
      gray | (gray << 8) | (gray << 16)
    }
  }
}

// Sequential supplier of frames in display order.
//
// Not using `impl Iterator` to allow returning `Result`.
// End of data is signaled by `Result::Ok(Option::None)`.
pub trait FrameSource {
  fn next_frame(&mut self) -> Result<Option<&VideoFrame>>;
}

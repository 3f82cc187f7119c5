use crate::all::*;

// Row-major grayscale image storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
  pub data: Vec<u8>,
  pub width: usize,
  pub height: usize,
}

impl Image {
  pub fn empty() -> Image {
    Image {
      data: vec![],
      width: 0,
      height: 0,
    }
  }

  pub fn new(width: usize, height: usize) -> Image {
    Image {
      data: vec![0; width * height],
      width,
      height,
    }
  }

  pub fn from_data(width: usize, height: usize, data: Vec<u8>) -> Result<Image> {
    if data.len() != width * height {
      bail!("Image data has {} bytes, expected {}x{}.", data.len(), width, height);
    }
    Ok(Image { data, width, height })
  }

  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  #[inline(always)]
  pub fn value(&self, x: usize, y: usize) -> u8 {
    self.data[y * self.width + x]
  }

  // Replicates the border pixels for coordinates outside the image.
  #[inline(always)]
  pub fn value_clamped(&self, x: i32, y: i32) -> u8 {
    let x = x.clamp(0, self.width as i32 - 1) as usize;
    let y = y.clamp(0, self.height as i32 - 1) as usize;
    self.data[y * self.width + x]
  }

  #[inline(always)]
  pub fn set_value(&mut self, x: usize, y: usize, value: u8) {
    self.data[y * self.width + x] = value;
  }

  // Coordinate (0, 0) is the center of the top-left pixel.
  pub fn contains(&self, p: &Vector2d) -> bool {
    p[0] >= 0. && p[1] >= 0.
      && p[0] <= (self.width - 1) as f64
      && p[1] <= (self.height - 1) as f64
  }

  // Bilinear interpolation, clamping samples to the image borders.
  #[inline(always)]
  pub fn bilinear(&self, u: Vector2d) -> f64 {
    let x = u[0].clamp(0., (self.width - 1) as f64);
    let y = u[1].clamp(0., (self.height - 1) as f64);
    let x0 = x as usize;
    let y0 = y as usize;
    let x1 = usize::min(x0 + 1, self.width - 1);
    let y1 = usize::min(y0 + 1, self.height - 1);
    let xa = x - x0 as f64;
    let ya = y - y0 as f64;
    (1. - xa) * (1. - ya) * self.value(x0, y0) as f64
      + xa * (1. - ya) * self.value(x1, y0) as f64
      + (1. - xa) * ya * self.value(x0, y1) as f64
      + xa * ya * self.value(x1, y1) as f64
  }
}

use crate::all::*;

// Smoothing kernel applied before subsampling, in both directions.
const KERNEL: [u32; 3] = [1, 2, 1];

// Downscaled copies of a grayscale image. `levels[0]` is half the size of the
// base image, `levels[1]` a quarter and so on. The base image itself is not stored.
#[derive(Clone, Debug)]
pub struct Pyramid {
  pub levels: Vec<Image>,
}

impl Pyramid {
  // Stops early when a side of the next level would be smaller than `min_size`.
  pub fn new(
    base: &Image,
    unused_pyramid: Option<Pyramid>,
    level_count: usize,
    min_size: usize,
  ) -> Pyramid {
    let mut levels = unused_pyramid.map(|x| x.levels).unwrap_or_default();
    levels.truncate(level_count);
    let mut built = 0;
    for level_ind in 0..level_count {
      let parent = if level_ind > 0 { &levels[level_ind - 1] } else { base };
      let (width, height) = ((parent.width + 1) / 2, (parent.height + 1) / 2);
      if width < min_size || height < min_size || parent.width < 2 || parent.height < 2 { break }
      let mut child = if level_ind < levels.len() {
        std::mem::replace(&mut levels[level_ind], Image::empty())
      }
      else {
        Image::empty()
      };
      let parent = if level_ind > 0 { &levels[level_ind - 1] } else { base };
      downscale(parent, &mut child);
      if level_ind < levels.len() {
        levels[level_ind] = child;
      }
      else {
        levels.push(child);
      }
      built += 1;
    }
    levels.truncate(built);
    Pyramid { levels }
  }

  pub fn len(&self) -> usize {
    self.levels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.levels.is_empty()
  }
}

fn downscale(parent: &Image, child: &mut Image) {
  child.width = (parent.width + 1) / 2;
  child.height = (parent.height + 1) / 2;
  child.data.clear();
  child.data.reserve(child.width * child.height);
  for y in 0..child.height {
    for x in 0..child.width {
      let mut sum = 0;
      for (j, wy) in KERNEL.iter().enumerate() {
        for (i, wx) in KERNEL.iter().enumerate() {
          let px = 2 * x as i32 + i as i32 - 1;
          let py = 2 * y as i32 + j as i32 - 1;
          sum += wx * wy * parent.value_clamped(px, py) as u32;
        }
      }
      // Kernel weights sum to 16.
      child.data.push(((sum + 8) / 16) as u8);
    }
  }
}

use crate::all::*;

// Grayscale frame prepared for tracking.
pub struct Frame {
  pub image: Image,
  pub pyramid: Pyramid,
}

impl Frame {
  pub fn new(
    image: Image,
    unused_frame: Option<Frame>,
    flow: &FlowParams,
  ) -> Frame {
    let unused_pyramid = unused_frame.map(|x| x.pyramid);
    Frame {
      pyramid: Pyramid::new(&image, unused_pyramid, flow.pyramid_levels, flow.win_size),
      image,
    }
  }

  pub fn width(&self) -> usize {
    self.image.width
  }

  pub fn height(&self) -> usize {
    self.image.height
  }

  // Number of usable levels, including the full resolution image.
  pub fn level_count(&self) -> usize {
    self.pyramid.len() + 1
  }

  pub fn get_level(&self, level: usize) -> &Image {
    if level == 0 {
      &self.image
    }
    else {
      &self.pyramid.levels[level - 1]
    }
  }
}

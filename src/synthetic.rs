// Deterministic moving scene, used when no video is given and in tests.

use crate::all::*;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

const COMPONENT_COUNT: usize = 12;

struct Component {
  kx: f64,
  ky: f64,
  phase_x: f64,
  phase_y: f64,
  amplitude: f64,
}

// Smooth texture made of products of sinusoids. Evaluated analytically so that
// sub-pixel translations are exact.
pub struct SyntheticScene {
  components: Vec<Component>,
}

impl SyntheticScene {
  pub fn new(seed: u64) -> SyntheticScene {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let tau = 2. * std::f64::consts::PI;
    let components = (0..COMPONENT_COUNT).map(|_| Component {
      kx: tau / rng.gen_range(16.0..48.0),
      ky: tau / rng.gen_range(16.0..48.0),
      phase_x: rng.gen_range(0.0..tau),
      phase_y: rng.gen_range(0.0..tau),
      amplitude: rng.gen_range(12.0..18.0),
    }).collect();
    SyntheticScene { components }
  }

  pub fn value(&self, x: f64, y: f64) -> f64 {
    let mut v = 128.;
    for c in &self.components {
      v += c.amplitude * (c.kx * x + c.phase_x).sin() * (c.ky * y + c.phase_y).sin();
    }
    v.clamp(0., 255.)
  }

  // The scene content moves by `shift` pixels.
  pub fn render(&self, width: usize, height: usize, shift: Vector2d) -> Image {
    let mut image = Image::new(width, height);
    self.render_into(&mut image.data, width, height, shift);
    image
  }

  fn render_into(&self, data: &mut Vec<u8>, width: usize, height: usize, shift: Vector2d) {
    data.clear();
    for y in 0..height {
      for x in 0..width {
        let v = self.value(x as f64 - shift[0], y as f64 - shift[1]);
        data.push(v.round() as u8);
      }
    }
  }
}

// Frame source translating a synthetic scene at constant velocity.
pub struct SyntheticInput {
  scene: SyntheticScene,
  velocity: Vector2d,
  frame_count: usize,
  frame_number: usize,
  video_frame: VideoFrame,
}

impl SyntheticInput {
  pub fn new(
    seed: u64,
    width: usize,
    height: usize,
    velocity: Vector2d,
    frame_count: usize,
  ) -> SyntheticInput {
    SyntheticInput {
      scene: SyntheticScene::new(seed),
      velocity,
      frame_count,
      frame_number: 0,
      video_frame: VideoFrame {
        data: vec![],
        width,
        height,
        channels: 1,
      },
    }
  }
}

impl FrameSource for SyntheticInput {
  fn next_frame(&mut self) -> Result<Option<&VideoFrame>> {
    if self.frame_number >= self.frame_count { return Ok(None) }
    let shift = self.velocity * self.frame_number as f64;
    let (width, height) = (self.video_frame.width, self.video_frame.height);
    self.scene.render_into(&mut self.video_frame.data, width, height, shift);
    self.frame_number += 1;
    Ok(Some(&self.video_frame))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_same_seed_same_scene() {
    let a = SyntheticScene::new(11).render(32, 24, Vector2d::zeros());
    let b = SyntheticScene::new(11).render(32, 24, Vector2d::zeros());
    let c = SyntheticScene::new(12).render(32, 24, Vector2d::zeros());
    assert_eq!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  fn test_integer_shift_moves_pixels() {
    let scene = SyntheticScene::new(5);
    let a = scene.render(32, 24, Vector2d::zeros());
    let b = scene.render(32, 24, Vector2d::new(3., 2.));
    for y in 0..20 {
      for x in 0..28 {
        assert_eq!(a.value(x, y), b.value(x + 3, y + 2));
      }
    }
  }

  #[test]
  fn test_input_ends() {
    let mut input = SyntheticInput::new(1, 16, 8, Vector2d::new(1., 0.), 2);
    assert_eq!(input.next_frame().unwrap().unwrap().data.len(), 128);
    assert!(input.next_frame().unwrap().is_some());
    assert!(input.next_frame().unwrap().is_none());
  }
}

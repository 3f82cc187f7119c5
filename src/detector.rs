// Shi-Tomasi "good features to track" corner detector.

use crate::all::*;

// Pixels where new features must not be detected.
#[derive(Clone, Debug, Default)]
pub struct ExclusionMask {
  pub width: usize,
  pub height: usize,
  pub excluded: Vec<bool>,
}

impl ExclusionMask {
  pub fn new(width: usize, height: usize) -> ExclusionMask {
    ExclusionMask {
      width,
      height,
      excluded: vec![false; width * height],
    }
  }

  // Excludes every pixel at distance `radius` or less from a head.
  pub fn build(&mut self, width: usize, height: usize, heads: &[Vector2d], radius: f64) {
    self.width = width;
    self.height = height;
    self.excluded.clear();
    self.excluded.resize(width * height, false);
    if width == 0 || height == 0 { return }
    let r2 = radius * radius;
    for head in heads {
      let x0 = f64::max((head[0] - radius).floor(), 0.);
      let y0 = f64::max((head[1] - radius).floor(), 0.);
      let x1 = f64::min((head[0] + radius).ceil(), (width - 1) as f64);
      let y1 = f64::min((head[1] + radius).ceil(), (height - 1) as f64);
      if x0 > x1 || y0 > y1 { continue }
      for y in (y0 as usize)..=(y1 as usize) {
        for x in (x0 as usize)..=(x1 as usize) {
          let dx = x as f64 - head[0];
          let dy = y as f64 - head[1];
          if dx * dx + dy * dy <= r2 {
            self.excluded[y * width + x] = true;
          }
        }
      }
    }
  }

  // An empty mask excludes nothing.
  #[inline(always)]
  pub fn is_excluded(&self, x: usize, y: usize) -> bool {
    !self.excluded.is_empty() && self.excluded[y * self.width + x]
  }
}

// Finds new seed points. Never fails: no corners is an empty result.
pub trait FeatureDetector {
  fn detect(
    &mut self,
    frame: &Frame,
    mask: &ExclusionMask,
    max_count: usize,
    detections: &mut Vec<Vector2d>,
  );
}

pub struct ShiTomasiDetector {
  quality_level: f64,
  min_distance: f64,
  block_size: usize,
  tmp: Tmp,
}

// Workspace reused between frames.
#[derive(Default)]
struct Tmp {
  ix: Vec<f64>,
  iy: Vec<f64>,
  xx: Vec<f64>,
  xy: Vec<f64>,
  yy: Vec<f64>,
  row_sums: Vec<f64>,
  response: Vec<f64>,
  candidates: Vec<(f64, usize)>,
}

impl ShiTomasiDetector {
  pub fn new(p: &DetectorParams) -> Result<ShiTomasiDetector> {
    p.validate()?;
    Ok(ShiTomasiDetector {
      quality_level: p.quality_level,
      min_distance: p.min_distance,
      block_size: p.block_size,
      tmp: Tmp::default(),
    })
  }

  // Minimum eigenvalue of the structure tensor at every pixel.
  fn compute_response(&mut self, image: &Image) {
    let (w, h) = (image.width, image.height);
    let t = &mut self.tmp;
    sobel(image, &mut t.ix, &mut t.iy);
    t.xx.clear();
    t.xy.clear();
    t.yy.clear();
    for (gx, gy) in t.ix.iter().zip(&t.iy) {
      t.xx.push(gx * gx);
      t.xy.push(gx * gy);
      t.yy.push(gy * gy);
    }
    let r = self.block_size / 2;
    box_sum(&mut t.xx, w, h, r, &mut t.row_sums);
    box_sum(&mut t.xy, w, h, r, &mut t.row_sums);
    box_sum(&mut t.yy, w, h, r, &mut t.row_sums);
    t.response.clear();
    for i in 0..(w * h) {
      let m = Matrix2d::new(t.xx[i], t.xy[i], t.xy[i], t.yy[i]);
      t.response.push(f64::max(min_eigenvalue(&m), 0.));
    }
  }
}

impl FeatureDetector for ShiTomasiDetector {
  fn detect(
    &mut self,
    frame: &Frame,
    mask: &ExclusionMask,
    max_count: usize,
    detections: &mut Vec<Vector2d>,
  ) {
    detections.clear();
    let image = &frame.image;
    let (w, h) = (image.width, image.height);
    if !mask.excluded.is_empty() {
      assert_eq!((mask.width, mask.height), (w, h), "Exclusion mask does not match the frame.");
    }
    if w < 3 || h < 3 || max_count == 0 { return }
    self.compute_response(image);

    let t = &mut self.tmp;
    let mut max_response = 0.;
    for y in 0..h {
      for x in 0..w {
        if mask.is_excluded(x, y) { continue }
        max_response = f64::max(max_response, t.response[y * w + x]);
      }
    }
    if max_response <= 0. { return }
    let threshold = self.quality_level * max_response;

    t.candidates.clear();
    for y in 1..(h - 1) {
      for x in 1..(w - 1) {
        let i = y * w + x;
        let v = t.response[i];
        if v <= threshold || mask.is_excluded(x, y) { continue }
        if !is_local_maximum(&t.response, w, x, y) { continue }
        t.candidates.push((v, i));
      }
    }
    // Strongest first, ties in row-major order.
    t.candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1)));

    let min_d2 = self.min_distance * self.min_distance;
    for (_, i) in &t.candidates {
      let p = Vector2d::new((i % w) as f64, (i / w) as f64);
      if detections.iter().any(|q| (q - p).norm_squared() < min_d2) { continue }
      detections.push(p);
      if detections.len() >= max_count { break }
    }
  }
}

fn is_local_maximum(response: &[f64], w: usize, x: usize, y: usize) -> bool {
  let v = response[y * w + x];
  for ny in (y - 1)..=(y + 1) {
    for nx in (x - 1)..=(x + 1) {
      if response[ny * w + nx] > v { return false }
    }
  }
  true
}

fn sobel(image: &Image, out_x: &mut Vec<f64>, out_y: &mut Vec<f64>) {
  out_x.clear();
  out_y.clear();
  let v = |x: i32, y: i32| image.value_clamped(x, y) as f64;
  for y in 0..image.height as i32 {
    for x in 0..image.width as i32 {
      out_x.push((v(x + 1, y - 1) + 2. * v(x + 1, y) + v(x + 1, y + 1)
        - v(x - 1, y - 1) - 2. * v(x - 1, y) - v(x - 1, y + 1)) / 8.);
      out_y.push((v(x - 1, y + 1) + 2. * v(x, y + 1) + v(x + 1, y + 1)
        - v(x - 1, y - 1) - 2. * v(x, y - 1) - v(x + 1, y - 1)) / 8.);
    }
  }
}

// In-place sum over a (2r + 1) x (2r + 1) box, replicating the borders.
fn box_sum(data: &mut [f64], w: usize, h: usize, r: usize, tmp: &mut Vec<f64>) {
  let r = r as i32;
  let clamp = |v: i32, n: usize| v.clamp(0, n as i32 - 1) as usize;
  tmp.clear();
  for y in 0..h {
    for x in 0..w as i32 {
      let mut s = 0.;
      for k in -r..=r {
        s += data[y * w + clamp(x + k, w)];
      }
      tmp.push(s);
    }
  }
  for y in 0..h as i32 {
    for x in 0..w {
      let mut s = 0.;
      for k in -r..=r {
        s += tmp[clamp(y + k, h) * w + x];
      }
      data[y as usize * w + x] = s;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params() -> DetectorParams {
    DetectorParams {
      max_corners: 200,
      quality_level: 0.3,
      min_distance: 7.,
      block_size: 3,
    }
  }

  // Bright square covering pixels 20..=39 on a dark background.
  fn square_frame() -> Frame {
    let mut image = Image::new(60, 60);
    for y in 20..40 {
      for x in 20..40 {
        image.set_value(x, y, 255);
      }
    }
    Frame::new(image, None, &FlowParams {
      win_size: 15,
      pyramid_levels: 0,
      max_iterations: 10,
      epsilon: 0.03,
    })
  }

  fn near(points: &[Vector2d], x: f64, y: f64) -> bool {
    points.iter().any(|p| (p - Vector2d::new(x, y)).norm() <= 2.)
  }

  #[test]
  fn test_square_corners() {
    let mut detector = ShiTomasiDetector::new(&params()).unwrap();
    let frame = square_frame();
    let mut detections = vec![];
    detector.detect(&frame, &ExclusionMask::default(), 200, &mut detections);
    assert_eq!(detections.len(), 4, "{:?}", detections);
    for (x, y) in [(20., 20.), (39., 20.), (20., 39.), (39., 39.)] {
      assert!(near(&detections, x, y), "missing corner ({}, {}) in {:?}", x, y, detections);
    }
  }

  #[test]
  fn test_max_count() {
    let mut detector = ShiTomasiDetector::new(&params()).unwrap();
    let mut detections = vec![];
    detector.detect(&square_frame(), &ExclusionMask::default(), 2, &mut detections);
    assert_eq!(detections.len(), 2);
  }

  #[test]
  fn test_min_distance() {
    let mut p = params();
    p.min_distance = 25.;
    let mut detector = ShiTomasiDetector::new(&p).unwrap();
    let mut detections = vec![];
    detector.detect(&square_frame(), &ExclusionMask::default(), 200, &mut detections);
    assert_eq!(detections.len(), 2, "{:?}", detections);
    assert!((detections[0] - detections[1]).norm() >= 25.);
  }

  #[test]
  fn test_mask_excludes_corner() {
    let mut detector = ShiTomasiDetector::new(&params()).unwrap();
    let mut mask = ExclusionMask::default();
    let head = Vector2d::new(20.3, 19.6);
    mask.build(60, 60, &[head], 5.);
    let mut detections = vec![];
    detector.detect(&square_frame(), &mask, 200, &mut detections);
    assert_eq!(detections.len(), 3, "{:?}", detections);
    assert!(detections.iter().all(|p| (p - head).norm() > 5.));
  }

  #[test]
  fn test_flat_image_has_no_corners() {
    let mut detector = ShiTomasiDetector::new(&params()).unwrap();
    let frame = Frame::new(Image::from_data(30, 30, vec![90; 900]).unwrap(), None, &FlowParams {
      win_size: 15,
      pyramid_levels: 0,
      max_iterations: 10,
      epsilon: 0.03,
    });
    let mut detections = vec![Vector2d::new(1., 1.)];
    detector.detect(&frame, &ExclusionMask::default(), 200, &mut detections);
    assert!(detections.is_empty());
  }

  #[test]
  fn test_mask_build() {
    let mut mask = ExclusionMask::new(20, 20);
    mask.build(20, 20, &[Vector2d::new(10., 10.), Vector2d::new(0.5, 0.5)], 2.);
    assert!(mask.is_excluded(10, 10));
    assert!(mask.is_excluded(12, 10));
    assert!(!mask.is_excluded(12, 12));
    assert!(!mask.is_excluded(13, 10));
    assert!(mask.is_excluded(0, 0));
    // 13 pixels for the full disc, 8 left of the one clipped by the image corner.
    assert_eq!(mask.excluded.iter().filter(|x| **x).count(), 13 + 8);

    mask.build(20, 20, &[], 2.);
    assert!(mask.excluded.iter().all(|x| !x));
  }

  #[test]
  #[should_panic(expected = "Exclusion mask does not match the frame.")]
  fn test_mask_of_other_size_is_rejected() {
    let mut detector = ShiTomasiDetector::new(&params()).unwrap();
    let mut mask = ExclusionMask::default();
    mask.build(20, 20, &[Vector2d::new(5., 5.)], 2.);
    let mut detections = vec![];
    detector.detect(&square_frame(), &mask, 200, &mut detections);
  }
}

// Pyramidal Lucas-Kanade tracker based on:
// <http://robots.stanford.edu/cs223b04/algo_tracking.pdf>
// “Pyramidal Implementation of the Lucas Kanade Feature Tracker
//   Description of the algorithm” by Jean-Yves Bouguet

use crate::all::*;

// Smallest accepted eigenvalue of the spatial gradient matrix divided by the
// window area. Below this the window has no usable texture.
const MIN_EIGENVALUE: f64 = 1e-3;

#[allow(non_snake_case)]
pub struct OpticalFlow {
  lk_iters: usize,
  lk_levels: usize,
  lk_win_size: usize,
  lk_epsilon: f64,
  Ix: Matrixd,
  Iy: Matrixd,
  It: Matrixd,
  // Workspace.
  grid0: Matrixd,
}

impl OpticalFlow {
  pub fn new(p: &FlowParams) -> Result<OpticalFlow> {
    p.validate()?;
    Ok(OpticalFlow {
      lk_iters: p.max_iterations,
      lk_levels: p.pyramid_levels,
      lk_win_size: p.win_size,
      lk_epsilon: p.epsilon,
      Ix: DMatrix::zeros(p.win_size, p.win_size),
      Iy: DMatrix::zeros(p.win_size, p.win_size),
      It: DMatrix::zeros(p.win_size, p.win_size),
      grid0: DMatrix::zeros(p.win_size + 2, p.win_size + 2),
    })
  }

  // Lost features keep their seed coordinates in `features1`.
  pub fn process(
    &mut self,
    frame0: &Frame,
    frame1: &Frame,
    features0: &[Vector2d],
    features1: &mut Vec<Vector2d>,
    statuses: &mut Vec<bool>,
  ) {
    features1.clear();
    statuses.clear();
    for feature0 in features0 {
      if let Some(feature1) = self.process_feature(frame0, frame1, *feature0) {
        features1.push(feature1);
        statuses.push(true);
      }
      else {
        features1.push(*feature0);
        statuses.push(false);
      }
    }
  }

  #[allow(non_snake_case)]
  fn process_feature(
    &mut self,
    frame0: &Frame,
    frame1: &Frame,
    feature0: Vector2d,
  ) -> Option<Vector2d> {
    if !frame0.image.contains(&feature0) { return None }
    let r = (self.lk_win_size - 1) / 2;
    let area = (self.lk_win_size * self.lk_win_size) as f64;
    let top = usize::min(
      self.lk_levels,
      usize::min(frame0.level_count(), frame1.level_count()) - 1,
    );
    let mut g = Vector2d::zeros();
    let mut d = Vector2d::zeros();
    for L in (0..top + 1).rev() {
      let level0 = frame0.get_level(L);
      let level1 = frame1.get_level(L);
      let u = feature0 / u32::pow(2, L as u32) as f64;
      scharr(level0, u, r, &mut self.Ix, &mut self.Iy, &mut self.grid0);
      let G = spatial_gradient(&self.Ix, &self.Iy);
      if min_eigenvalue(&G) / area < MIN_EIGENVALUE { return None }
      let inv_G = G.try_inverse()?;
      let mut nu = Vector2d::zeros();
      for _ in 0..self.lk_iters {
        let v = u + g + nu;
        if !near_level(level1, &v, r as f64) { return None }
        image_difference(r, &self.grid0, &mut self.It, level1, v);
        let eta = flow_vector(&inv_G, &self.Ix, &self.Iy, &self.It);
        nu += eta;
        if !(nu[0].is_finite() && nu[1].is_finite()) { return None }
        if eta.norm() < self.lk_epsilon { break }
      }
      d = nu;
      if L > 0 { g = 2. * (g + d) }
    }
    let feature1 = feature0 + g + d;
    if !frame1.image.contains(&feature1) { return None }
    Some(feature1)
  }
}

// Whether a point is inside the level or at most `margin` pixels outside it.
fn near_level(level: &Image, v: &Vector2d, margin: f64) -> bool {
  v[0] >= -margin && v[1] >= -margin
    && v[0] <= level.width as f64 - 1. + margin
    && v[1] <= level.height as f64 - 1. + margin
}

#[allow(non_snake_case)]
fn image_difference(
  r: usize,
  I0: &Matrixd,
  It: &mut Matrixd,
  level: &Image,
  center: Vector2d,
) {
  let n = 2 * r + 1;
  if It.nrows() != n || It.ncols() != n {
    *It = DMatrix::zeros(n, n);
  }
  for y in 0..n {
    for x in 0..n {
      let offset = Vector2d::new(x as f64 - r as f64, y as f64 - r as f64);
      It[(y, x)] = I0[(y + 1, x + 1)] - level.bilinear(center + offset);
    }
  }
}

#[allow(non_snake_case)]
fn flow_vector(
  inv_G: &Matrix2d,
  Ix: &Matrixd,
  Iy: &Matrixd,
  It: &Matrixd,
) -> Vector2d {
  let mut b = Vector2d::zeros();
  for y in 0..Ix.nrows() {
    for x in 0..Ix.ncols() {
      b[0] += It[(y, x)] * Ix[(y, x)];
      b[1] += It[(y, x)] * Iy[(y, x)];
    }
  }
  inv_G * b
}

#[allow(non_snake_case)]
fn spatial_gradient(Ix: &Matrixd, Iy: &Matrixd) -> Matrix2d {
  assert_eq!(Ix.nrows(), Iy.nrows());
  assert_eq!(Ix.ncols(), Iy.ncols());
  let mut x2 = 0.;
  let mut y2 = 0.;
  let mut xy = 0.;
  for y in 0..Ix.nrows() {
    for x in 0..Ix.ncols() {
      x2 += Ix[(y, x)] * Ix[(y, x)];
      y2 += Iy[(y, x)] * Iy[(y, x)];
      xy += Ix[(y, x)] * Iy[(y, x)];
    }
  }
  Matrix2d::new(x2, xy, xy, y2)
}

// Smaller eigenvalue of a symmetric 2x2 matrix.
pub fn min_eigenvalue(m: &Matrix2d) -> f64 {
  let a = m[(0, 0)];
  let b = m[(0, 1)];
  let c = m[(1, 1)];
  let h = 0.5 * (a - c);
  0.5 * (a + c) - (h * h + b * b).sqrt()
}

// Samples a (2r + 1) x (2r + 1) grid around the center.
fn fill_grid(
  level: &Image,
  center: Vector2d,
  r: usize,
  grid: &mut Matrixd,
) {
  let n = 2 * r + 1;
  if grid.nrows() != n || grid.ncols() != n {
    *grid = DMatrix::zeros(n, n);
  }
  for y in 0..n {
    for x in 0..n {
      let offset = Vector2d::new(x as f64 - r as f64, y as f64 - r as f64);
      grid[(y, x)] = level.bilinear(center + offset);
    }
  }
}

// Gradients over the integration window. `grid` is left holding the window
// intensities with a one pixel border.
fn scharr(
  level: &Image,
  center: Vector2d,
  r: usize,
  out_x: &mut Matrixd,
  out_y: &mut Matrixd,
  // Workspace.
  grid: &mut Matrixd,
) {
  fill_grid(level, center, r + 1, grid);
  let n = 2 * r + 1;
  if out_x.nrows() != n || out_x.ncols() != n {
    *out_x = Matrixd::zeros(n, n);
    *out_y = Matrixd::zeros(n, n);
  }
  for y in 1..(grid.nrows() - 1) {
    for x in 1..(grid.ncols() - 1) {
      out_x[(y - 1, x - 1)] = (10. * grid[(y, x + 1)]
        + 3. * grid[(y + 1, x + 1)]
        + 3. * grid[(y - 1, x + 1)]
        - 10. * grid[(y, x - 1)]
        - 3. * grid[(y + 1, x - 1)]
        - 3. * grid[(y - 1, x - 1)]
      ) / 32.;
      out_y[(y - 1, x - 1)] = (10. * grid[(y + 1, x)]
        + 3. * grid[(y + 1, x + 1)]
        + 3. * grid[(y + 1, x - 1)]
        - 10. * grid[(y - 1, x)]
        - 3. * grid[(y - 1, x + 1)]
        - 3. * grid[(y - 1, x - 1)]
      ) / 32.;
    }
  }
}

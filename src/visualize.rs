use crate::all::*;

const MASK_COLOR: u32 = 0x400000;
const SELECTION_COLOR: u32 = 0xffff00;

// Packed 0RGB pixels. Zero is treated as transparent by `overlay()`.
#[derive(Clone)]
pub struct Canvas {
  pub data: Vec<u32>,
  pub width: usize,
  pub height: usize,
}

impl Canvas {
  pub fn new(width: usize, height: usize) -> Canvas {
    Canvas {
      data: vec![0; width * height],
      width,
      height,
    }
  }

  pub fn clear(&mut self) {
    for v in self.data.iter_mut() {
      *v = 0;
    }
  }

  #[inline(always)]
  pub fn draw_pixel(&mut self, p: &Vector2i, v: u32) {
    if p[0] < 0 || p[0] >= self.width as i32 { return }
    if p[1] < 0 || p[1] >= self.height as i32 { return }
    self.data[p[1] as usize * self.width + p[0] as usize] = v;
  }

  pub fn draw_square(&mut self, p: &Vector2i, v: u32, r: i32) {
    for z in (-r)..(r+1) {
      self.draw_pixel(&(p + Vector2i::new(z, -r)), v);
      self.draw_pixel(&(p + Vector2i::new(z, r)), v);
      self.draw_pixel(&(p + Vector2i::new(-r, z)), v);
      self.draw_pixel(&(p + Vector2i::new(r, z)), v);
    }
  }

  pub fn draw_line(&mut self, mut p0: Vector2i, mut p1: Vector2i, v: u32) {
    let dx = p1[0] - p0[0];
    let dy = p1[1] - p0[1];
    if dx == 0 && dy == 0 {
      self.draw_pixel(&p0, v);
    }
    else if dx.abs() < dy.abs() {
      if p0[1] > p1[1] { (p0, p1) = (p1, p0); }
      let k = dx as f32 / dy as f32;
      for y in p0[1] ..= p1[1] {
        let x = p0[0] + (k * (y - p0[1]) as f32).round() as i32;
        self.draw_pixel(&Vector2i::new(x, y), v);
      }
    }
    else {
      if p0[0] > p1[0] { (p0, p1) = (p1, p0); }
      let k = dy as f32 / dx as f32;
      for x in p0[0] ..= p1[0] {
        let y = p0[1] + (k * (x - p0[0]) as f32).round() as i32;
        self.draw_pixel(&Vector2i::new(x, y), v);
      }
    }
  }

  pub fn draw_frame(&mut self, frame: &VideoFrame) {
    for y in 0..usize::min(frame.height, self.height) {
      for x in 0..usize::min(frame.width, self.width) {
        self.data[y * self.width + x] = frame.rgb_u32(x, y);
      }
    }
  }

  pub fn overlay(&mut self, other: &Canvas) {
    assert_eq!(self.width, other.width);
    assert_eq!(self.height, other.height);
    for (v, o) in self.data.iter_mut().zip(&other.data) {
      if *o != 0 { *v = *o }
    }
  }

  pub fn draw_polyline<'a>(&mut self, points: impl IntoIterator<Item = &'a Vector2d>, v: u32) {
    let mut previous: Option<Vector2i> = None;
    for p in points {
      let p = from_f64(p);
      if let Some(q) = previous {
        self.draw_line(q, p, v);
      }
      previous = Some(p);
    }
  }
}

// Head motion of every trajectory accumulated over the whole run, beyond the
// trajectory length. Owned by the caller, not the tracker.
pub struct HistoryCanvas {
  pub canvas: Canvas,
}

impl HistoryCanvas {
  pub fn new(width: usize, height: usize) -> HistoryCanvas {
    HistoryCanvas { canvas: Canvas::new(width, height) }
  }

  pub fn record(&mut self, trajectories: &[Trajectory]) {
    for t in trajectories {
      let points = t.points();
      if points.len() < 2 { continue }
      let n = points.len();
      self.canvas.draw_line(from_f64(&points[n - 2]), from_f64(&points[n - 1]), palette_color(t.id));
    }
  }

  pub fn clear(&mut self) {
    self.canvas.clear();
  }
}

pub struct VisualizeArgs<'a> {
  pub canvas: &'a mut Canvas,
  pub frame: &'a VideoFrame,
  pub trajectories: &'a [Trajectory],
  pub mask: Option<&'a ExclusionMask>,
  pub history: Option<&'a HistoryCanvas>,
  // Manual mode trail, newest last.
  pub selection: Option<&'a VecDeque<Vector2d>>,
}

pub fn visualize(args: &mut VisualizeArgs) {
  args.canvas.clear();
  args.canvas.draw_frame(args.frame);

  if let Some(mask) = args.mask {
    for y in 0..usize::min(mask.height, args.canvas.height) {
      for x in 0..usize::min(mask.width, args.canvas.width) {
        if !mask.is_excluded(x, y) { continue }
        args.canvas.data[y * args.canvas.width + x] |= MASK_COLOR;
      }
    }
  }

  if let Some(history) = args.history {
    args.canvas.overlay(&history.canvas);
  }

  for t in args.trajectories {
    let color = palette_color(t.id);
    args.canvas.draw_polyline(t.points(), color);
    args.canvas.draw_square(&from_f64(&t.head()), color, 2);
  }

  if let Some(trail) = args.selection {
    args.canvas.draw_polyline(trail, SELECTION_COLOR);
    if let Some(p) = trail.back() {
      args.canvas.draw_square(&from_f64(p), SELECTION_COLOR, 5);
    }
  }
}

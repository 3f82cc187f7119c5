use crate::all::*;

// One estimated position per seed, in seed order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowEstimate {
  pub points: Vec<Vector2d>,
  pub found: Vec<bool>,
}

impl FlowEstimate {
  pub fn clear(&mut self) {
    self.points.clear();
    self.found.clear();
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }
}

// Sparse flow between two frames of identical size. A point that cannot be
// tracked is reported with `found == false`, it never fails the batch.
pub trait FlowEstimator {
  fn estimate(
    &mut self,
    origin: &Frame,
    target: &Frame,
    seeds: &[Vector2d],
    out: &mut FlowEstimate,
  );
}

impl FlowEstimator for OpticalFlow {
  fn estimate(
    &mut self,
    origin: &Frame,
    target: &Frame,
    seeds: &[Vector2d],
    out: &mut FlowEstimate,
  ) {
    assert_eq!(origin.width(), target.width());
    assert_eq!(origin.height(), target.height());
    self.process(origin, target, seeds, &mut out.points, &mut out.found);
  }
}

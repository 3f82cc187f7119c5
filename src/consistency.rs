// Forward-backward check: a point tracked from frame A to B and back should
// land where it started.

use crate::all::*;

#[derive(Clone, Debug)]
pub struct ConsistencyFilter {
  threshold: f64,
}

// Chebyshev distance between a seed and its back-projection.
pub fn round_trip_error(seed: &Vector2d, back_projected: &Vector2d) -> f64 {
  f64::max((back_projected[0] - seed[0]).abs(), (back_projected[1] - seed[1]).abs())
}

impl ConsistencyFilter {
  pub fn new(threshold: f64) -> ConsistencyFilter {
    ConsistencyFilter { threshold }
  }

  pub fn validate(
    &self,
    seeds: &[Vector2d],
    forward: &FlowEstimate,
    backward: &FlowEstimate,
  ) -> Vec<bool> {
    assert_eq!(seeds.len(), forward.len());
    assert_eq!(seeds.len(), backward.len());
    seeds.iter().enumerate().map(|(i, seed)| {
      forward.found[i]
        && backward.found[i]
        && round_trip_error(seed, &backward.points[i]) < self.threshold
    }).collect()
  }
}

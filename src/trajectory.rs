use crate::all::*;

// Creation index of a trajectory, unique within one store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub usize);

// Positions of one tracked feature, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
  pub id: TrackId,
  points: VecDeque<Vector2d>,
}

impl Trajectory {
  pub fn new(id: TrackId, point: Vector2d) -> Trajectory {
    Trajectory {
      id,
      points: VecDeque::from(vec![point]),
    }
  }

  pub fn points(&self) -> &VecDeque<Vector2d> {
    &self.points
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  // A trajectory always holds at least one point.
  pub fn head(&self) -> Vector2d {
    self.points[self.points.len() - 1]
  }

  // Evicts the oldest points beyond `max_len`.
  fn push(&mut self, point: Vector2d, max_len: usize) {
    self.points.push_back(point);
    while self.points.len() > max_len {
      self.points.pop_front();
    }
  }
}

// Sole owner of the active trajectories.
pub struct TrajectoryStore {
  trajectory_len: usize,
  trajectories: Vec<Trajectory>,
  next_id: usize,
}

impl TrajectoryStore {
  pub fn new(trajectory_len: usize) -> TrajectoryStore {
    assert!(trajectory_len >= 1);
    TrajectoryStore {
      trajectory_len,
      trajectories: vec![],
      next_id: 0,
    }
  }

  pub fn trajectories(&self) -> &[Trajectory] {
    &self.trajectories
  }

  pub fn len(&self) -> usize {
    self.trajectories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.trajectories.is_empty()
  }

  pub fn heads(&self, out: &mut Vec<Vector2d>) {
    out.clear();
    out.extend(self.trajectories.iter().map(|t| t.head()));
  }

  // Drops every trajectory whose flag is false and extends the others with the
  // position of the same index. Returns the number of dropped trajectories.
  pub fn update(&mut self, valid: &[bool], new_positions: &[Vector2d]) -> usize {
    assert_eq!(valid.len(), self.trajectories.len());
    assert_eq!(new_positions.len(), self.trajectories.len());
    let before = self.trajectories.len();
    let max_len = self.trajectory_len;
    let mut i = 0;
    self.trajectories.retain_mut(|trajectory| {
      let keep = valid[i];
      if keep {
        trajectory.push(new_positions[i], max_len);
      }
      i += 1;
      keep
    });
    before - self.trajectories.len()
  }

  // Starts one single-point trajectory per point.
  pub fn seed(&mut self, points: &[Vector2d]) {
    for point in points {
      self.trajectories.push(Trajectory::new(TrackId(self.next_id), *point));
      self.next_id += 1;
    }
  }
}

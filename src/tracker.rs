use crate::all::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
  // No frame seen yet.
  Uninitialized,
  Tracking,
}

// Read-only view of the active trajectories after a tick.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
  pub frame_count: usize,
  pub trajectories: &'a [Trajectory],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
  pub tracked: usize,
  pub lost: usize,
  pub seeded: usize,
}

// Forward-backward Lucas-Kanade tracking with periodic replenishment.
pub struct TrackingEngine<F = OpticalFlow, D = ShiTomasiDetector> {
  config: TrackerConfig,
  flow: F,
  detector: D,
  consistency: ConsistencyFilter,
  store: TrajectoryStore,
  previous_frame: Option<Frame>,
  unused_frame: Option<Frame>,
  frame_index: usize,
  mask: ExclusionMask,
  last_step: StepStats,
  tmp: Tmp,
}

#[derive(Default)]
struct Tmp {
  seeds: Vec<Vector2d>,
  forward: FlowEstimate,
  backward: FlowEstimate,
  detections: Vec<Vector2d>,
}

impl TrackingEngine {
  pub fn new(config: TrackerConfig) -> Result<TrackingEngine> {
    let flow = OpticalFlow::new(&config.flow)?;
    let detector = ShiTomasiDetector::new(&config.detector)?;
    TrackingEngine::with_components(config, flow, detector)
  }
}

impl<F: FlowEstimator, D: FeatureDetector> TrackingEngine<F, D> {
  pub fn with_components(config: TrackerConfig, flow: F, detector: D) -> Result<TrackingEngine<F, D>> {
    config.validate().context("Invalid tracker configuration.")?;
    Ok(TrackingEngine {
      consistency: ConsistencyFilter::new(config.validity_threshold_px),
      store: TrajectoryStore::new(config.trajectory_len),
      config,
      flow,
      detector,
      previous_frame: None,
      unused_frame: None,
      frame_index: 0,
      mask: ExclusionMask::default(),
      last_step: StepStats::default(),
      tmp: Tmp::default(),
    })
  }

  // Frames must be given in temporal order.
  pub fn step(&mut self, video_frame: &VideoFrame) -> Result<Snapshot> {
    if let Some(previous) = &self.previous_frame {
      if previous.width() != video_frame.width || previous.height() != video_frame.height {
        bail!(
          "Frame size changed from {}x{} to {}x{}.",
          previous.width(), previous.height(), video_frame.width, video_frame.height,
        );
      }
    }
    let mut unused_frame = self.unused_frame.take();
    let mut image = unused_frame.as_mut()
      .map(|f| mem::replace(&mut f.image, Image::empty()))
      .unwrap_or_else(Image::empty);
    video_frame.to_gray(&mut image)?;
    let frame = Frame::new(image, unused_frame, &self.config.flow);

    let mut stats = StepStats::default();
    let t = &mut self.tmp;
    if let Some(previous) = &self.previous_frame {
      if !self.store.is_empty() {
        self.store.heads(&mut t.seeds);
        self.flow.estimate(previous, &frame, &t.seeds, &mut t.forward);
        self.flow.estimate(&frame, previous, &t.forward.points, &mut t.backward);
        let valid = self.consistency.validate(&t.seeds, &t.forward, &t.backward);
        stats.lost = self.store.update(&valid, &t.forward.points);
        stats.tracked = self.store.len();
      }
    }

    if self.frame_index % self.config.detect_interval == 0 {
      self.store.heads(&mut t.seeds);
      let radius = self.config.exclusion_radius_px;
      self.mask.build(frame.width(), frame.height(), &t.seeds, radius);
      self.detector.detect(&frame, &self.mask, self.config.detector.max_corners, &mut t.detections);
      let seeds = &t.seeds;
      let detected = t.detections.len();
      t.detections.retain(|p| seeds.iter().all(|head| (p - head).norm() > radius));
      if t.detections.len() < detected {
        debug!("Discarded {} detections next to existing trajectories.", detected - t.detections.len());
      }
      self.store.seed(&t.detections);
      stats.seeded = t.detections.len();
    }

    debug!(
      "Frame {}: {} tracked, {} lost, {} seeded.",
      self.frame_index, stats.tracked, stats.lost, stats.seeded,
    );
    self.last_step = stats;
    self.frame_index += 1;
    self.unused_frame = self.previous_frame.replace(frame);
    Ok(self.snapshot())
  }

  pub fn snapshot(&self) -> Snapshot {
    Snapshot {
      frame_count: self.frame_index,
      trajectories: self.store.trajectories(),
    }
  }

  pub fn state(&self) -> EngineState {
    if self.previous_frame.is_some() { EngineState::Tracking } else { EngineState::Uninitialized }
  }

  pub fn frame_index(&self) -> usize {
    self.frame_index
  }

  pub fn trajectories(&self) -> &[Trajectory] {
    self.store.trajectories()
  }

  // Mask used by the most recent detection.
  pub fn exclusion_mask(&self) -> &ExclusionMask {
    &self.mask
  }

  pub fn last_step(&self) -> StepStats {
    self.last_step
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use std::rc::Rc;

  // Replays prepared estimates. Without a script every point stays put.
  #[derive(Default)]
  struct ScriptedFlow {
    script: VecDeque<FlowEstimate>,
    seeds: Rc<RefCell<Vec<Vec<Vector2d>>>>,
  }

  impl FlowEstimator for ScriptedFlow {
    fn estimate(&mut self, _: &Frame, _: &Frame, seeds: &[Vector2d], out: &mut FlowEstimate) {
      self.seeds.borrow_mut().push(seeds.to_vec());
      *out = self.script.pop_front().unwrap_or_else(|| FlowEstimate {
        points: seeds.to_vec(),
        found: vec![true; seeds.len()],
      });
      assert_eq!(out.len(), seeds.len());
    }
  }

  #[derive(Default)]
  struct ScriptedDetector {
    script: VecDeque<Vec<Vector2d>>,
    calls: Rc<RefCell<usize>>,
  }

  impl FeatureDetector for ScriptedDetector {
    fn detect(&mut self, _: &Frame, _: &ExclusionMask, max_count: usize, detections: &mut Vec<Vector2d>) {
      *self.calls.borrow_mut() += 1;
      detections.clear();
      if let Some(points) = self.script.pop_front() {
        detections.extend(points.into_iter().take(max_count));
      }
    }
  }

  fn v(x: f64, y: f64) -> Vector2d {
    Vector2d::new(x, y)
  }

  fn estimate(points: &[Vector2d], found: &[bool]) -> FlowEstimate {
    FlowEstimate { points: points.to_vec(), found: found.to_vec() }
  }

  fn config(modify: impl Fn(&mut ParameterSet)) -> TrackerConfig {
    let mut p = ParameterSet::default();
    p.detect_interval = 100;
    modify(&mut p);
    TrackerConfig::new(&p).unwrap()
  }

  fn blank_frame() -> VideoFrame {
    VideoFrame { data: vec![0; 32 * 24], width: 32, height: 24, channels: 1 }
  }

  fn engine(
    config: TrackerConfig,
    flow: Vec<FlowEstimate>,
    detections: Vec<Vec<Vector2d>>,
  ) -> TrackingEngine<ScriptedFlow, ScriptedDetector> {
    let flow = ScriptedFlow { script: flow.into(), ..Default::default() };
    let detector = ScriptedDetector { script: detections.into(), ..Default::default() };
    TrackingEngine::with_components(config, flow, detector).unwrap()
  }

  fn points(t: &Trajectory) -> Vec<Vector2d> {
    t.points().iter().copied().collect()
  }

  #[test]
  fn test_first_frame_seeds_trajectories() {
    let mut engine = engine(config(|_| {}), vec![], vec![vec![v(1., 1.), v(10., 5.), v(20., 20.)]]);
    assert_eq!(engine.state(), EngineState::Uninitialized);
    let snapshot = engine.step(&blank_frame()).unwrap();
    assert_eq!(snapshot.frame_count, 1);
    assert_eq!(snapshot.trajectories.len(), 3);
    assert!(snapshot.trajectories.iter().all(|t| t.len() == 1));
    assert_eq!(engine.state(), EngineState::Tracking);
    assert!(engine.flow.seeds.borrow().is_empty());
    assert_eq!(engine.last_step(), StepStats { tracked: 0, lost: 0, seeded: 3 });
  }

  #[test]
  fn test_consistent_point_is_appended() {
    let flow = vec![
      estimate(&[v(12., 11.)], &[true]),
      estimate(&[v(10.2, 10.1)], &[true]),
    ];
    let mut engine = engine(config(|_| {}), flow, vec![vec![v(10., 10.)]]);
    engine.step(&blank_frame()).unwrap();
    let snapshot = engine.step(&blank_frame()).unwrap();
    assert_eq!(snapshot.trajectories.len(), 1);
    assert_eq!(points(&snapshot.trajectories[0]), vec![v(10., 10.), v(12., 11.)]);
    // Backward flow starts from the forward estimates.
    assert_eq!(*engine.flow.seeds.borrow(), vec![vec![v(10., 10.)], vec![v(12., 11.)]]);
  }

  #[test]
  fn test_inconsistent_point_is_dropped() {
    let flow = vec![
      estimate(&[v(12., 11.), v(30., 30.)], &[true, true]),
      estimate(&[v(15., 15.), v(20.5, 19.5)], &[true, true]),
    ];
    let mut engine = engine(config(|_| {}), flow, vec![vec![v(10., 10.), v(20., 20.)]]);
    engine.step(&blank_frame()).unwrap();
    let snapshot = engine.step(&blank_frame()).unwrap();
    assert_eq!(snapshot.trajectories.len(), 1);
    assert_eq!(snapshot.trajectories[0].id, TrackId(1));
    assert_eq!(engine.last_step(), StepStats { tracked: 1, lost: 1, seeded: 0 });
  }

  #[test]
  fn test_lost_point_is_dropped() {
    let flow = vec![
      estimate(&[v(10., 10.)], &[false]),
      estimate(&[v(10., 10.)], &[true]),
    ];
    let mut engine = engine(config(|_| {}), flow, vec![vec![v(10., 10.)]]);
    engine.step(&blank_frame()).unwrap();
    assert!(engine.step(&blank_frame()).unwrap().trajectories.is_empty());
  }

  #[test]
  fn test_overlong_trajectory_is_trimmed() {
    let mut flow = vec![];
    for k in 1..4 {
      let p = v(k as f64, k as f64);
      flow.push(estimate(&[p], &[true]));
      flow.push(estimate(&[v(k as f64 - 1., k as f64 - 1.)], &[true]));
    }
    let mut engine = engine(config(|p| p.trajectory_len = 3), flow, vec![vec![v(0., 0.)]]);
    for _ in 0..3 {
      engine.step(&blank_frame()).unwrap();
    }
    assert_eq!(points(&engine.trajectories()[0]), vec![v(0., 0.), v(1., 1.), v(2., 2.)]);
    engine.step(&blank_frame()).unwrap();
    assert_eq!(points(&engine.trajectories()[0]), vec![v(1., 1.), v(2., 2.), v(3., 3.)]);
  }

  #[test]
  fn test_detection_interval() {
    // Detection yields nothing, so the store stays empty throughout.
    let mut engine = engine(config(|p| p.detect_interval = 5), vec![], vec![]);
    let calls = engine.detector.calls.clone();
    for i in 0..5 {
      let snapshot = engine.step(&blank_frame()).unwrap();
      assert!(snapshot.trajectories.is_empty());
      assert_eq!(snapshot.frame_count, i + 1);
      assert_eq!(*calls.borrow(), 1);
    }
    assert_eq!(engine.frame_index(), 5);
    engine.step(&blank_frame()).unwrap();
    assert_eq!(*calls.borrow(), 2);
    assert!(engine.flow.seeds.borrow().is_empty());
  }

  #[test]
  fn test_replenishment_skips_tracked_regions() {
    let mut engine = engine(
      config(|p| { p.detect_interval = 2; p.exclusion_radius = 5. }),
      vec![],
      vec![vec![v(10., 10.)], vec![v(13., 13.), v(14., 10.), v(15.5, 10.)]],
    );
    engine.step(&blank_frame()).unwrap();
    engine.step(&blank_frame()).unwrap();
    engine.step(&blank_frame()).unwrap();
    let heads: Vec<_> = engine.trajectories().iter().map(|t| t.head()).collect();
    // (13, 13) and (14, 10) are within 5 pixels of the tracked point.
    assert_eq!(heads, vec![v(10., 10.), v(15.5, 10.)]);
    assert_eq!(engine.exclusion_mask().width, 32);
    assert!(engine.exclusion_mask().is_excluded(10, 10));
    assert!(!engine.exclusion_mask().is_excluded(20, 10));
  }

  #[test]
  fn test_frame_size_change_is_an_error() {
    let mut engine = engine(config(|_| {}), vec![], vec![]);
    engine.step(&blank_frame()).unwrap();
    let other = VideoFrame { data: vec![0; 100], width: 10, height: 10, channels: 1 };
    assert!(engine.step(&other).is_err());
    assert_eq!(engine.frame_index(), 1);
  }

  #[test]
  fn test_invalid_config_is_rejected() {
    let mut config = config(|_| {});
    config.validity_threshold_px = -1.;
    assert!(TrackingEngine::new(config.clone()).is_err());
    let result = TrackingEngine::with_components(config, ScriptedFlow::default(), ScriptedDetector::default());
    assert!(result.is_err());
  }

  #[test]
  fn test_tracks_synthetic_motion() {
    let config = config(|p| p.detect_interval = 5);
    let mut engine = TrackingEngine::new(config).unwrap();
    let velocity = v(1., 0.5);
    let mut input = SyntheticInput::new(9, 160, 120, velocity, 12);
    while let Some(frame) = input.next_frame().unwrap() {
      engine.step(frame).unwrap();
    }
    assert_eq!(engine.frame_index(), 12);
    let long: Vec<_> = engine.trajectories().iter().filter(|t| t.len() >= 5).collect();
    assert!(!long.is_empty());
    // Windows reaching over the image border see clamped content.
    let inside = |p: &Vector2d| p[0] >= 10. && p[0] <= 149. && p[1] >= 10. && p[1] <= 109.;
    for trajectory in long {
      let p = trajectory.points();
      for i in 1..p.len() {
        if !inside(&p[i - 1]) || !inside(&p[i]) { continue }
        assert!((p[i] - p[i - 1] - velocity).norm() < 0.25, "{:?}", p);
      }
    }
    let mut heads: Vec<Vector2d> = vec![];
    for t in engine.trajectories() {
      assert!(t.len() <= 40);
      heads.push(t.head());
    }
    assert!(heads.iter().all(|p| p[0] >= 0. && p[0] <= 159. && p[1] >= 0. && p[1] <= 119.));
  }
}

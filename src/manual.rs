// Tracks a single point chosen by the user, e.g. with a mouse click.

use crate::all::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionEvent {
  PointSelected(Vector2d),
  Cleared,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ManualState {
  Idle,
  Tracking(Vector2d),
}

pub struct ManualTracker<F = OpticalFlow> {
  flow: F,
  flow_params: FlowParams,
  state: ManualState,
  trail: VecDeque<Vector2d>,
  trail_len: usize,
  previous_frame: Option<Frame>,
  unused_frame: Option<Frame>,
  frame_count: usize,
  estimate: FlowEstimate,
}

impl ManualTracker {
  pub fn new(config: &TrackerConfig) -> Result<ManualTracker> {
    let flow = OpticalFlow::new(&config.flow)?;
    ManualTracker::with_flow(config, flow)
  }
}

impl<F: FlowEstimator> ManualTracker<F> {
  pub fn with_flow(config: &TrackerConfig, flow: F) -> Result<ManualTracker<F>> {
    config.validate()?;
    Ok(ManualTracker {
      flow,
      flow_params: config.flow.clone(),
      state: ManualState::Idle,
      trail: VecDeque::new(),
      trail_len: config.trajectory_len,
      previous_frame: None,
      unused_frame: None,
      frame_count: 0,
      estimate: FlowEstimate::default(),
    })
  }

  pub fn handle(&mut self, event: SelectionEvent) {
    self.trail.clear();
    match event {
      SelectionEvent::PointSelected(p) => {
        info!("Tracking point ({:.1}, {:.1}).", p[0], p[1]);
        self.trail.push_back(p);
        self.state = ManualState::Tracking(p);
      },
      SelectionEvent::Cleared => self.state = ManualState::Idle,
    }
  }

  // Moves the selected point into the new frame. Returns to `Idle` when the
  // point is lost.
  pub fn step(&mut self, video_frame: &VideoFrame) -> Result<ManualState> {
    if let Some(previous) = &self.previous_frame {
      if previous.width() != video_frame.width || previous.height() != video_frame.height {
        bail!("Frame size changed from {}x{} to {}x{}.",
          previous.width(), previous.height(), video_frame.width, video_frame.height);
      }
    }
    let mut unused_frame = self.unused_frame.take();
    let mut image = unused_frame.as_mut()
      .map(|f| mem::replace(&mut f.image, Image::empty()))
      .unwrap_or_else(Image::empty);
    video_frame.to_gray(&mut image)?;
    let frame = Frame::new(image, unused_frame, &self.flow_params);
    if let (ManualState::Tracking(point), Some(previous)) = (self.state, &self.previous_frame) {
      self.flow.estimate(previous, &frame, &[point], &mut self.estimate);
      if self.estimate.found[0] {
        let p = self.estimate.points[0];
        self.trail.push_back(p);
        while self.trail.len() > self.trail_len {
          self.trail.pop_front();
        }
        self.state = ManualState::Tracking(p);
      }
      else {
        info!("Lost the selected point.");
        self.trail.clear();
        self.state = ManualState::Idle;
      }
    }
    self.unused_frame = self.previous_frame.replace(frame);
    self.frame_count += 1;
    Ok(self.state)
  }

  pub fn state(&self) -> ManualState {
    self.state
  }

  pub fn frame_count(&self) -> usize {
    self.frame_count
  }

  pub fn trail(&self) -> &VecDeque<Vector2d> {
    &self.trail
  }
}

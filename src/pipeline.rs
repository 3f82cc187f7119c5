// Drives either tracker from frames and feeds the results to the output file
// and the display. Shared by the window and headless modes of the binary.

use crate::all::*;

pub enum Tracker {
  Automatic(TrackingEngine),
  Manual(ManualTracker),
}

impl Tracker {
  pub fn new(config: TrackerConfig, manual: bool) -> Result<Tracker> {
    if manual {
      Ok(Tracker::Manual(ManualTracker::new(&config)?))
    }
    else {
      Ok(Tracker::Automatic(TrackingEngine::new(config)?))
    }
  }
}

pub struct Pipeline {
  tracker: Tracker,
  output: Option<TrajectoryWriter<File>>,
  history: HistoryCanvas,
  canvas: Canvas,
  pub show_mask: bool,
  // Selections made since the last frame.
  events: Vec<SelectionEvent>,
}

impl Pipeline {
  pub fn new(
    tracker: Tracker,
    width: usize,
    height: usize,
    output: Option<TrajectoryWriter<File>>,
  ) -> Pipeline {
    Pipeline {
      tracker,
      output,
      history: HistoryCanvas::new(width, height),
      canvas: Canvas::new(width, height),
      show_mask: false,
      events: vec![],
    }
  }

  pub fn is_manual(&self) -> bool {
    matches!(self.tracker, Tracker::Manual(_))
  }

  // Applied before the next frame is tracked. Ignored by the automatic tracker.
  pub fn select(&mut self, event: SelectionEvent) {
    if self.is_manual() {
      self.events.push(event);
    }
  }

  pub fn clear_history(&mut self) {
    self.history.clear();
  }

  pub fn process(&mut self, frame: &VideoFrame) -> Result<()> {
    match &mut self.tracker {
      Tracker::Automatic(engine) => {
        let snapshot = engine.step(frame)?;
        self.history.record(snapshot.trajectories);
        if let Some(output) = &mut self.output {
          output.write(&snapshot)?;
        }
      },
      Tracker::Manual(tracker) => {
        for event in self.events.drain(..) {
          tracker.handle(event);
        }
        let state = tracker.step(frame)?;
        if let Some(output) = &mut self.output {
          output.write_manual(tracker.frame_count(), state, tracker.trail())?;
        }
      },
    }
    Ok(())
  }

  // Number of points currently followed.
  pub fn track_count(&self) -> usize {
    match &self.tracker {
      Tracker::Automatic(engine) => engine.trajectories().len(),
      Tracker::Manual(tracker) => match tracker.state() {
        ManualState::Tracking(_) => 1,
        ManualState::Idle => 0,
      },
    }
  }

  pub fn render(&mut self, frame: &VideoFrame) -> &Canvas {
    let mut args = match &self.tracker {
      Tracker::Automatic(engine) => VisualizeArgs {
        canvas: &mut self.canvas,
        frame,
        trajectories: engine.trajectories(),
        mask: if self.show_mask { Some(engine.exclusion_mask()) } else { None },
        history: Some(&self.history),
        selection: None,
      },
      Tracker::Manual(tracker) => VisualizeArgs {
        canvas: &mut self.canvas,
        frame,
        trajectories: &[],
        mask: None,
        history: None,
        selection: Some(tracker.trail()),
      },
    };
    visualize(&mut args);
    &self.canvas
  }

  pub fn finish(&mut self) -> Result<()> {
    if let Some(output) = &mut self.output {
      output.flush()?;
    }
    Ok(())
  }
}

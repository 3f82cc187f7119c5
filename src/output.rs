// JSON lines dump of the trajectories, one line per processed frame.

use crate::all::*;

use std::io::{BufWriter, Write};

#[derive(Serialize)]
struct SnapshotRecord {
  frame: usize,
  trajectories: Vec<TrajectoryRecord>,
  #[serde(skip_serializing_if = "Option::is_none")]
  selected: Option<[f64; 2]>,
}

#[derive(Serialize)]
struct TrajectoryRecord {
  id: usize,
  points: Vec<[f64; 2]>,
}

pub struct TrajectoryWriter<W: Write> {
  writer: BufWriter<W>,
}

impl TrajectoryWriter<File> {
  pub fn create(path: &Path) -> Result<TrajectoryWriter<File>> {
    let file = File::create(path)
      .context(format!("Failed to create output file {}.", path.display()))?;
    Ok(TrajectoryWriter::new(file))
  }
}

impl<W: Write> TrajectoryWriter<W> {
  pub fn new(inner: W) -> TrajectoryWriter<W> {
    TrajectoryWriter {
      writer: BufWriter::new(inner),
    }
  }

  pub fn write(&mut self, snapshot: &Snapshot) -> Result<()> {
    let record = SnapshotRecord {
      frame: snapshot.frame_count,
      trajectories: snapshot.trajectories.iter().map(|t| TrajectoryRecord {
        id: t.id.0,
        points: t.points().iter().map(|p| [p[0], p[1]]).collect(),
      }).collect(),
      selected: None,
    };
    self.write_record(&record)
  }

  // Output of the manual tracker: the trail as a single trajectory.
  pub fn write_manual(&mut self, frame: usize, tracker_state: ManualState, trail: &VecDeque<Vector2d>) -> Result<()> {
    let selected = match tracker_state {
      ManualState::Tracking(p) => Some([p[0], p[1]]),
      ManualState::Idle => None,
    };
    let record = SnapshotRecord {
      frame,
      trajectories: if trail.is_empty() { vec![] } else {
        vec![TrajectoryRecord { id: 0, points: trail.iter().map(|p| [p[0], p[1]]).collect() }]
      },
      selected,
    };
    self.write_record(&record)
  }

  fn write_record(&mut self, record: &SnapshotRecord) -> Result<()> {
    serde_json::to_writer(&mut self.writer, record).context("Failed to serialize trajectories.")?;
    self.writer.write_all(b"\n").context("Failed to write trajectories.")?;
    Ok(())
  }

  pub fn flush(&mut self) -> Result<()> {
    self.writer.flush().context("Failed to flush trajectory output.")
  }

  pub fn into_inner(self) -> Result<W> {
    self.writer.into_inner().map_err(|e| anyhow!("Failed to flush trajectory output: {}", e.error()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_write_snapshot() {
    let mut store = TrajectoryStore::new(3);
    store.seed(&[Vector2d::new(1., 2.), Vector2d::new(3.5, 4.)]);
    store.update(&[false, true], &[Vector2d::new(0., 0.), Vector2d::new(4.5, 4.25)]);
    let snapshot = Snapshot { frame_count: 7, trajectories: store.trajectories() };
    let mut writer = TrajectoryWriter::new(vec![]);
    writer.write(&snapshot).unwrap();
    writer.write(&Snapshot { frame_count: 8, trajectories: &[] }).unwrap();
    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(value, serde_json::json!({
      "frame": 7,
      "trajectories": [ { "id": 1, "points": [[3.5, 4.0], [4.5, 4.25]] } ]
    }));
    assert_eq!(lines[1], r#"{"frame":8,"trajectories":[]}"#);
  }

  #[test]
  fn test_write_manual() {
    let mut writer = TrajectoryWriter::new(vec![]);
    let trail: VecDeque<_> = vec![Vector2d::new(1., 1.), Vector2d::new(2., 1.)].into();
    writer.write_manual(3, ManualState::Tracking(Vector2d::new(2., 1.)), &trail).unwrap();
    writer.write_manual(4, ManualState::Idle, &VecDeque::new()).unwrap();
    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    let lines: Vec<_> = text.lines().collect();
    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(value["selected"], serde_json::json!([2.0, 1.0]));
    assert_eq!(value["trajectories"][0]["points"][0], serde_json::json!([1.0, 1.0]));
    assert_eq!(lines[1], r#"{"frame":4,"trajectories":[]}"#);
  }
}

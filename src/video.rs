use crate::all::*;

use std::io::ErrorKind;
use std::process::{Child, ChildStdout, Command, Stdio};

pub struct VideoInput {
  child: Child,
  child_stdout: ChildStdout,
  video_frame: VideoFrame,
}

#[derive(Deserialize)]
struct ProbeOutput {
  streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
  width: usize,
  height: usize,
}

impl VideoInput {
  pub fn new(path: &Path) -> Result<VideoInput> {
    let (width, height) = probe_dimensions(path)?;
    info!("Opened {} ({}x{}).", path.display(), width, height);
    let mut child = Command::new("ffmpeg")
      .arg("-i").arg(path)
      .args(["-f", "rawvideo", "-vcodec", "rawvideo", "-vsync", "passthrough", "-pix_fmt", "rgb24", "-"])
      .stdout(Stdio::piped())
      .stderr(Stdio::null())
      .spawn()
      .context("Failed to start ffmpeg.")?;
    let child_stdout = child.stdout.take().ok_or(anyhow!("Failed to capture ffmpeg output."))?;
    Ok(VideoInput {
      child,
      child_stdout,
      video_frame: VideoFrame {
        data: vec![0; width * height * 3],
        width,
        height,
        channels: 3,
      },
    })
  }

  pub fn width(&self) -> usize {
    self.video_frame.width
  }

  pub fn height(&self) -> usize {
    self.video_frame.height
  }
}

impl FrameSource for VideoInput {
  fn next_frame(&mut self) -> Result<Option<&VideoFrame>> {
    match self.child_stdout.read_exact(&mut self.video_frame.data) {
      Ok(()) => Ok(Some(&self.video_frame)),
      // Includes a truncated last frame.
      Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
        info!("End of video stream.");
        Ok(None)
      },
      Err(err) => Err(anyhow::Error::new(err).context("Reading bytes from video input failed.")),
    }
  }
}

impl Drop for VideoInput {
  fn drop(&mut self) {
    // The decoder may still be running if the input was not read to the end.
    let _ = self.child.kill();
    let _ = self.child.wait();
  }
}

fn probe_dimensions(path: &Path) -> Result<(usize, usize)> {
  let output = Command::new("ffprobe")
    .args(["-v", "error", "-select_streams", "v:0", "-show_entries", "stream=width,height", "-of", "json"])
    .arg(path)
    .output()
    .context("Failed to run ffprobe.")?;
  if !output.status.success() {
    bail!("ffprobe failed for {}: {}", path.display(), String::from_utf8_lossy(&output.stderr).trim());
  }
  parse_probe_output(&output.stdout)
    .context(format!("Failed to read video dimensions of {}.", path.display()))
}

fn parse_probe_output(bytes: &[u8]) -> Result<(usize, usize)> {
  let probe: ProbeOutput = serde_json::from_slice(bytes)?;
  let stream = probe.streams.first().ok_or(anyhow!("No video stream found."))?;
  if stream.width == 0 || stream.height == 0 {
    bail!("Video stream has no pixels.");
  }
  Ok((stream.width, stream.height))
}

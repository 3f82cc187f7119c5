use crate::all::*;

// Deepest pyramid accepted. Each level halves the image.
const MAX_PYRAMID_LEVELS: usize = 8;

// Every tunable of the tracker. Parsed from command line flags or loaded from
// a JSON file, then checked and converted into a `TrackerConfig`.
#[derive(Clone, Debug, Deserialize)]
#[derive(clap::Parser)]
#[serde(default)]
pub struct ParameterSet {
  // Trajectory store.
  #[clap(long, default_value = "40")]
  pub trajectory_len: usize,
  #[clap(long, default_value = "5")]
  pub detect_interval: usize,
  #[clap(long, default_value = "1.0")]
  pub validity_threshold: f64,
  #[clap(long, default_value = "5.0")]
  pub exclusion_radius: f64,

  // Shi-Tomasi corner detector.
  #[clap(long, default_value = "200")]
  pub max_corners: usize,
  #[clap(long, default_value = "0.3")]
  pub quality_level: f64,
  #[clap(long, default_value = "7.0")]
  pub min_distance: f64,
  #[clap(long, default_value = "7")]
  pub block_size: usize,

  // Pyramidal Lucas-Kanade feature tracker.
  #[clap(long, default_value = "15")]
  pub lk_win_size: usize,
  #[clap(long, default_value = "2")]
  pub lk_levels: usize,
  #[clap(long, default_value = "10")]
  pub lk_iters: usize,
  #[clap(long, default_value = "0.03")]
  pub lk_epsilon: f64,
}

impl Default for ParameterSet {
  fn default() -> ParameterSet {
    ParameterSet::parse_from(["lktrack"])
  }
}

impl ParameterSet {
  pub fn from_json_file(path: &Path) -> Result<ParameterSet> {
    let s = std::fs::read_to_string(path)
      .context(format!("Failed to read file {}.", path.display()))?;
    serde_json::from_str(&s)
      .context(format!("Failed to parse {}.", path.display()))
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowParams {
  // Side of the square integration window, in pixels.
  pub win_size: usize,
  // Number of downscaled levels used on top of the full resolution image.
  pub pyramid_levels: usize,
  pub max_iterations: usize,
  // Iterations on a level stop when the update is shorter than this (pixels).
  pub epsilon: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectorParams {
  pub max_corners: usize,
  // Minimum accepted response relative to the strongest corner.
  pub quality_level: f64,
  pub min_distance: f64,
  pub block_size: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
  pub trajectory_len: usize,
  pub detect_interval: usize,
  pub validity_threshold_px: f64,
  pub exclusion_radius_px: f64,
  pub detector: DetectorParams,
  pub flow: FlowParams,
}

impl TrackerConfig {
  pub fn new(p: &ParameterSet) -> Result<TrackerConfig> {
    let config = TrackerConfig {
      trajectory_len: p.trajectory_len,
      detect_interval: p.detect_interval,
      validity_threshold_px: p.validity_threshold,
      exclusion_radius_px: p.exclusion_radius,
      detector: DetectorParams {
        max_corners: p.max_corners,
        quality_level: p.quality_level,
        min_distance: p.min_distance,
        block_size: p.block_size,
      },
      flow: FlowParams {
        win_size: p.lk_win_size,
        pyramid_levels: p.lk_levels,
        max_iterations: p.lk_iters,
        epsilon: p.lk_epsilon,
      },
    };
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.trajectory_len < 1 {
      bail!("Trajectory length must be at least 1.");
    }
    if self.detect_interval < 1 {
      bail!("Detection interval must be at least 1 frame.");
    }
    if !(self.validity_threshold_px.is_finite() && self.validity_threshold_px > 0.) {
      bail!("Validity threshold must be a positive number of pixels, got {}.", self.validity_threshold_px);
    }
    if !(self.exclusion_radius_px.is_finite() && self.exclusion_radius_px >= 0.) {
      bail!("Exclusion radius must be a non-negative number of pixels, got {}.", self.exclusion_radius_px);
    }
    self.detector.validate()?;
    self.flow.validate()
  }
}

impl DetectorParams {
  pub fn validate(&self) -> Result<()> {
    if self.max_corners < 1 {
      bail!("Maximum corner count must be at least 1.");
    }
    if !(self.quality_level > 0. && self.quality_level <= 1.) {
      bail!("Corner quality level must be in (0, 1], got {}.", self.quality_level);
    }
    if !(self.min_distance.is_finite() && self.min_distance >= 0.) {
      bail!("Minimum corner distance must be non-negative, got {}.", self.min_distance);
    }
    if self.block_size % 2 != 1 || self.block_size < 3 {
      bail!("Corner block size must be an odd number of at least 3, got {}.", self.block_size);
    }
    Ok(())
  }
}

impl FlowParams {
  pub fn validate(&self) -> Result<()> {
    if self.win_size % 2 != 1 {
      bail!("Lucas-Kanade window size must be odd number.");
    }
    if self.win_size < 3 {
      bail!("Lucas-Kanade window size must be at least 3.");
    }
    if self.pyramid_levels > MAX_PYRAMID_LEVELS {
      bail!("Lucas-Kanade pyramid can have at most {} levels.", MAX_PYRAMID_LEVELS);
    }
    if self.max_iterations < 1 {
      bail!("Lucas-Kanade needs at least one iteration.");
    }
    if !(self.epsilon.is_finite() && self.epsilon >= 0.) {
      bail!("Lucas-Kanade epsilon must be non-negative, got {}.", self.epsilon);
    }
    Ok(())
  }
}

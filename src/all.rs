// NOTE This kind of import-all file isn't a common Rust idiom.

pub use crate::{
  consistency::*,
  detector::*,
  flow_estimator::*,
  frame::*,
  image::*,
  input::*,
  manual::*,
  optical_flow::*,
  output::*,
  palette::*,
  parameters::*,
  pipeline::*,
  pyramid::*,
  synthetic::*,
  tracker::*,
  trajectory::*,
  types::*,
  util::*,
  video::*,
  visualize::*,
};

pub use {
  std::{
    cmp::Ordering,
    collections::VecDeque,
    fs::File,
    io::Read,
    mem,
    path::{Path, PathBuf},
  },
  log::{debug, error, info, warn, LevelFilter},
  nalgebra::{dmatrix, DMatrix},
  anyhow::{anyhow, bail, Context as AnyhowContext, Result},
  serde::{Deserialize, Serialize},
  clap::Parser,
};

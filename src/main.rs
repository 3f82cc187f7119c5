mod event_loop;

use event_loop::*;
use lktrack::all::*;

use softbuffer::GraphicsContext;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit::platform::run_return::EventLoopExtRunReturn;

// Size and motion of the scene used when no video is given.
const SYNTHETIC_WIDTH: usize = 640;
const SYNTHETIC_HEIGHT: usize = 480;
const SYNTHETIC_SEED: u64 = 1;

#[derive(Parser)]
#[clap(about = "Sparse forward-backward Lucas-Kanade point tracking")]
struct Args {
  // Video file. A moving synthetic scene is used when omitted.
  #[clap(short, long)]
  input: Option<PathBuf>,
  #[clap(long, default_value = "300")]
  synthetic_frames: usize,
  // JSON file of parameters. Replaces the parameter flags.
  #[clap(long)]
  parameters: Option<PathBuf>,
  // Write the trajectories of every frame as JSON lines.
  #[clap(long)]
  output: Option<PathBuf>,
  #[clap(long)]
  headless: bool,
  // Track a single point selected with the mouse.
  #[clap(long)]
  manual: bool,
  #[clap(long)]
  show_mask: bool,
  #[clap(short, long)]
  verbose: bool,
  #[clap(flatten)]
  parameter_set: ParameterSet,
}

fn handle_error(err: &anyhow::Error) {
  for (i, e) in err.chain().enumerate() {
    println!("  {}: {}", i + 1, e);
  }
}

fn main() {
  if let Err(err) = run() {
    handle_error(&err);
    std::process::exit(1);
  }
}

fn run() -> Result<()> {
  let args = Args::parse();
  init_logging(args.verbose);

  let parameter_set = match &args.parameters {
    Some(path) => ParameterSet::from_json_file(path)?,
    None => args.parameter_set.clone(),
  };
  let config = TrackerConfig::new(&parameter_set)?;

  let (mut input, width, height) = match &args.input {
    Some(path) => {
      let video = VideoInput::new(path)?;
      let (width, height) = (video.width(), video.height());
      (Box::new(video) as Box<dyn FrameSource>, width, height)
    },
    None => {
      info!("No input given, tracking a synthetic scene of {} frames.", args.synthetic_frames);
      let velocity = Vector2d::new(1.5, 0.75);
      let synthetic = SyntheticInput::new(
        SYNTHETIC_SEED, SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, velocity, args.synthetic_frames);
      (Box::new(synthetic) as Box<dyn FrameSource>, SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT)
    },
  };

  let output = match &args.output {
    Some(path) => Some(TrajectoryWriter::create(path)?),
    None => None,
  };
  let tracker = Tracker::new(config, args.manual)?;
  let mut pipeline = Pipeline::new(tracker, width, height, output);
  pipeline.show_mask = args.show_mask;

  if args.headless {
    if args.manual { bail!("Manual tracking needs a window for selecting the point.") }
    run_headless(input.as_mut(), &mut pipeline)?;
  }
  else {
    run_window(input.as_mut(), &mut pipeline, width, height)?;
  }
  pipeline.finish()
}

fn run_headless(input: &mut dyn FrameSource, pipeline: &mut Pipeline) -> Result<()> {
  let mut frame_count = 0;
  while let Some(frame) = input.next_frame()? {
    pipeline.process(frame)?;
    frame_count += 1;
    if frame_count % 100 == 0 {
      info!("Frame {}: {} trajectories.", frame_count, pipeline.track_count());
    }
  }
  info!("Processed {} frames, {} trajectories at the end.", frame_count, pipeline.track_count());
  Ok(())
}

fn run_window(
  input: &mut dyn FrameSource,
  pipeline: &mut Pipeline,
  width: usize,
  height: usize,
) -> Result<()> {
  let size = winit::dpi::PhysicalSize::new(width as u32, height as u32);
  let mut event_loop = EventLoop::new();
  let window = WindowBuilder::new()
    .with_title("lktrack")
    .with_resizable(false)
    .with_inner_size(size)
    .with_min_inner_size(size)
    .with_max_inner_size(size)
    .build(&event_loop)
    .map_err(|err| anyhow!("Failed to create window: {}", err))?;
  let mut graphics_context = unsafe { GraphicsContext::new(window) }
    .map_err(|_| anyhow!("Failed to create graphics context."))?;

  let mut args = EventLoopArgs {
    input,
    pipeline,
    graphics_context: &mut graphics_context,
    buffer: vec![],
    cursor: Vector2d::zeros(),
    frame_count: 0,
  };

  let mut result = Ok(());
  event_loop.run_return(|event, _, control_flow| {
    if let Err(err) = handle_event(event, control_flow, &mut args) {
      result = Err(err);
      *control_flow = ControlFlow::Exit;
    }
  });
  info!("Displayed {} frames.", args.frame_count);
  result
}

use crate::all::*;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

const PALETTE_SIZE: usize = 100;
const PALETTE_SEED: u64 = 0x5eed;

lazy_static! {
  // Packed 0RGB colors, generated once from a fixed seed.
  pub static ref PALETTE: Vec<u32> = {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(PALETTE_SEED);
    (0..PALETTE_SIZE).map(|_| {
      // Keep channels bright enough to stand out from the video.
      let r: u32 = rng.gen_range(64..256);
      let g: u32 = rng.gen_range(64..256);
      let b: u32 = rng.gen_range(64..256);
      (r << 16) | (g << 8) | b
    }).collect()
  };
}

pub fn palette_color(id: TrackId) -> u32 {
  PALETTE[id.0 % PALETTE.len()]
}

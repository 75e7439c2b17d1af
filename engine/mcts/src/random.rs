//! Fast non-cryptographic random numbers for move sampling and noise.
//!
//! A 64-bit LCG whose output shift depends on the top state bits. It is much
//! cheaper than the `rand` generators and good enough for picking moves.
//! It implements [`RngCore`] so `rand_distr` distributions can sample from it.

use rand::{Error, RngCore, SeedableRng};

const K_M: u64 = 0x9b60_9334_58e1_7d7d;
const K_A: u64 = 0xd737_232e_eccd_f7ed;

#[derive(Debug, Clone)]
pub struct FastRng {
    state: u64,
}

impl FastRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(K_M).wrapping_add(K_A);
        (self.state >> (29 - (self.state >> 61))) as u32
    }

    #[inline]
    pub fn next_bool(&mut self) -> bool {
        (self.step() & 4) == 4
    }

    /// Uniform integer in `[0, range)`. `range` must be positive.
    #[inline]
    pub fn next_below(&mut self, range: u32) -> u32 {
        self.step() % range
    }

    /// Uniform float in `[0, 1)`.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        unit_f32(self.step())
    }

    /// Uniform float in `[a, b)`.
    #[inline]
    pub fn next_f32_range(&mut self, a: f32, b: f32) -> f32 {
        self.next_f32() * (b - a) + a
    }

    /// Independent generator seeded from this one's stream.
    pub fn split(&mut self) -> FastRng {
        FastRng::new(self.next_u64())
    }
}

/// Top 24 bits of `x` scaled into `[0, 1)`; every result is exact in f32.
#[inline]
fn unit_f32(x: u32) -> f32 {
    (x >> 8) as f32 * (1.0 / 16_777_216.0)
}

impl RngCore for FastRng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.step() as u64;
        let lo = self.step() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }
}

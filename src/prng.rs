//! PCG32 pseudorandom number generator (PCG-XSH-RR).
//!
//! Every consumer of randomness (scatter, proposal sampling, acceptance
//! draws, visit order) takes a `&mut Pcg32` explicitly, so a run is fully
//! determined by its seed.

const MULTIPLIER: u64 = 6_364_136_223_846_793_005;

#[derive(Debug, Clone)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    pub fn new(seed: u64, seq: u64) -> Self {
        let inc = (seq << 1) | 1;
        let mut rng = Pcg32 { state: 0, inc };
        rng.advance();
        rng.state = rng.state.wrapping_add(seed);
        rng.advance();
        rng
    }

    /// Stream 0 for `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(seed, 0)
    }

    fn advance(&mut self) {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(self.inc);
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.advance();
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        (xorshifted >> rot) | (xorshifted << (rot.wrapping_neg() & 31))
    }

    /// Uniform in [0, 1).
    pub fn next_float(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Uniform in [-1, 1).
    pub fn next_signed(&mut self) -> f64 {
        2.0 * self.next_float() - 1.0
    }

    /// Uniform index in `0..n` (multiply-shift, no modulo bias worth
    /// caring about for small `n`). Panics if `n == 0`.
    pub fn next_index(&mut self, n: usize) -> usize {
        assert!(n > 0, "next_index on empty range");
        ((self.next_u32() as u64 * n as u64) >> 32) as usize
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }

    /// Uniformly random permutation of `0..n`.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut seq: Vec<usize> = (0..n).collect();
        self.shuffle(&mut seq);
        seq
    }
}

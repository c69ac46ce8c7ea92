//! Per-call pixel noise for canvas and WebGL read-back.
//!
//! The red channel of every N-th pixel has its least-significant bit flipped
//! with probability 1/2, freshly drawn on every call. With the default stride
//! that is at most 1 bit in every 40 bytes, invisible to a viewer, yet two
//! serializations of the same canvas almost never hash the same.

use rand::Rng;

/// Sparse least-significant-bit perturbation of RGBA buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseInjector {
    pixel_stride: usize,
}

impl NoiseInjector {
    pub const DEFAULT_PIXEL_STRIDE: usize = 10;
    const BYTES_PER_PIXEL: usize = 4;

    /// A zero stride is treated as 1.
    pub fn new(pixel_stride: usize) -> Self {
        Self {
            pixel_stride: pixel_stride.max(1),
        }
    }

    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// Perturb `rgba` in place using the thread RNG
    /// (`crypto.getRandomValues` under WASM). Returns the number of bytes changed.
    pub fn perturb(&self, rgba: &mut [u8]) -> usize {
        self.perturb_with(rgba, &mut rand::thread_rng())
    }

    /// Perturb `rgba` in place with an explicit randomness source.
    pub fn perturb_with<R: Rng + ?Sized>(&self, rgba: &mut [u8], rng: &mut R) -> usize {
        let step = self.pixel_stride * Self::BYTES_PER_PIXEL;
        let mut changed = 0;
        // Trailing partial pixels are never touched.
        let whole = rgba.len() - rgba.len() % Self::BYTES_PER_PIXEL;
        for red in (0..whole).step_by(step) {
            if rng.gen::<bool>() {
                rgba[red] ^= 1;
                changed += 1;
            }
        }
        changed
    }
}

impl Default for NoiseInjector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PIXEL_STRIDE)
    }
}

//! A reseedable pseudo-random generator chained through Skein.
//!
//! The state is one native-width seed. Reseeding hashes `seed ‖ entropy`
//! back into the seed; drawing `n` bytes hashes the seed out to
//! `STATE_BYTES + n` bytes, of which the first `STATE_BYTES` become the
//! next seed and the rest are returned. Every scratch buffer is wiped
//! before the call returns.

use zeroize::{Zeroize, Zeroizing};

use crate::crypto::skein::Skein;
use crate::error::Result;
use crate::utils::{load_words_le, store_words_le};

/// Skein-based CSPRNG. `N` is the state width in 64-bit words.
pub struct SkeinPrng<const N: usize> {
    skein: Skein<N>,
    seed: [u64; N],
}

impl<const N: usize> SkeinPrng<N> {
    /// Seed width in bytes.
    pub const STATE_BYTES: usize = N * 8;

    /// Create a generator with an all-zero seed. Callers must reseed before
    /// drawing anything secret.
    pub fn new() -> Self {
        Self {
            skein: Skein::new(),
            seed: [0; N],
        }
    }

    /// Create a generator seeded from the operating system.
    pub fn from_os_entropy() -> Result<Self> {
        let mut prng = Self::new();
        let mut fresh = Zeroizing::new(vec![0u8; Self::STATE_BYTES]);
        getrandom::getrandom(&mut fresh).map_err(std::io::Error::from)?;
        prng.reseed(&fresh);
        Ok(prng)
    }

    /// Fold `entropy` into the seed.
    pub fn reseed(&mut self, entropy: &[u8]) {
        let mut buf = Zeroizing::new(vec![0u8; Self::STATE_BYTES + entropy.len()]);
        store_words_le(&mut buf[..Self::STATE_BYTES], &self.seed);
        buf[Self::STATE_BYTES..].copy_from_slice(entropy);
        let mut next = Zeroizing::new(vec![0u8; Self::STATE_BYTES]);
        self.skein.hash_native(&mut next, &buf);
        load_words_le(&mut self.seed, &next);
    }

    /// Fill `out` with pseudo-random bytes, advancing the seed.
    pub fn fill(&mut self, out: &mut [u8]) {
        let mut seed_bytes = Zeroizing::new(vec![0u8; Self::STATE_BYTES]);
        store_words_le(&mut seed_bytes, &self.seed);
        let mut buf = Zeroizing::new(vec![0u8; Self::STATE_BYTES + out.len()]);
        self.skein.hash(&mut buf, &seed_bytes);
        load_words_le(&mut self.seed, &buf[..Self::STATE_BYTES]);
        out.copy_from_slice(&buf[Self::STATE_BYTES..]);
    }
}

impl<const N: usize> Default for SkeinPrng<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Drop for SkeinPrng<N> {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SkeinPrng::<8>::new();
        let mut b = SkeinPrng::<8>::new();
        a.reseed(b"fixed seed material");
        b.reseed(b"fixed seed material");

        let mut x = [0u8; 100];
        let mut y = [0u8; 100];
        a.fill(&mut x);
        b.fill(&mut y);
        assert_eq!(x, y);
    }

    #[test]
    fn stream_advances_between_draws() {
        let mut prng = SkeinPrng::<8>::new();
        prng.reseed(b"seed");
        let mut x = [0u8; 64];
        let mut y = [0u8; 64];
        prng.fill(&mut x);
        prng.fill(&mut y);
        assert_ne!(x, y);
    }

    #[test]
    fn reseed_diverges_streams() {
        let mut a = SkeinPrng::<8>::new();
        let mut b = SkeinPrng::<8>::new();
        a.reseed(b"one");
        b.reseed(b"two");
        let mut x = [0u8; 64];
        let mut y = [0u8; 64];
        a.fill(&mut x);
        b.fill(&mut y);
        assert_ne!(x, y);
    }
}

//! Catena-style memory-hard password hashing.
//!
//! The derivation builds a graph of `2^g` hash words for each garlic `g`
//! from `g_low` to `g_high`, hardens it with an optional salt-seeded
//! random-edge pass (gamma) and a bit-reversal hashing pass, and optionally
//! finishes each garlic with a sequential mixing pass (phi). The rolling
//! accumulator between garlics is one hash word.
//!
//! Timing scales with `2^g_high`; memory with `2^g_high` hash words. The
//! only recoverable failure is graph allocation.

use zeroize::{Zeroize, Zeroizing};

use crate::crypto::skein::Skein;
use crate::error::{Error, Result};
use crate::utils::read_le_u64;

/// Domain byte bound into the tweak block: key derivation.
const DOMAIN_KDF: u8 = 0x01;

/// Cost parameters and hardening switches, fixed per derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatenaParams {
    /// Log2 of the smallest graph, in hash words. At least 1.
    pub g_low: u8,
    /// Log2 of the largest graph, in hash words. At most 63.
    pub g_high: u8,
    /// Passes of bit-reversal hashing per graph. At least 1.
    pub lambda: u8,
    /// Salt-seeded random-edge hardening.
    pub use_gamma: bool,
    /// Sequential-mixing finale.
    pub use_phi: bool,
}

impl CatenaParams {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.g_low < 1 {
            return Err(Error::BadParams("memory cost must be at least 1"));
        }
        if self.g_low > self.g_high {
            return Err(Error::BadParams("lower memory cost exceeds upper"));
        }
        if self.g_high > 63 {
            return Err(Error::BadParams("memory cost exceeds 63"));
        }
        if self.lambda < 1 {
            return Err(Error::BadParams("time cost must be at least 1"));
        }
        Ok(())
    }
}

/// Derive one native-width hash word from a password.
///
/// `out` and `version_id` must be `N * 8` bytes; `salt` must be a non-empty
/// multiple of eight bytes. The password buffer is wiped as soon as it has
/// been absorbed, regardless of outcome.
pub fn derive<const N: usize>(
    out: &mut [u8],
    password: &mut [u8],
    salt: &[u8],
    version_id: &[u8],
    params: &CatenaParams,
) -> Result<()> {
    let sb = N * 8;
    debug_assert_eq!(out.len(), sb);
    debug_assert_eq!(version_id.len(), sb);
    if salt.is_empty() || salt.len() % 8 != 0 || salt.len() > u16::MAX as usize {
        password.zeroize();
        return Err(Error::BadParams("salt length must be a small multiple of 8"));
    }
    if let Err(e) = params.validate() {
        password.zeroize();
        return Err(e);
    }

    let graph_bytes = (1u64 << params.g_high)
        .checked_mul(sb as u64)
        .and_then(|b| usize::try_from(b).ok())
        .ok_or(Error::Alloc)?;
    let mut graph: Vec<u8> = Vec::new();
    if graph.try_reserve_exact(graph_bytes).is_err() {
        password.zeroize();
        return Err(Error::Alloc);
    }
    graph.resize(graph_bytes, 0);

    let mut kdf = Kdf::<N> {
        skein: Skein::new(),
        graph,
        x: vec![0; sb],
        t: vec![0; 3 * sb],
        pair: vec![0; 2 * sb],
        word: vec![0; sb],
        rng: vec![0; (salt.len() + 1).max(sb + 16)],
        salt: salt.to_vec(),
        lambda: params.lambda,
        use_gamma: params.use_gamma,
        use_phi: params.use_phi,
    };

    // Tweak block ‖ password ‖ salt seeds the accumulator.
    let mut seed = Zeroizing::new(Vec::with_capacity(sb + 6 + password.len() + salt.len()));
    seed.extend_from_slice(version_id);
    seed.push(DOMAIN_KDF);
    seed.push(params.lambda);
    seed.extend_from_slice(&(sb as u16).to_le_bytes());
    seed.extend_from_slice(&(salt.len() as u16).to_le_bytes());
    seed.extend_from_slice(password);
    password.zeroize();
    seed.extend_from_slice(salt);
    kdf.skein.hash_native(&mut kdf.x, &seed);
    drop(seed);

    kdf.flap((params.g_low + 1) / 2);
    kdf.rehash_x();

    for g in params.g_low..=params.g_high {
        kdf.flap(g);
        // x <- H(g ‖ x)
        kdf.pair[0] = g;
        kdf.pair[1..=sb].copy_from_slice(&kdf.x);
        kdf.skein.hash_native(&mut kdf.x, &kdf.pair[..sb + 1]);
    }

    out.copy_from_slice(&kdf.x);
    Ok(())
}

/// Working set for one derivation. Wiped on drop.
struct Kdf<const N: usize> {
    skein: Skein<N>,
    graph: Vec<u8>,
    /// Rolling accumulator between garlics.
    x: Vec<u8>,
    /// Three word registers for graph seeding.
    t: Vec<u8>,
    /// Contiguous two-word hash input.
    pair: Vec<u8>,
    /// One-word hash output slot.
    word: Vec<u8>,
    /// Gamma RNG state.
    rng: Vec<u8>,
    salt: Vec<u8>,
    lambda: u8,
    use_gamma: bool,
    use_phi: bool,
}

impl<const N: usize> Kdf<N> {
    const SB: usize = N * 8;

    /// `word <- H(pair)` over exactly two hash words.
    fn hash_pair(&mut self) {
        self.skein.hash_native(&mut self.word, &self.pair);
    }

    /// `x <- H(x)`.
    fn rehash_x(&mut self) {
        let sb = Self::SB;
        self.pair[..sb].copy_from_slice(&self.x);
        self.skein.hash_native(&mut self.x, &self.pair[..sb]);
    }

    /// Build the `2^garlic`-word graph from the accumulator, harden it, and
    /// fold the result back into the accumulator.
    fn flap(&mut self, garlic: u8) {
        let sb = Self::SB;

        // Words {-1} and {-2}, streamed out of the accumulator.
        self.skein.hash(&mut self.t[..2 * sb], &self.x);
        // t1 <- H(t0 ‖ t1), producing word {0}.
        self.pair.copy_from_slice(&self.t[..2 * sb]);
        self.hash_pair();
        self.t[sb..2 * sb].copy_from_slice(&self.word);
        // t2 <- t0, then t0 <- H(t1 ‖ t2), producing word {1}.
        self.t.copy_within(..sb, 2 * sb);
        self.pair.copy_from_slice(&self.t[sb..3 * sb]);
        self.hash_pair();
        self.t[..sb].copy_from_slice(&self.word);

        self.graph[..sb].copy_from_slice(&self.t[sb..2 * sb]);
        self.graph[sb..2 * sb].copy_from_slice(&self.t[..sb]);

        let last = (1u64 << garlic) - 1;
        if last > 1 {
            // Words {2} and {3} by the same register scheme.
            self.pair.copy_from_slice(&self.t[..2 * sb]);
            self.hash_pair();
            self.graph[2 * sb..3 * sb].copy_from_slice(&self.word);
            self.t[sb..2 * sb].copy_from_slice(&self.word);
            self.t.copy_within(..sb, 2 * sb);
            self.pair.copy_from_slice(&self.t[sb..3 * sb]);
            self.hash_pair();
            self.t[..sb].copy_from_slice(&self.word);
            self.graph[3 * sb..4 * sb].copy_from_slice(&self.word);
        }
        // Invariant: t = [{i-1}, {i-2}, _] entering each iteration.
        for i in 4..=last {
            self.pair.copy_from_slice(&self.t[..2 * sb]);
            self.hash_pair();
            self.t.copy_within(..sb, sb);
            self.t[..sb].copy_from_slice(&self.word);
            let at = i as usize * sb;
            self.graph[at..at + sb].copy_from_slice(&self.word);
        }

        if self.use_gamma {
            self.gamma(garlic);
        }
        self.bit_reversal(garlic);
        if self.use_phi {
            self.phi(garlic);
        } else {
            let at = last as usize * sb;
            self.x.copy_from_slice(&self.graph[at..at + sb]);
        }
    }

    /// Salt-seeded random-edge pass: `2^⌈(3g+3)/4⌉` rewrites of
    /// `graph[j1] <- H(graph[j1] ‖ graph[j2])` with indices drawn from a
    /// Skein-chained RNG.
    fn gamma(&mut self, garlic: u8) {
        let sb = Self::SB;
        let shift = 64 - garlic as u32;

        self.rng[..self.salt.len()].copy_from_slice(&self.salt);
        self.rng[self.salt.len()] = garlic;
        self.skein.hash_native(&mut self.word, &self.rng[..self.salt.len() + 1]);
        self.rng[..sb].copy_from_slice(&self.word);

        let count = 1u64 << ((3 * garlic as u32 + 3) / 4);
        for _ in 0..count {
            self.pair[..sb].copy_from_slice(&self.rng[..sb]);
            self.skein.hash(&mut self.rng[..sb + 16], &self.pair[..sb]);
            let j1 = (read_le_u64(&self.rng, sb) >> shift) as usize;
            let j2 = (read_le_u64(&self.rng, sb + 8) >> shift) as usize;
            self.pair[..sb].copy_from_slice(&self.graph[j1 * sb..(j1 + 1) * sb]);
            self.pair[sb..].copy_from_slice(&self.graph[j2 * sb..(j2 + 1) * sb]);
            self.hash_pair();
            self.graph[j1 * sb..(j1 + 1) * sb].copy_from_slice(&self.word);
        }
    }

    /// `lambda` passes of in-place bit-reversal hashing; leaves the final
    /// word of the graph as the pass output.
    fn bit_reversal(&mut self, garlic: u8) {
        let sb = Self::SB;
        let m = 1u64 << garlic;
        let shift = 64 - garlic as u32;
        let last = (m - 1) as usize * sb;

        for _ in 0..self.lambda {
            self.pair[..sb].copy_from_slice(&self.graph[last..last + sb]);
            self.pair[sb..].copy_from_slice(&self.graph[..sb]);
            self.hash_pair();
            self.graph[..sb].copy_from_slice(&self.word);
            for i in 1..m {
                let rev = (i.reverse_bits() >> shift) as usize;
                let prev = (i - 1) as usize * sb;
                self.pair[..sb].copy_from_slice(&self.graph[prev..prev + sb]);
                self.pair[sb..].copy_from_slice(&self.graph[rev * sb..(rev + 1) * sb]);
                self.hash_pair();
                let at = i as usize * sb;
                self.graph[at..at + sb].copy_from_slice(&self.word);
            }
        }
    }

    /// Sequential finale: every word depends on its predecessor and one
    /// data-dependent edge; the final word becomes the accumulator.
    fn phi(&mut self, garlic: u8) {
        let sb = Self::SB;
        let last = ((1u64 << garlic) - 1) as usize;
        let shift = 64 - garlic as u32;

        let mut j = (read_le_u64(&self.graph, last * sb) >> shift) as usize;
        self.pair[..sb].copy_from_slice(&self.graph[last * sb..(last + 1) * sb]);
        self.pair[sb..].copy_from_slice(&self.graph[j * sb..(j + 1) * sb]);
        self.hash_pair();
        self.graph[..sb].copy_from_slice(&self.word);

        for i in 1..=last {
            j = (read_le_u64(&self.graph, (i - 1) * sb) >> shift) as usize;
            self.pair[..sb].copy_from_slice(&self.graph[(i - 1) * sb..i * sb]);
            self.pair[sb..].copy_from_slice(&self.graph[j * sb..(j + 1) * sb]);
            self.hash_pair();
            self.graph[i * sb..(i + 1) * sb].copy_from_slice(&self.word);
        }

        self.x.copy_from_slice(&self.graph[last * sb..(last + 1) * sb]);
    }
}

impl<const N: usize> Drop for Kdf<N> {
    fn drop(&mut self) {
        self.graph.zeroize();
        self.x.zeroize();
        self.t.zeroize();
        self.pair.zeroize();
        self.word.zeroize();
        self.rng.zeroize();
        self.salt.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: CatenaParams = CatenaParams {
        g_low: 3,
        g_high: 3,
        lambda: 1,
        use_gamma: true,
        use_phi: false,
    };

    fn derive_with(password: &[u8], salt: &[u8], params: &CatenaParams) -> [u8; 64] {
        let mut out = [0u8; 64];
        let mut pw = password.to_vec();
        derive::<8>(&mut out, &mut pw, salt, &[0u8; 64], params).unwrap();
        // The password buffer must have been wiped.
        assert!(pw.iter().all(|&b| b == 0));
        out
    }

    #[test]
    fn deterministic() {
        let a = derive_with(b"password", b"0123456789abcdef", &PARAMS);
        let b = derive_with(b"password", b"0123456789abcdef", &PARAMS);
        assert_eq!(a, b);
        assert_ne!(a, [0u8; 64]);
    }

    #[test]
    fn every_input_matters() {
        let base = derive_with(b"password", b"0123456789abcdef", &PARAMS);
        assert_ne!(base, derive_with(b"passwore", b"0123456789abcdef", &PARAMS));
        assert_ne!(base, derive_with(b"password", b"0123456789abcdeF", &PARAMS));
        for params in [
            CatenaParams { g_high: 4, ..PARAMS },
            CatenaParams { lambda: 2, ..PARAMS },
            CatenaParams { use_phi: true, ..PARAMS },
            CatenaParams { use_gamma: false, ..PARAMS },
        ] {
            assert_ne!(base, derive_with(b"password", b"0123456789abcdef", &params));
        }
    }

    #[test]
    fn minimum_costs_work() {
        let params = CatenaParams {
            g_low: 1,
            g_high: 1,
            lambda: 1,
            use_gamma: true,
            use_phi: true,
        };
        let a = derive_with(b"p", b"saltsalt", &params);
        let b = derive_with(b"p", b"saltsalt", &params);
        assert_eq!(a, b);
    }

    #[test]
    fn impossible_parameters_are_rejected() {
        let mut out = [0u8; 64];
        let cases = [
            CatenaParams { g_low: 0, ..PARAMS },
            CatenaParams { g_low: 5, g_high: 4, ..PARAMS },
            CatenaParams { g_high: 64, g_low: 1, ..PARAMS },
            CatenaParams { lambda: 0, ..PARAMS },
        ];
        for params in cases {
            let mut pw = b"pw".to_vec();
            let err = derive::<8>(&mut out, &mut pw, b"0123456789abcdef", &[0u8; 64], &params)
                .unwrap_err();
            assert!(matches!(err, Error::BadParams(_)));
        }
        let mut pw = b"pw".to_vec();
        let err = derive::<8>(&mut out, &mut pw, b"odd", &[0u8; 64], &PARAMS).unwrap_err();
        assert!(matches!(err, Error::BadParams(_)));
    }
}

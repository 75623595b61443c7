//! Skein - hashing and message authentication over [`Ubi`] chaining.
//!
//! Every operation re-initialises the chaining key, so one instance can be
//! reused for any sequence of hashes and MACs. `hash` supports arbitrary
//! output lengths (the length is bound into the configuration block);
//! `hash_native` short-circuits the configuration step with the tabulated
//! initial chaining value for the native output width and must produce the
//! same result as `hash` at that width.

use crate::crypto::threefish::SchedulePolicy;
use crate::crypto::ubi::{BlockKind, Ubi};

/// Initial chaining values for native-width output, one table per state
/// size.
const IV_256: [u64; 4] = [
    0xFC9D_A860_D048_B449,
    0x2FCA_6647_9FA7_D833,
    0xB33B_C389_6656_840F,
    0x6A54_E920_FDE8_DA69,
];

const IV_512: [u64; 8] = [
    0x4903_ADFF_749C_51CE,
    0x0D95_DE39_9746_DF03,
    0x8FD1_9341_27C7_9BCE,
    0x9A25_5629_FF35_2CB1,
    0x5DB6_2599_DF6C_A7B0,
    0xEABE_394C_A9D5_C3F4,
    0x9911_12C7_1A75_B523,
    0xAE18_A40B_660F_CC33,
];

const IV_1024: [u64; 16] = [
    0xD593_DA07_41E7_2355,
    0x15B5_E511_AC73_E00C,
    0x5180_E5AE_BAF2_C4F0,
    0x03BD_41D3_FCBC_AFAF,
    0x1CAE_C6FD_1983_A898,
    0x6E51_0B8B_CDD0_589F,
    0x77E2_BDFD_C639_4ADA,
    0xC11E_1DB5_24DC_B0A3,
    0xD6D1_4AF9_C632_9AB5,
    0x6A9B_0BFC_6EB6_7E0D,
    0x9243_C60D_CCFF_1332,
    0x1A1F_1DDE_743F_02D4,
    0x0996_753C_10ED_0BB8,
    0x6572_DD22_F2B4_969A,
    0x61FD_3062_D00A_579A,
    0x1DE0_536E_8682_E539,
];

/// Skein hash/MAC engine. `N` is the state width in 64-bit words.
pub struct Skein<const N: usize> {
    ubi: Ubi<N>,
}

impl<const N: usize> Skein<N> {
    /// Hash output width, in bytes, of [`Self::hash_native`].
    pub const STATE_BYTES: usize = N * 8;

    pub fn new() -> Self {
        // UBI rekeys the cipher on every block, so the lazy keyschedule wins.
        Self {
            ubi: Ubi::new(SchedulePolicy::OnDemand),
        }
    }

    fn native_iv() -> &'static [u64] {
        match N {
            4 => &IV_256,
            8 => &IV_512,
            _ => &IV_1024,
        }
    }

    /// Chain the 32-byte configuration block for `out_bits` of output.
    fn chain_config(&mut self, out_bits: u64) {
        let mut cfg = [0u8; 32];
        cfg[..4].copy_from_slice(b"SHA3");
        cfg[4] = 0x01;
        cfg[8..16].copy_from_slice(&out_bits.to_le_bytes());
        self.ubi.chain(BlockKind::Cfg, &cfg);
    }

    /// Hash `input`, producing `out.len()` bytes.
    ///
    /// The output length is part of the configuration, so different lengths
    /// produce unrelated digests.
    pub fn hash(&mut self, out: &mut [u8], input: &[u8]) {
        self.ubi.clear_key_state();
        self.chain_config(out.len() as u64 * 8);
        self.ubi.chain(BlockKind::Msg, input);
        self.ubi.chain_output(out);
    }

    /// Hash `input` to exactly [`Self::STATE_BYTES`] bytes via the
    /// precomputed initial chaining value.
    pub fn hash_native(&mut self, out: &mut [u8], input: &[u8]) {
        debug_assert_eq!(out.len(), Self::STATE_BYTES);
        self.ubi.set_key_state(Self::native_iv());
        self.ubi.chain(BlockKind::Msg, input);
        self.ubi.chain_output(out);
    }

    /// Authenticate `input` under `key`, producing `out.len()` bytes.
    pub fn mac(&mut self, out: &mut [u8], input: &[u8], key: &[u8]) {
        self.ubi.clear_key_state();
        self.ubi.chain(BlockKind::Key, key);
        self.chain_config(out.len() as u64 * 8);
        self.ubi.chain(BlockKind::Msg, input);
        self.ubi.chain_output(out);
    }
}

impl<const N: usize> Default for Skein<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Published Skein-512-512 digest of the empty string.
    #[test]
    fn skein512_empty_vector() {
        let mut skein = Skein::<8>::new();
        let mut out = [0u8; 64];
        skein.hash(&mut out, b"");
        assert_eq!(
            hex::encode(out),
            "bc5b4c50925519c290cc634277ae3d6257212395cba733bbad37a4af0fa06af4\
             1fca7903d06564fea7a2d3730dbdb80c1f85562dfcc070334ea4d1d9e72cba7a"
        );
    }

    /// Published Skein-512-512 digest of the single byte 0xFF.
    #[test]
    fn skein512_ff_vector() {
        let mut skein = Skein::<8>::new();
        let mut out = [0u8; 64];
        skein.hash(&mut out, &[0xFF]);
        assert_eq!(
            hex::encode(out),
            "71b7bce6fe6452227b9ced6014249e5bf9a9754c3ad618ccc4e0aae16b316cc8\
             ca698d864307ed3e80b6ef1570812ac5272dc409b5a012df2a579102f340617a"
        );
    }

    /// The IV short-circuit must agree with the full configuration path.
    #[test]
    fn native_matches_configured_hash() {
        let mut skein = Skein::<8>::new();
        for input in [&b""[..], &b"abc"[..], &[0u8; 64][..], &[0x5A; 200][..]] {
            let mut a = [0u8; 64];
            let mut b = [0u8; 64];
            skein.hash(&mut a, input);
            skein.hash_native(&mut b, input);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn native_matches_configured_hash_256_and_1024() {
        {
            let mut skein = Skein::<4>::new();
            let mut a = [0u8; 32];
            let mut b = [0u8; 32];
            skein.hash(&mut a, b"abc");
            skein.hash_native(&mut b, b"abc");
            assert_eq!(a, b);
        }
        {
            let mut skein = Skein::<16>::new();
            let mut a = [0u8; 128];
            let mut b = [0u8; 128];
            skein.hash(&mut a, b"abc");
            skein.hash_native(&mut b, b"abc");
            assert_eq!(a, b);
        }
    }

    #[test]
    fn mac_is_deterministic_and_key_sensitive() {
        let key = [0u8; 32];
        let mut flipped = key;
        flipped[0] ^= 1;

        let mut skein = Skein::<8>::new();
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        let mut c = [0u8; 64];
        skein.mac(&mut a, b"abc", &key);
        skein.mac(&mut b, b"abc", &key);
        skein.mac(&mut c, b"abc", &flipped);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn output_length_is_bound_into_the_digest() {
        let mut skein = Skein::<8>::new();
        let mut short = [0u8; 64];
        let mut long = [0u8; 128];
        skein.hash(&mut short, b"abc");
        skein.hash(&mut long, b"abc");
        assert_ne!(short, long[..64]);
    }
}

//! Threefish - the tweakable block cipher underneath everything else.
//!
//! [`Threefish<N>`] is parameterised by its state size in 64-bit words:
//! 4, 8, or 16 (256-, 512-, and 1024-bit blocks). The key is always the
//! same width as the block; the tweak is always two words. Rekeying
//! recomputes the key and tweak parity words and, under the
//! [`SchedulePolicy::Precomputed`] policy, the full subkey table.
//!
//! Blocks are processed as word arrays; byte conversion happens at the
//! callers (see [`crate::utils`]).

use zeroize::Zeroize;

/// Keyschedule parity constant, folded into the extended key word.
const KEY_PARITY: u64 = 0x1BD1_1BDA_A9FC_1A22;

/// Rotation constants, indexed by `[round % 8][mix pair]`.
const ROT_256: [[u32; 2]; 8] = [
    [14, 16],
    [52, 57],
    [23, 40],
    [5, 37],
    [25, 33],
    [46, 12],
    [58, 22],
    [32, 32],
];

const ROT_512: [[u32; 4]; 8] = [
    [46, 36, 19, 37],
    [33, 27, 14, 42],
    [17, 49, 36, 39],
    [44, 9, 54, 56],
    [39, 30, 34, 24],
    [13, 50, 10, 17],
    [25, 29, 39, 43],
    [8, 35, 56, 22],
];

const ROT_1024: [[u32; 8]; 8] = [
    [24, 13, 8, 47, 8, 17, 22, 37],
    [38, 19, 10, 55, 49, 18, 23, 52],
    [33, 4, 51, 13, 34, 41, 59, 17],
    [5, 20, 48, 41, 47, 28, 16, 25],
    [41, 9, 37, 31, 12, 47, 44, 30],
    [16, 34, 56, 51, 4, 53, 42, 41],
    [31, 44, 47, 46, 19, 42, 44, 25],
    [9, 48, 35, 52, 23, 31, 37, 20],
];

/// Word permutations, applied after the MIX layer: `new[i] = old[PERM[i]]`.
const PERM_256: [usize; 4] = [0, 3, 2, 1];
const PERM_512: [usize; 8] = [2, 1, 4, 7, 6, 5, 0, 3];
const PERM_1024: [usize; 16] = [0, 9, 2, 13, 6, 11, 4, 15, 10, 7, 12, 3, 14, 5, 8, 1];

/// Inverses of the above (the 256-bit permutation is self-inverse).
const INV_PERM_256: [usize; 4] = [0, 3, 2, 1];
const INV_PERM_512: [usize; 8] = [6, 1, 0, 7, 2, 5, 4, 3];
const INV_PERM_1024: [usize; 16] = [0, 15, 2, 11, 6, 13, 4, 9, 14, 1, 8, 5, 10, 3, 12, 7];

/// How the subkey table is produced.
///
/// `Precomputed` expands the full table on every rekey and is the right
/// choice when one key encrypts many blocks (counter mode). `OnDemand`
/// derives each subkey word as the round needs it and is the right choice
/// when the key changes every block (UBI chaining).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulePolicy {
    Precomputed,
    OnDemand,
}

enum KeySchedule {
    Precomputed(Vec<u64>),
    OnDemand,
}

/// A Threefish instance: key material, tweak, and subkey policy.
///
/// `N` is the state size in words and must be 4, 8, or 16.
pub struct Threefish<const N: usize> {
    key: [u64; N],
    key_parity: u64,
    tweak: [u64; 3],
    schedule: KeySchedule,
}

impl<const N: usize> Threefish<N> {
    /// Block size in bytes.
    pub const BLOCK_BYTES: usize = N * 8;
    /// Number of rounds: 72 for the 256- and 512-bit widths, 80 for 1024.
    pub const ROUNDS: usize = if N == 16 { 80 } else { 72 };
    /// Number of subkeys injected over a full cipher run.
    pub const SUBKEYS: usize = Self::ROUNDS / 4 + 1;

    /// Create an instance keyed with all zeros. Call [`Self::rekey`] before
    /// use.
    pub fn new(policy: SchedulePolicy) -> Self {
        const {
            assert!(N == 4 || N == 8 || N == 16, "invalid Threefish width");
        }
        let schedule = match policy {
            SchedulePolicy::Precomputed => KeySchedule::Precomputed(vec![0; Self::SUBKEYS * N]),
            SchedulePolicy::OnDemand => KeySchedule::OnDemand,
        };
        let mut tf = Self {
            key: [0; N],
            key_parity: 0,
            tweak: [0; 3],
            schedule,
        };
        tf.rekey(&[0; N], &[0; 2]);
        tf
    }

    /// Install a new key and tweak.
    ///
    /// Recomputes both parity words and, under the precomputed policy, the
    /// whole subkey table.
    pub fn rekey(&mut self, key: &[u64; N], tweak: &[u64; 2]) {
        self.key = *key;
        self.key_parity = key.iter().fold(KEY_PARITY, |acc, w| acc ^ w);
        self.tweak = [tweak[0], tweak[1], tweak[0] ^ tweak[1]];
        if let KeySchedule::Precomputed(table) = &mut self.schedule {
            for s in 0..Self::SUBKEYS {
                for i in 0..N {
                    table[s * N + i] = subkey_word(&self.key, self.key_parity, &self.tweak, s, i);
                }
            }
        }
    }

    #[inline]
    fn rot(round: usize, pair: usize) -> u32 {
        match N {
            4 => ROT_256[round % 8][pair],
            8 => ROT_512[round % 8][pair],
            _ => ROT_1024[round % 8][pair],
        }
    }

    #[inline]
    fn perm() -> &'static [usize] {
        match N {
            4 => &PERM_256,
            8 => &PERM_512,
            _ => &PERM_1024,
        }
    }

    #[inline]
    fn inv_perm() -> &'static [usize] {
        match N {
            4 => &INV_PERM_256,
            8 => &INV_PERM_512,
            _ => &INV_PERM_1024,
        }
    }

    #[inline]
    fn add_subkey(&self, state: &mut [u64; N], s: usize) {
        match &self.schedule {
            KeySchedule::Precomputed(table) => {
                for (w, k) in state.iter_mut().zip(&table[s * N..(s + 1) * N]) {
                    *w = w.wrapping_add(*k);
                }
            }
            KeySchedule::OnDemand => {
                for (i, w) in state.iter_mut().enumerate() {
                    *w = w.wrapping_add(subkey_word(&self.key, self.key_parity, &self.tweak, s, i));
                }
            }
        }
    }

    #[inline]
    fn subtract_subkey(&self, state: &mut [u64; N], s: usize) {
        match &self.schedule {
            KeySchedule::Precomputed(table) => {
                for (w, k) in state.iter_mut().zip(&table[s * N..(s + 1) * N]) {
                    *w = w.wrapping_sub(*k);
                }
            }
            KeySchedule::OnDemand => {
                for (i, w) in state.iter_mut().enumerate() {
                    *w = w.wrapping_sub(subkey_word(&self.key, self.key_parity, &self.tweak, s, i));
                }
            }
        }
    }

    /// Encrypt one block in place.
    pub fn encrypt_block(&self, block: &mut [u64; N]) {
        for round in 0..Self::ROUNDS {
            if round % 4 == 0 {
                self.add_subkey(block, round / 4);
            }
            for pair in 0..N / 2 {
                let x0 = block[pair * 2].wrapping_add(block[pair * 2 + 1]);
                let x1 = block[pair * 2 + 1].rotate_left(Self::rot(round, pair)) ^ x0;
                block[pair * 2] = x0;
                block[pair * 2 + 1] = x1;
            }
            let old = *block;
            for (i, p) in Self::perm().iter().enumerate() {
                block[i] = old[*p];
            }
        }
        self.add_subkey(block, Self::ROUNDS / 4);
    }

    /// Decrypt one block in place.
    pub fn decrypt_block(&self, block: &mut [u64; N]) {
        self.subtract_subkey(block, Self::ROUNDS / 4);
        for round in (0..Self::ROUNDS).rev() {
            let old = *block;
            for (i, p) in Self::inv_perm().iter().enumerate() {
                block[i] = old[*p];
            }
            for pair in 0..N / 2 {
                let x1 = (block[pair * 2] ^ block[pair * 2 + 1]).rotate_right(Self::rot(round, pair));
                let x0 = block[pair * 2].wrapping_sub(x1);
                block[pair * 2] = x0;
                block[pair * 2 + 1] = x1;
            }
            if round % 4 == 0 {
                self.subtract_subkey(block, round / 4);
            }
        }
    }
}

/// One word of subkey `s`: the sliding key window plus the tweak schedule
/// on the last three words.
#[inline]
fn subkey_word<const N: usize>(
    key: &[u64; N],
    key_parity: u64,
    tweak: &[u64; 3],
    s: usize,
    i: usize,
) -> u64 {
    let m = (s + i) % (N + 1);
    let base = if m == N { key_parity } else { key[m] };
    if i == N - 3 {
        base.wrapping_add(tweak[s % 3])
    } else if i == N - 2 {
        base.wrapping_add(tweak[(s + 1) % 3])
    } else if i == N - 1 {
        base.wrapping_add(s as u64)
    } else {
        base
    }
}

impl<const N: usize> Drop for Threefish<N> {
    fn drop(&mut self) {
        self.key.zeroize();
        self.key_parity.zeroize();
        self.tweak.zeroize();
        if let KeySchedule::Precomputed(table) = &mut self.schedule {
            table.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{load_words_le, store_words_le};

    /// Published Threefish-512 vector: all-zero key, tweak, and plaintext.
    #[test]
    fn threefish512_zero_vector() {
        let tf = Threefish::<8>::new(SchedulePolicy::Precomputed);
        let mut block = [0u64; 8];
        tf.encrypt_block(&mut block);
        let mut out = [0u8; 64];
        store_words_le(&mut out, &block);
        assert_eq!(
            hex::encode(out),
            "b1a2bbc6ef6025bc40eb3822161f36e375d1bb0aee3186fbd19e47c5d479947b\
             7bc2f8586e35f0cff7e7f03084b0b7b1f1ab3961a580a3e97eb41ea14a6d7bbe"
        );
    }

    #[test]
    fn policies_agree() {
        let mut key = [0u64; 8];
        let mut tweak = [0u64; 2];
        load_words_le(&mut key, &[0xAAu8; 64]);
        load_words_le(&mut tweak, &[0x55u8; 16]);

        let mut pre = Threefish::<8>::new(SchedulePolicy::Precomputed);
        let mut lazy = Threefish::<8>::new(SchedulePolicy::OnDemand);
        pre.rekey(&key, &tweak);
        lazy.rekey(&key, &tweak);

        let mut a = [0x0123_4567_89AB_CDEFu64; 8];
        let mut b = a;
        pre.encrypt_block(&mut a);
        lazy.encrypt_block(&mut b);
        assert_eq!(a, b);
    }

    fn roundtrip<const N: usize>() {
        let mut key = [0u64; N];
        for (i, w) in key.iter_mut().enumerate() {
            *w = 0x9E37_79B9_7F4A_7C15u64.wrapping_mul(i as u64 + 1);
        }
        let tweak = [0xDEAD_BEEF, 0xFEED_FACE];
        let mut tf = Threefish::<N>::new(SchedulePolicy::OnDemand);
        tf.rekey(&key, &tweak);

        let mut block = [0u64; N];
        for (i, w) in block.iter_mut().enumerate() {
            *w = !(i as u64) << 7;
        }
        let plain = block;
        tf.encrypt_block(&mut block);
        assert_ne!(block, plain);
        tf.decrypt_block(&mut block);
        assert_eq!(block, plain);
    }

    #[test]
    fn decrypt_inverts_encrypt_all_widths() {
        roundtrip::<4>();
        roundtrip::<8>();
        roundtrip::<16>();
    }

    #[test]
    fn tweak_changes_ciphertext() {
        let key = [7u64; 8];
        let mut tf = Threefish::<8>::new(SchedulePolicy::Precomputed);

        tf.rekey(&key, &[0, 0]);
        let mut a = [1u64; 8];
        tf.encrypt_block(&mut a);

        tf.rekey(&key, &[0, 1]);
        let mut b = [1u64; 8];
        tf.encrypt_block(&mut b);

        assert_ne!(a, b);
    }
}

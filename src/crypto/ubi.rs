//! Unique Block Iteration - the chaining mode that turns Threefish into a
//! hash engine.
//!
//! Each call processes one typed stream of bytes: the chaining key encrypts
//! every message block under a 128-bit tweak, and the ciphertext is XORed
//! back into the chaining key. The tweak carries the running byte position
//! in word 0 and, in the top byte of word 1, a first-block bit (0x40), a
//! last-block bit (0x80), and the 6-bit type code of the stream.

use zeroize::Zeroize;

use crate::crypto::threefish::{SchedulePolicy, Threefish};
use crate::utils::{load_words_le, store_words_le};

const FIRST_FLAG: u64 = 0x40 << 56;
const LAST_FLAG: u64 = 0x80 << 56;

/// Stream type codes, ordered as they must appear within one hash
/// computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockKind {
    /// MAC key material.
    Key = 0,
    /// Configuration string.
    Cfg = 4,
    /// Personalization string.
    Prs = 8,
    /// Public key (signature-scheme use).
    Pk = 12,
    /// Key-derivation identifier.
    Kdf = 16,
    /// Nonce.
    Non = 20,
    /// Message payload.
    Msg = 48,
    /// Output transform counter blocks.
    Out = 63,
}

/// UBI chaining state over a [`Threefish`] instance.
pub struct Ubi<const N: usize> {
    cipher: Threefish<N>,
    key_state: [u64; N],
    msg: [u64; N],
    tweak: [u64; 2],
}

impl<const N: usize> Ubi<N> {
    /// Chaining-state width in bytes (equal to the cipher block).
    pub const STATE_BYTES: usize = N * 8;

    pub fn new(policy: SchedulePolicy) -> Self {
        Self {
            cipher: Threefish::new(policy),
            key_state: [0; N],
            msg: [0; N],
            tweak: [0; 2],
        }
    }

    /// Reset the chaining key to zero (the start of an unkeyed hash).
    pub fn clear_key_state(&mut self) {
        self.key_state = [0; N];
    }

    /// Install a precomputed chaining value (the native-output IVs).
    pub fn set_key_state(&mut self, words: &[u64]) {
        self.key_state.copy_from_slice(words);
    }

    #[inline]
    fn tweak_init(&mut self, kind: BlockKind) {
        self.tweak[0] = 0;
        self.tweak[1] = ((kind as u64) << 56) | FIRST_FLAG;
    }

    /// Rekey with the chaining state, encrypt the message block, and fold
    /// the ciphertext back into the chaining state.
    #[inline]
    fn rekey_cipher_xor(&mut self) {
        self.cipher.rekey(&self.key_state, &self.tweak);
        let mut block = self.msg;
        self.cipher.encrypt_block(&mut block);
        for (k, (c, m)) in self.key_state.iter_mut().zip(block.iter().zip(&self.msg)) {
            *k = c ^ m;
        }
        block.zeroize();
    }

    /// Chain one complete typed stream.
    ///
    /// An empty `input` is processed as a single zero block with position 0,
    /// matching the hash specification for zero-length streams.
    pub fn chain(&mut self, kind: BlockKind, input: &[u8]) {
        self.tweak_init(kind);
        let block_bytes = Self::STATE_BYTES;

        if input.len() <= block_bytes {
            self.tweak[1] |= LAST_FLAG;
            self.tweak[0] = input.len() as u64;
            load_words_le(&mut self.msg, input);
            self.rekey_cipher_xor();
            return;
        }

        self.tweak[0] = block_bytes as u64;
        load_words_le(&mut self.msg, &input[..block_bytes]);
        self.rekey_cipher_xor();
        self.tweak[1] &= !FIRST_FLAG;

        let mut consumed = block_bytes;
        while input.len() - consumed > block_bytes {
            self.tweak[0] += block_bytes as u64;
            load_words_le(&mut self.msg, &input[consumed..consumed + block_bytes]);
            self.rekey_cipher_xor();
            consumed += block_bytes;
        }

        self.tweak[1] |= LAST_FLAG;
        self.tweak[0] += (input.len() - consumed) as u64;
        load_words_le(&mut self.msg, &input[consumed..]);
        self.rekey_cipher_xor();
    }

    /// Run the output transform, filling `out` from successive counter
    /// blocks.
    ///
    /// Each counter block is 8 bytes of little-endian counter starting at
    /// zero; the position advances by 8 per block and a partial final block
    /// emits the leading bytes of the last chaining state.
    pub fn chain_output(&mut self, out: &mut [u8]) {
        self.tweak_init(BlockKind::Out);
        self.msg = [0; N];
        self.tweak[0] = 8;
        let block_bytes = Self::STATE_BYTES;

        if out.len() <= block_bytes {
            self.tweak[1] |= LAST_FLAG;
            self.rekey_cipher_xor();
            store_words_le(out, &self.key_state);
            return;
        }

        self.rekey_cipher_xor();
        self.tweak[1] &= !FIRST_FLAG;
        store_words_le(&mut out[..block_bytes], &self.key_state);
        self.msg[0] += 1;

        let mut written = block_bytes;
        while out.len() - written > block_bytes {
            self.tweak[0] += 8;
            self.rekey_cipher_xor();
            store_words_le(&mut out[written..written + block_bytes], &self.key_state);
            self.msg[0] += 1;
            written += block_bytes;
        }

        self.tweak[1] |= LAST_FLAG;
        self.tweak[0] += 8;
        self.rekey_cipher_xor();
        store_words_le(&mut out[written..], &self.key_state);
    }
}

impl<const N: usize> Drop for Ubi<N> {
    fn drop(&mut self) {
        self.key_state.zeroize();
        self.msg.zeroize();
        self.tweak.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chained(streams: &[(BlockKind, &[u8])], out: &mut [u8]) {
        let mut ubi = Ubi::<8>::new(SchedulePolicy::OnDemand);
        for (kind, input) in streams.iter().copied() {
            ubi.chain(kind, input);
        }
        ubi.chain_output(out);
    }

    #[test]
    fn empty_and_zero_block_messages_differ() {
        // A zero-length stream and a full zero block record different
        // positions in the tweak, so they must not collide.
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        chained(&[(BlockKind::Msg, &[])], &mut a);
        chained(&[(BlockKind::Msg, &[0u8; 64])], &mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn block_boundaries_are_position_bound() {
        // 64 bytes (single full block) vs 65 bytes (block + 1-byte tail).
        let msg64 = [3u8; 64];
        let mut msg65 = [3u8; 65];
        msg65[64] = 3;
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        chained(&[(BlockKind::Msg, &msg64)], &mut a);
        chained(&[(BlockKind::Msg, &msg65)], &mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn output_transform_is_deterministic_and_counter_bound() {
        let mut a = [0u8; 200];
        let mut b = [0u8; 200];
        chained(&[(BlockKind::Key, b"k"), (BlockKind::Msg, b"data")], &mut a);
        chained(&[(BlockKind::Key, b"k"), (BlockKind::Msg, b"data")], &mut b);
        assert_eq!(a, b);
        // Successive counter blocks must not repeat.
        assert_ne!(a[..64], a[64..128]);
    }
}

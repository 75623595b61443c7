//! Low-level word/byte helpers shared by the cipher, chaining, and KDF code.
//!
//! Every multi-byte quantity in the Dragonfly format is little-endian; these
//! helpers are the only place byte order is handled.

/// Load bytes into little-endian `u64` words, zero-filling the remainder of
/// `dst`.
///
/// `src` may be any length up to `8 * dst.len()`; a partial trailing chunk
/// occupies the low-order bytes of its word.
#[inline]
pub(crate) fn load_words_le(dst: &mut [u64], src: &[u8]) {
    debug_assert!(src.len() <= dst.len() * 8);
    dst.fill(0);
    for (word, chunk) in dst.iter_mut().zip(src.chunks(8)) {
        let mut b = [0u8; 8];
        b[..chunk.len()].copy_from_slice(chunk);
        *word = u64::from_le_bytes(b);
    }
}

/// Store words as little-endian bytes, writing exactly `dst.len()` bytes.
///
/// A partial trailing chunk takes the low-order bytes of its word.
#[inline]
pub(crate) fn store_words_le(dst: &mut [u8], src: &[u64]) {
    debug_assert!(dst.len() <= src.len() * 8);
    for (chunk, word) in dst.chunks_mut(8).zip(src) {
        chunk.copy_from_slice(&word.to_le_bytes()[..chunk.len()]);
    }
}

/// Read a little-endian `u64` at `offset`.
#[inline]
pub(crate) fn read_le_u64(buf: &[u8], offset: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(b)
}

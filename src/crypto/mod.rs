//! In-house implementations of the Dragonfly cryptographic primitives.
//!
//! All of the primitives are built from one tweakable block cipher and are
//! generic over its state width in 64-bit words (4, 8, or 16); the v1
//! container fixes the width at 8 (512 bits).
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`threefish`] | Tweakable block cipher |
//! | [`ubi`]       | Unique Block Iteration chaining over the cipher |
//! | [`skein`]     | Hashing and MAC façade over UBI |
//! | [`prng`]      | Reseedable Skein-based CSPRNG |
//! | [`ctr`]       | Counter-mode keystream and xor-crypt |
//! | [`catena`]    | Memory-hard password-based key derivation |
//!
//! These implementations favour clarity over speed and make no
//! constant-time claims beyond the MAC comparison performed by the
//! container code.

pub mod catena;
pub mod ctr;
pub mod prng;
pub mod skein;
pub mod threefish;
pub mod ubi;

/// The 512-bit cipher used by the v1 container.
pub type Threefish512 = threefish::Threefish<8>;
/// 512-bit UBI chaining state.
pub type Ubi512 = ubi::Ubi<8>;
/// Skein-512.
pub type Skein512 = skein::Skein<8>;
/// Skein-512 CSPRNG.
pub type SkeinPrng512 = prng::SkeinPrng<8>;
/// Threefish-512 counter mode.
pub type Ctr512 = ctr::Ctr<8>;

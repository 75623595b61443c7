//! **dragonfly** - password-based symmetric file encryption.
//!
//! The crate implements one cipher family end to end: the Threefish
//! tweakable block cipher, Skein hashing and MACs built on it through
//! Unique Block Iteration, a counter mode for bulk encryption, a
//! reseedable CSPRNG, and a Catena-style memory-hard KDF - composed into
//! the authenticated Dragonfly v1 container format.
//!
//! # Modules
//! | Module | Contents |
//! |--------|----------|
//! | [`crypto`]  | Threefish, UBI, Skein, CSPRNG, CTR, and the memory-hard KDF |
//! | [`formats`] | The Dragonfly v1 container: encrypt / decrypt / inspect |
//! | [`memlock`] | Best-effort locking of secret buffers into RAM |
//!
//! # Example
//! ```no_run
//! use dragonfly::crypto::SkeinPrng512;
//! use dragonfly::formats::dragonfly as container;
//!
//! fn roundtrip(plaintext: &[u8]) -> dragonfly::Result<Vec<u8>> {
//!     let mut rng = SkeinPrng512::from_os_entropy()?;
//!     let params = container::EncryptParams::default();
//!     let file = container::encrypt(plaintext, b"hunter2", &params, &mut rng)?;
//!     container::decrypt(&file, b"hunter2")
//! }
//! ```

pub mod crypto;
pub mod error;
pub mod formats;
pub mod memlock;
pub(crate) mod utils;

pub use error::{Error, Result};

//! The on-disk container formats dragonfly can read and write.
//!
//! Each submodule targets one format version and follows the same
//! conventions:
//!
//! * **Fixed layouts** - every field has a fixed offset and width,
//!   documented in a layout table in the module docs; all multi-byte
//!   integers are little-endian.
//! * **Whole-file operation** - containers are encrypted, decrypted, and
//!   inspected as in-memory byte regions. Callers own the file I/O.
//! * **Inspection is pure** - `inspect` reads public metadata only and
//!   never derives a key.
//!
//! | Module | Format | Description |
//! |--------|--------|-------------|
//! | [`dragonfly`] | Dragonfly v1 | Memory-hard, password-based, encrypt-then-MAC container |

pub mod dragonfly;

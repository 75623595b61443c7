//! Best-effort locking of secret buffers into physical memory.
//!
//! With the `memlock` feature enabled on a unix target, [`lock`] pins a
//! buffer so it cannot be swapped to disk and [`unlock`] releases it.
//! Locking is advisory: failures (for example an exhausted `RLIMIT_MEMLOCK`)
//! are ignored, and on other configurations both functions are no-ops.

/// Pin `buf` into physical memory, if supported.
#[cfg(all(feature = "memlock", unix))]
pub fn lock(buf: &[u8]) {
    if buf.is_empty() {
        return;
    }
    unsafe {
        let _ = libc::mlock(buf.as_ptr().cast(), buf.len());
    }
}

/// Release a buffer previously passed to [`lock`].
#[cfg(all(feature = "memlock", unix))]
pub fn unlock(buf: &[u8]) {
    if buf.is_empty() {
        return;
    }
    unsafe {
        let _ = libc::munlock(buf.as_ptr().cast(), buf.len());
    }
}

/// Pin `buf` into physical memory, if supported.
#[cfg(not(all(feature = "memlock", unix)))]
pub fn lock(_buf: &[u8]) {}

/// Release a buffer previously passed to [`lock`].
#[cfg(not(all(feature = "memlock", unix)))]
pub fn unlock(_buf: &[u8]) {}

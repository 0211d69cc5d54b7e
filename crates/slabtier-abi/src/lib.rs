//! C-compatible boundary for the slabtier allocator.
//!
//! Exposes the two-function pointer contract over a process-global
//! [`TierAllocator`]: `slab_buf_alloc` hands out a payload pointer,
//! `slab_buf_free` takes it back. Status codes are `0` on success and
//! negated errno values on failure (`-EINVAL` for contract violations,
//! `-ENOMEM` for exhaustion). Null-pointer checks live here; the typed core
//! API cannot express them.
//!
//! Outstanding buffers are kept in a registry keyed by payload address so a
//! raw pointer can be mapped back to its owned handle at free time. The
//! registry also turns a double free into `-EINVAL` instead of pool
//! corruption: once freed, the address is gone from the registry until some
//! later allocation re-issues it.

use std::collections::HashMap;
use std::ffi::{c_int, c_void};
use std::sync::OnceLock;

use parking_lot::Mutex;
use slabtier_core::{AllocError, BlockBuf, TierAllocator};

/// Success status for `slab_buf_alloc` and `slab_buf_free`.
pub const SLAB_OK: c_int = 0;

/// Process-global allocator backing the C surface.
fn global_allocator() -> &'static TierAllocator {
    static ALLOCATOR: OnceLock<TierAllocator> = OnceLock::new();
    ALLOCATOR.get_or_init(TierAllocator::new)
}

/// Outstanding buffers keyed by payload address.
///
/// Holding the `BlockBuf` here keeps its storage (and therefore the address
/// handed to the caller) alive and stable until the matching free.
fn live_buffers() -> &'static Mutex<HashMap<usize, BlockBuf>> {
    static LIVE: OnceLock<Mutex<HashMap<usize, BlockBuf>>> = OnceLock::new();
    LIVE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Allocates a buffer of `len` bytes and writes its address to `*bufptr`.
///
/// Returns `0` on success, `-EINVAL` when `bufptr` is null or `len` exceeds
/// the largest tier's payload capacity, and `-ENOMEM` when every tier is
/// exhausted.
///
/// # Safety
///
/// `bufptr` must be null or valid for writing one pointer. A returned
/// buffer stays valid until it is passed to [`slab_buf_free`], which must
/// happen exactly once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn slab_buf_alloc(bufptr: *mut *mut c_void, len: usize) -> c_int {
    if bufptr.is_null() {
        return -libc::EINVAL;
    }

    let mut buf = match global_allocator().allocate(len) {
        Ok(buf) => buf,
        Err(AllocError::PayloadTooLarge { .. }) => return -libc::EINVAL,
        Err(AllocError::Exhausted) => return -libc::ENOMEM,
    };

    let addr = buf.as_mut_ptr();
    live_buffers().lock().insert(addr as usize, buf);
    // SAFETY: bufptr was checked non-null and points to caller-owned storage.
    unsafe { *bufptr = addr.cast() };
    SLAB_OK
}

/// Releases a buffer previously returned by [`slab_buf_alloc`].
///
/// Returns `0` on success and `-EINVAL` when `ptr` is null, was never
/// produced by this allocator, or was already freed.
///
/// # Safety
///
/// `ptr` is used only as a lookup key and is never dereferenced, so any
/// value is sound to pass; stale and foreign pointers are reported, not
/// followed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn slab_buf_free(ptr: *mut c_void) -> c_int {
    if ptr.is_null() {
        return -libc::EINVAL;
    }

    let Some(buf) = live_buffers().lock().remove(&(ptr as usize)) else {
        tracing::error!(
            ptr = ptr as usize,
            "slab_buf_free rejected an unknown or already-freed buffer"
        );
        return -libc::EINVAL;
    };

    match global_allocator().release(buf) {
        Ok(()) => SLAB_OK,
        Err(err) => {
            // Registry-tracked buffers always belong to the global
            // allocator; a rejection here means the header was corrupted
            // while on loan.
            tracing::error!(%err, "slab_buf_free rejected a corrupted buffer");
            -libc::EINVAL
        }
    }
}

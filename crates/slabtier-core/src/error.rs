//! Error taxonomy for the allocator facade.
//!
//! Two classes, both returned synchronously: caller-contract violations
//! (oversized requests, unrecognized buffers on release) and transient
//! exhaustion. The allocator never retries internally and never escalates
//! an error to process termination.

use thiserror::Error;

use crate::buffer::BlockBuf;

/// Failure to hand out a buffer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The request can never be satisfied regardless of availability: it
    /// exceeds the largest tier's payload capacity.
    #[error("requested payload of {requested} bytes exceeds the {max}-byte maximum")]
    PayloadTooLarge { requested: usize, max: usize },

    /// Every tier that could fit the request was out of free blocks at
    /// selection time. Transient; callers may retry at a higher level.
    #[error("no tier has both sufficient capacity and a free block")]
    Exhausted,
}

/// Failure to take a buffer back.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The buffer's header names a pool this allocator does not own: a
    /// buffer from another allocator instance, or a header that was
    /// corrupted or already invalidated by a previous release. The rejected
    /// handle is carried back so a misdirected release does not destroy a
    /// buffer that may still belong to somebody.
    #[error("buffer header (pool id {pool_id:#x}) does not match any live pool")]
    ForeignBuffer { pool_id: u64, buf: BlockBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_error_messages_name_the_limit() {
        let err = AllocError::PayloadTooLarge {
            requested: 2048,
            max: 1024,
        };
        let text = err.to_string();
        assert!(text.contains("2048"));
        assert!(text.contains("1024"));
    }

    #[test]
    fn exhausted_is_distinct_from_oversized() {
        assert_ne!(
            AllocError::Exhausted,
            AllocError::PayloadTooLarge {
                requested: 1,
                max: 1024
            }
        );
    }
}

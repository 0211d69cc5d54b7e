//! The caller-facing buffer handle.

use std::fmt;
use std::ops::{Deref, DerefMut};

use slabtier_pool::{Block, PoolId};

use crate::header::{BlockHeader, HEADER_SIZE};

/// A buffer on loan from a [`TierAllocator`](crate::TierAllocator).
///
/// Dereferences to the payload region only; the ownership header ahead of
/// it is private to the allocator. Hand the buffer back with
/// [`TierAllocator::release`](crate::TierAllocator::release); a `BlockBuf`
/// that is dropped instead never returns to its pool, permanently reducing
/// that pool's capacity, just like a forgotten free.
pub struct BlockBuf {
    pub(crate) block: Block,
    pub(crate) payload_len: usize,
}

impl BlockBuf {
    pub(crate) fn new(block: Block, payload_len: usize) -> Self {
        debug_assert!(HEADER_SIZE + payload_len <= block.len());
        Self { block, payload_len }
    }

    /// Requested payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload_len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload_len == 0
    }

    /// Payload capacity of the underlying tier block, which may exceed the
    /// requested length when the request overflowed to a larger tier.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.block.len() - HEADER_SIZE
    }

    /// Pool identity recorded in the block's header.
    pub(crate) fn header_pool(&self) -> PoolId {
        BlockHeader::read_from(self.block.as_slice()).pool()
    }

    pub(crate) fn poison_header(&mut self) {
        BlockHeader::poison(self.block.as_mut_slice());
    }

    pub(crate) fn into_block(self) -> Block {
        self.block
    }
}

impl Deref for BlockBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.block.as_slice()[HEADER_SIZE..HEADER_SIZE + self.payload_len]
    }
}

impl DerefMut for BlockBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.block.as_mut_slice()[HEADER_SIZE..HEADER_SIZE + self.payload_len]
    }
}

impl fmt::Debug for BlockBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockBuf")
            .field("len", &self.payload_len)
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf_with_capacity(payload_capacity: usize, payload_len: usize) -> BlockBuf {
        let pool = slabtier_pool::BlockPool::new(HEADER_SIZE + payload_capacity, 1);
        let mut block = pool.try_acquire().expect("fresh pool has a block");
        BlockHeader::new(pool.id()).write_to(block.as_mut_slice());
        BlockBuf::new(block, payload_len)
    }

    #[test]
    fn deref_exposes_only_the_requested_payload() {
        let buf = buf_with_capacity(64, 20);
        assert_eq!(buf.len(), 20);
        assert_eq!(buf.capacity(), 64);
        assert_eq!(buf.iter().count(), 20);
    }

    #[test]
    fn payload_writes_do_not_touch_the_header() {
        let mut buf = buf_with_capacity(64, 64);
        let recorded = buf.header_pool();
        buf.fill(0xFF);
        assert_eq!(buf.header_pool(), recorded);
    }

    #[test]
    fn poison_invalidates_the_recorded_pool() {
        let mut buf = buf_with_capacity(64, 8);
        assert_ne!(buf.header_pool(), PoolId::INVALID);
        buf.poison_header();
        assert_eq!(buf.header_pool(), PoolId::INVALID);
    }

    #[test]
    fn zero_length_buffer_is_empty() {
        let buf = buf_with_capacity(64, 0);
        assert!(buf.is_empty());
        assert_eq!(&buf[..], &[] as &[u8]);
    }
}

//! Fixed-capacity pool of equal-sized blocks.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::block::Block;

/// Process-unique identity of one [`BlockPool`] instance.
///
/// Ids are drawn from a monotonically increasing counter and are never zero;
/// zero is reserved as the invalid identity, so a zeroed or deliberately
/// invalidated header word can never name a live pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(u64);

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

impl PoolId {
    /// The reserved never-valid identity.
    pub const INVALID: PoolId = PoolId(0);

    fn next() -> Self {
        PoolId(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw 64-bit representation, suitable for embedding in a header word.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Reconstructs an identity from its raw representation.
    ///
    /// The result is only meaningful when the bits came from
    /// [`PoolId::to_bits`]; any other value simply compares unequal to every
    /// live pool.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        PoolId(bits)
    }
}

/// A fixed-capacity collection of equal-sized blocks.
///
/// Acquire and release are thread-safe. [`BlockPool::acquire`] blocks the
/// calling thread, with no timeout, until a block is available; there is no
/// way to cancel a pending acquisition. Capacity and block size are fixed at
/// construction.
pub struct BlockPool {
    id: PoolId,
    block_size: usize,
    capacity: usize,
    free: Mutex<Vec<Block>>,
    available: Condvar,
}

impl BlockPool {
    /// Creates a pool of `capacity` zero-filled blocks of `block_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` or `capacity` is zero.
    #[must_use]
    pub fn new(block_size: usize, capacity: usize) -> Self {
        assert!(block_size > 0, "block_size must be non-zero");
        assert!(capacity > 0, "capacity must be non-zero");
        let free = (0..capacity).map(|_| Block::new_zeroed(block_size)).collect();
        Self {
            id: PoolId::next(),
            block_size,
            capacity,
            free: Mutex::new(free),
            available: Condvar::new(),
        }
    }

    /// This pool's process-unique identity.
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Size of every block in this pool, in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total number of blocks this pool owns.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks currently free.
    ///
    /// A snapshot: the value may be stale by the time the caller acts on it.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }

    /// Takes a block if one is free, without blocking.
    #[must_use]
    pub fn try_acquire(&self) -> Option<Block> {
        self.free.lock().pop()
    }

    /// Takes a block, blocking the calling thread until one is free.
    #[must_use]
    pub fn acquire(&self) -> Block {
        let mut free = self.free.lock();
        loop {
            if let Some(block) = free.pop() {
                return block;
            }
            self.available.wait(&mut free);
        }
    }

    /// Returns a block to the pool and wakes one blocked acquirer.
    ///
    /// The block must have been acquired from this pool. Size is the one
    /// property the pool can check on its own behalf.
    ///
    /// # Panics
    ///
    /// Panics if the block's size does not match this pool's block size.
    pub fn release(&self, block: Block) {
        assert_eq!(
            block.len(),
            self.block_size,
            "released block size does not match pool block size"
        );
        let mut free = self.free.lock();
        debug_assert!(free.len() < self.capacity, "pool free list over capacity");
        free.push(block);
        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn new_pool_starts_full() {
        let pool = BlockPool::new(72, 10);
        assert_eq!(pool.free_count(), 10);
        assert_eq!(pool.capacity(), 10);
        assert_eq!(pool.block_size(), 72);
    }

    #[test]
    fn pool_ids_are_unique_and_never_invalid() {
        let a = BlockPool::new(16, 1);
        let b = BlockPool::new(16, 1);
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), PoolId::INVALID);
        assert_ne!(b.id(), PoolId::INVALID);
    }

    #[test]
    fn pool_id_bits_round_trip() {
        let pool = BlockPool::new(16, 1);
        let bits = pool.id().to_bits();
        assert_eq!(PoolId::from_bits(bits), pool.id());
    }

    #[test]
    fn try_acquire_decrements_free_count() {
        let pool = BlockPool::new(64, 3);
        let block = pool.try_acquire().expect("pool has free blocks");
        assert_eq!(block.len(), 64);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn try_acquire_on_empty_pool_returns_none() {
        let pool = BlockPool::new(64, 2);
        let _a = pool.try_acquire().expect("first block");
        let _b = pool.try_acquire().expect("second block");
        assert!(pool.try_acquire().is_none());
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn release_restores_free_count() {
        let pool = BlockPool::new(64, 2);
        let block = pool.try_acquire().expect("block");
        assert_eq!(pool.free_count(), 1);
        pool.release(block);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn acquired_blocks_do_not_alias() {
        let pool = BlockPool::new(32, 4);
        let mut a = pool.try_acquire().expect("a");
        let mut b = pool.try_acquire().expect("b");
        a.as_mut_slice().fill(0x11);
        b.as_mut_slice().fill(0x22);
        assert!(a.as_slice().iter().all(|&x| x == 0x11));
        assert!(b.as_slice().iter().all(|&x| x == 0x22));
    }

    #[test]
    #[should_panic(expected = "does not match pool block size")]
    fn release_of_wrong_sized_block_panics() {
        let small = BlockPool::new(16, 1);
        let large = BlockPool::new(64, 1);
        let block = large.try_acquire().expect("block");
        small.release(block);
    }

    #[test]
    fn blocked_acquire_wakes_on_release() {
        let pool = Arc::new(BlockPool::new(48, 1));
        let held = pool.try_acquire().expect("drain the pool");
        assert_eq!(pool.free_count(), 0);

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let block = pool.acquire();
                tx.send(block.len()).expect("main thread is waiting");
            })
        };

        pool.release(held);
        assert_eq!(rx.recv().expect("waiter completes"), 48);
        waiter.join().expect("waiter thread");
        assert_eq!(pool.free_count(), 0);
    }
}

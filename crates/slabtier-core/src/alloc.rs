//! Allocator facade: tier selection, ownership validation, accounting.

use std::sync::atomic::{AtomicU64, Ordering};

use slabtier_pool::BlockPool;
use tracing::{debug, error, trace};

use crate::buffer::BlockBuf;
use crate::error::{AllocError, ReleaseError};
use crate::header::{BlockHeader, HEADER_SIZE};
use crate::tier::{TIER_COUNT, Tier, TierConfig};

/// One tier's pool together with its nominal payload capacity.
struct TierPool {
    tier: Tier,
    payload_capacity: usize,
    pool: BlockPool,
}

#[derive(Debug, Default)]
struct Counters {
    allocations: AtomicU64,
    overflow_allocations: AtomicU64,
    releases: AtomicU64,
    rejected_releases: AtomicU64,
    exhaustions: AtomicU64,
}

/// Point-in-time view of an allocator's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocatorStats {
    /// Buffers handed out.
    pub allocations: u64,
    /// Allocations served by a larger tier because the preferred tier had
    /// no free block.
    pub overflow_allocations: u64,
    /// Buffers taken back.
    pub releases: u64,
    /// Releases rejected by ownership validation.
    pub rejected_releases: u64,
    /// Allocate calls that found every eligible tier empty.
    pub exhaustions: u64,
}

/// Three fixed-tier block pools behind a two-operation facade.
///
/// Owns its pools outright; independent allocators never share state, so
/// tests can construct as many as they like. All operations take `&self`
/// and are safe to call from multiple threads.
pub struct TierAllocator {
    tiers: [TierPool; TIER_COUNT],
    counters: Counters,
}

impl TierAllocator {
    /// Creates an allocator with the default tier configuration
    /// (64/256/1024-byte payloads, 10 blocks per tier).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TierConfig::default())
    }

    /// Creates an allocator from `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config` is not valid (see [`TierConfig::is_valid`]).
    #[must_use]
    pub fn with_config(config: TierConfig) -> Self {
        assert!(
            config.is_valid(),
            "tier payload capacities must be non-zero and strictly increasing"
        );
        let tiers = Tier::ALL.map(|tier| {
            let payload_capacity = config.payload_capacities[tier.index()];
            TierPool {
                tier,
                payload_capacity,
                pool: BlockPool::new(HEADER_SIZE + payload_capacity, config.blocks_per_tier),
            }
        });
        Self {
            tiers,
            counters: Counters::default(),
        }
    }

    /// Largest payload any tier can hold.
    #[must_use]
    pub fn max_payload(&self) -> usize {
        self.tiers[TIER_COUNT - 1].payload_capacity
    }

    /// Nominal payload capacity of `tier`.
    #[must_use]
    pub fn payload_capacity(&self, tier: Tier) -> usize {
        self.tiers[tier.index()].payload_capacity
    }

    /// Number of blocks `tier` currently has free. A snapshot.
    #[must_use]
    pub fn free_count(&self, tier: Tier) -> usize {
        self.tiers[tier.index()].pool.free_count()
    }

    /// Total number of blocks in `tier`'s pool.
    #[must_use]
    pub fn block_capacity(&self, tier: Tier) -> usize {
        self.tiers[tier.index()].pool.capacity()
    }

    /// Snapshot of this allocator's counters.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            allocations: self.counters.allocations.load(Ordering::Relaxed),
            overflow_allocations: self.counters.overflow_allocations.load(Ordering::Relaxed),
            releases: self.counters.releases.load(Ordering::Relaxed),
            rejected_releases: self.counters.rejected_releases.load(Ordering::Relaxed),
            exhaustions: self.counters.exhaustions.load(Ordering::Relaxed),
        }
    }

    /// Picks the smallest tier that fits `payload_len` and currently reports
    /// a free block, falling through to larger tiers when a fitting tier is
    /// exhausted.
    ///
    /// Pure query over free-count snapshots: another thread can win the last
    /// block between this check and the acquisition, which is why
    /// [`TierAllocator::allocate`] treats the acquisition as authoritative.
    fn select_pool(&self, payload_len: usize) -> Option<&TierPool> {
        self.tiers
            .iter()
            .find(|tp| payload_len <= tp.payload_capacity && tp.pool.free_count() > 0)
    }

    /// Allocates a buffer of `payload_len` bytes.
    ///
    /// The buffer comes from the smallest tier that fits the request and
    /// still has a free block. May block the calling thread when the chosen
    /// pool is momentarily empty: the selector's free-count check is
    /// advisory, and a lost race is absorbed by waiting on the pool rather
    /// than failing. There is no timeout and no cancellation.
    ///
    /// # Errors
    ///
    /// [`AllocError::PayloadTooLarge`] when no tier could ever fit the
    /// request (no block is consumed); [`AllocError::Exhausted`] when every
    /// tier that fits was out of free blocks at selection time.
    pub fn allocate(&self, payload_len: usize) -> Result<BlockBuf, AllocError> {
        let max = self.max_payload();
        if payload_len > max {
            return Err(AllocError::PayloadTooLarge {
                requested: payload_len,
                max,
            });
        }

        let preferred = self
            .tiers
            .iter()
            .find(|tp| payload_len <= tp.payload_capacity)
            .map(|tp| tp.tier);

        let Some(tp) = self.select_pool(payload_len) else {
            self.counters.exhaustions.fetch_add(1, Ordering::Relaxed);
            debug!(payload_len, "allocation failed, all tiers exhausted");
            return Err(AllocError::Exhausted);
        };

        let mut block = tp.pool.acquire();
        BlockHeader::new(tp.pool.id()).write_to(block.as_mut_slice());

        if preferred != Some(tp.tier) {
            self.counters.overflow_allocations.fetch_add(1, Ordering::Relaxed);
            trace!(payload_len, tier = %tp.tier, "request overflowed to a larger tier");
        }
        self.counters.allocations.fetch_add(1, Ordering::Relaxed);
        Ok(BlockBuf::new(block, payload_len))
    }

    /// Takes back a buffer previously handed out by this allocator.
    ///
    /// The header's recorded pool identity must equal one of the three live
    /// pools; anything else is rejected, logged at error severity, and no
    /// pool state is touched. On success the identity word is invalidated
    /// before the block rejoins its pool's free list, so the header of a
    /// released block can never validate again. No size-based plausibility
    /// check is performed beyond identity equality.
    ///
    /// # Errors
    ///
    /// [`ReleaseError::ForeignBuffer`] when the header matches no live
    /// pool; the rejected handle rides inside the error.
    pub fn release(&self, mut buf: BlockBuf) -> Result<(), ReleaseError> {
        let recorded = buf.header_pool();
        let Some(tp) = self.tiers.iter().find(|tp| tp.pool.id() == recorded) else {
            self.counters.rejected_releases.fetch_add(1, Ordering::Relaxed);
            error!(
                pool_id = recorded.to_bits(),
                "release rejected, buffer does not belong to any live pool"
            );
            return Err(ReleaseError::ForeignBuffer {
                pool_id: recorded.to_bits(),
                buf,
            });
        };

        buf.poison_header();
        tp.pool.release(buf.into_block());
        self.counters.releases.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Default for TierAllocator {
    fn default() -> Self {
        Self::new()
    }
}

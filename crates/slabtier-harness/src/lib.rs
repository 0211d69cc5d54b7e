//! Batch smoke harness for the slabtier allocator.
//!
//! Reproduces the reference smoke routine: allocate a batch of buffers,
//! fill each with a distinct byte pattern, verify every pattern after all
//! writes (overlapping buffers would have clobbered an earlier one),
//! release the batch, and check that every tier's free count is back at
//! capacity.

use clap::ValueEnum;
use serde::Serialize;
use slabtier_core::{AllocError, BlockBuf, ReleaseError, Tier, TierAllocator};
use thiserror::Error;

/// Order in which the batch is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReleaseOrder {
    /// Allocation order.
    Forward,
    /// Reverse allocation order.
    Reverse,
    /// Even indices first, then odd.
    Interleaved,
}

impl ReleaseOrder {
    /// Stable lower-case name for reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseOrder::Forward => "forward",
            ReleaseOrder::Reverse => "reverse",
            ReleaseOrder::Interleaved => "interleaved",
        }
    }
}

/// Parameters for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of buffers to allocate.
    pub count: usize,
    /// Payload size of every buffer, in bytes.
    pub payload_len: usize,
    /// Release ordering.
    pub order: ReleaseOrder,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 30,
            payload_len: 20,
            order: ReleaseOrder::Forward,
        }
    }
}

/// A batch step that did not go to plan.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("allocation {index} failed: {source}")]
    Alloc {
        index: usize,
        #[source]
        source: AllocError,
    },
    #[error(
        "buffer {index} failed verification at byte {offset}: expected {expected:#04x}, found {found:#04x}"
    )]
    PatternMismatch {
        index: usize,
        offset: usize,
        expected: u8,
        found: u8,
    },
    #[error("release {index} failed: {source}")]
    Release {
        index: usize,
        #[source]
        source: ReleaseError,
    },
    #[error("tier {tier} ended with {free} free blocks, expected {capacity}")]
    FreeCountMismatch {
        tier: &'static str,
        free: usize,
        capacity: usize,
    },
}

/// Per-tier outcome of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct TierReport {
    pub tier: &'static str,
    pub block_capacity: usize,
    pub blocks_served: usize,
    pub free_after_release: usize,
}

/// Outcome of a successful batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub count: usize,
    pub payload_len: usize,
    pub release_order: &'static str,
    pub overflow_allocations: u64,
    pub tiers: Vec<TierReport>,
}

fn pattern_byte(index: usize) -> u8 {
    (index as u8).wrapping_mul(31).wrapping_add(7)
}

/// Runs one allocate/fill/verify/release batch against a fresh allocator.
///
/// # Errors
///
/// Returns the first [`BatchError`] encountered; a failed run may leave
/// buffers unreleased, but the allocator is discarded with it.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport, BatchError> {
    let allocator = TierAllocator::new();

    let mut bufs: Vec<BlockBuf> = Vec::with_capacity(config.count);
    for index in 0..config.count {
        let mut buf = allocator
            .allocate(config.payload_len)
            .map_err(|source| BatchError::Alloc { index, source })?;
        buf.fill(pattern_byte(index));
        bufs.push(buf);
    }

    let blocks_served: Vec<usize> = Tier::ALL
        .iter()
        .map(|&t| allocator.block_capacity(t) - allocator.free_count(t))
        .collect();

    for (index, buf) in bufs.iter().enumerate() {
        let expected = pattern_byte(index);
        if let Some(offset) = buf.iter().position(|&b| b != expected) {
            return Err(BatchError::PatternMismatch {
                index,
                offset,
                expected,
                found: buf[offset],
            });
        }
    }

    let mut indexed: Vec<(usize, BlockBuf)> = bufs.into_iter().enumerate().collect();
    match config.order {
        ReleaseOrder::Forward => {}
        ReleaseOrder::Reverse => indexed.reverse(),
        ReleaseOrder::Interleaved => {
            let (evens, odds): (Vec<_>, Vec<_>) = indexed.into_iter().partition(|(i, _)| i % 2 == 0);
            indexed = evens.into_iter().chain(odds).collect();
        }
    }
    for (index, buf) in indexed {
        allocator
            .release(buf)
            .map_err(|source| BatchError::Release { index, source })?;
    }

    let mut tiers = Vec::with_capacity(Tier::ALL.len());
    for (tier, served) in Tier::ALL.into_iter().zip(blocks_served) {
        let free = allocator.free_count(tier);
        let capacity = allocator.block_capacity(tier);
        if free != capacity {
            return Err(BatchError::FreeCountMismatch {
                tier: tier.name(),
                free,
                capacity,
            });
        }
        tiers.push(TierReport {
            tier: tier.name(),
            block_capacity: capacity,
            blocks_served: served,
            free_after_release: free,
        });
    }

    Ok(BatchReport {
        count: config.count,
        payload_len: config.payload_len,
        release_order: config.order.as_str(),
        overflow_allocations: allocator.stats().overflow_allocations,
        tiers,
    })
}

//! Tiered slab buffer allocation over fixed-capacity block pools.
//!
//! A [`TierAllocator`] owns three block pools at fixed size tiers
//! (small/medium/large). A request is served from the smallest tier whose
//! payload capacity fits it and that still has a free block; when the
//! preferred tier is exhausted the request overflows to the next larger
//! tier, trading memory for availability. Every block carries an ownership
//! header ahead of the payload naming the pool it came from, and release
//! validates that record before any pool state is touched.
//!
//! ```
//! use slabtier_core::TierAllocator;
//!
//! let allocator = TierAllocator::new();
//! let mut buf = allocator.allocate(20)?;
//! buf.fill(0x2a);
//! allocator.release(buf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod alloc;
mod buffer;
mod error;
mod header;
mod tier;

pub use alloc::{AllocatorStats, TierAllocator};
pub use buffer::BlockBuf;
pub use error::{AllocError, ReleaseError};
pub use header::{HEADER_ALIGN, HEADER_SIZE};
pub use slabtier_pool::{BlockPool, PoolId};
pub use tier::{TIER_COUNT, Tier, TierConfig};

//! Per-block ownership header.
//!
//! Every block starts with a fixed-size header naming the pool the block was
//! drawn from. The header is written once when a block is handed out, read
//! back once when it is released, and overwritten with the invalid identity
//! as soon as the release is accepted, so a stale header can never validate
//! a second time.

use slabtier_pool::PoolId;

/// Size of the ownership header in bytes: one 64-bit identity word, the
/// platform reference width.
pub const HEADER_SIZE: usize = size_of::<u64>();

/// Required header alignment in bytes.
pub const HEADER_ALIGN: usize = 4;

const _: () = assert!(HEADER_SIZE % HEADER_ALIGN == 0);

/// The ownership record at the start of every allocated block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    pool: PoolId,
}

impl BlockHeader {
    pub(crate) fn new(pool: PoolId) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(self) -> PoolId {
        self.pool
    }

    /// Encodes this header into the first `HEADER_SIZE` bytes of `block`.
    pub(crate) fn write_to(self, block: &mut [u8]) {
        block[..HEADER_SIZE].copy_from_slice(&self.pool.to_bits().to_le_bytes());
    }

    /// Decodes the header from the first `HEADER_SIZE` bytes of `block`.
    pub(crate) fn read_from(block: &[u8]) -> Self {
        let mut word = [0u8; HEADER_SIZE];
        word.copy_from_slice(&block[..HEADER_SIZE]);
        Self {
            pool: PoolId::from_bits(u64::from_le_bytes(word)),
        }
    }

    /// Overwrites the identity word with [`PoolId::INVALID`].
    pub(crate) fn poison(block: &mut [u8]) {
        BlockHeader::new(PoolId::INVALID).write_to(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_block_bytes() {
        let mut bytes = [0u8; HEADER_SIZE + 16];
        let header = BlockHeader::new(PoolId::from_bits(0xDEAD_BEEF_0042));
        header.write_to(&mut bytes);
        assert_eq!(BlockHeader::read_from(&bytes), header);
    }

    #[test]
    fn write_leaves_payload_bytes_untouched() {
        let mut bytes = [0xFFu8; HEADER_SIZE + 4];
        BlockHeader::new(PoolId::from_bits(1)).write_to(&mut bytes);
        assert!(bytes[HEADER_SIZE..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn poison_writes_the_invalid_identity() {
        let mut bytes = [0u8; HEADER_SIZE];
        BlockHeader::new(PoolId::from_bits(7)).write_to(&mut bytes);
        BlockHeader::poison(&mut bytes);
        assert_eq!(BlockHeader::read_from(&bytes).pool(), PoolId::INVALID);
    }

    #[test]
    fn zeroed_block_decodes_as_invalid() {
        let bytes = [0u8; HEADER_SIZE];
        assert_eq!(BlockHeader::read_from(&bytes).pool(), PoolId::INVALID);
    }
}

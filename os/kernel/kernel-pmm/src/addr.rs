//! Physical address newtype.
//!
//! A thin wrapper around `u64` that denotes **physical** addresses. The type
//! carries intent and prevents accidental mix-ups with virtual addresses or
//! plain byte counts at the allocator boundary.

use core::fmt;
use core::ops::{Add, AddAssign};
use kernel_info::memory::BLOCK_SIZE;

/// Physical memory address.
///
/// All addresses exchanged with the allocator are physical and block-aligned;
/// address 0 is reserved as the "no block" sentinel and is never returned
/// from a successful allocation.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0)
    }

    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The index of the block containing this address.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn block_index(self) -> usize {
        (self.0 / BLOCK_SIZE) as usize
    }

    /// The base address of block `index` (block 0 is physical address 0).
    #[inline]
    #[must_use]
    pub const fn from_block_index(index: usize) -> Self {
        Self(index as u64 * BLOCK_SIZE)
    }

    /// Whether this address lies on a block boundary.
    #[inline]
    #[must_use]
    pub const fn is_block_aligned(self) -> bool {
        self.0.is_multiple_of(BLOCK_SIZE)
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.as_u64())
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}

impl From<u64> for PhysicalAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl Add<u64> for PhysicalAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for PhysicalAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::PhysicalAddress;

    #[test]
    fn block_index_round_trip() {
        let pa = PhysicalAddress::from_block_index(3);
        assert_eq!(pa.as_u64(), 3 * 4096);
        assert_eq!(pa.block_index(), 3);
        assert!(pa.is_block_aligned());
    }

    #[test]
    fn block_index_truncates_into_block() {
        // Any address inside a block maps to that block's index.
        let pa = PhysicalAddress::new(4096 + 17);
        assert_eq!(pa.block_index(), 1);
        assert!(!pa.is_block_aligned());
    }
}

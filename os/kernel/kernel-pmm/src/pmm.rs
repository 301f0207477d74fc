//! Allocator state and block-granular operations.
//!
//! A single [`PhysicalMemoryManager`] instance is created once at boot with
//! the total memory size and the bitmap's storage, transitions through
//! repeated region-marking calls driven by the boot memory map, then serves
//! `alloc`/`free` calls for the remainder of kernel execution. It is never
//! torn down.

use crate::addr::PhysicalAddress;
use crate::bitmap::BlockBitmap;
use kernel_info::memory::BLOCK_SIZE;
use log::{debug, trace};

/// Allocation failure.
///
/// Failures are ordinary return values, never fatal: upward callers decide
/// whether to abort, retry with a smaller request, or report.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// No single free block, or no contiguous run of the requested length.
    #[error("out of physical memory")]
    OutOfMemory,
    /// A zero-length multi-block request.
    #[error("invalid allocation request")]
    InvalidRequest,
}

/// Read-only allocator statistics for boot-time diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PmmStats {
    /// Total number of blocks described by the allocator.
    pub total_blocks: usize,
    /// Blocks currently allocated or reserved.
    pub used_blocks: usize,
    /// Blocks currently free.
    pub free_blocks: usize,
}

impl core::fmt::Display for PmmStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} blocks total, {} used, {} free ({} KiB free)",
            self.total_blocks,
            self.used_blocks,
            self.free_blocks,
            self.free_blocks as u64 * BLOCK_SIZE / 1024,
        )
    }
}

/// Bitmap-based physical block allocator.
///
/// Designed for a single logical executor at boot time: no locks, no atomic
/// operations. No operation blocks or suspends; every call is a bounded scan
/// over at most `max_blocks / 32` words. The bitmap storage and the counters
/// are exclusively owned by this instance; the backing memory must never be
/// written by any other component once initialization has run.
pub struct PhysicalMemoryManager<'a> {
    /// Total physical memory described, in bytes.
    total_bytes: u64,
    /// `total_bytes / BLOCK_SIZE`, fixed after initialization.
    max_blocks: usize,
    /// Running count of set bits. Always equals the bitmap population.
    used_blocks: usize,
    bitmap: BlockBitmap<'a>,
}

impl<'a> PhysicalMemoryManager<'a> {
    /// Create an allocator describing `mem_size_kib` KiB of physical memory,
    /// tracking block state in the caller-provided `storage`.
    ///
    /// Every block starts out **used**; only the caller knows which ranges
    /// are physically backed, so marking memory free is its responsibility
    /// (see [`mark_region_free`](Self::mark_region_free) and [`crate::boot`]).
    ///
    /// # Panics
    /// Panics if `storage` cannot hold one bit per block.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(mem_size_kib: u64, storage: &'a mut [u32]) -> Self {
        let total_bytes = mem_size_kib * 1024;
        let max_blocks = (total_bytes / BLOCK_SIZE) as usize;
        let mut bitmap = BlockBitmap::new(storage, max_blocks);
        bitmap.fill_used();
        debug!("pmm: managing {mem_size_kib} KiB in {max_blocks} blocks, all reserved");
        Self {
            total_bytes,
            max_blocks,
            used_blocks: max_blocks,
            bitmap,
        }
    }

    /// Create an allocator whose bitmap lives at the physical address
    /// `bitmap_addr`, as reserved by the boot path.
    ///
    /// # Safety
    /// - `bitmap_addr` must point to a readable, writable range of at least
    ///   [`BlockBitmap::words_for`]`(max_blocks) * 4` bytes, reserved for the
    ///   allocator's exclusive use for the rest of the kernel's lifetime.
    /// - The range must lie outside every region later marked free, or be
    ///   re-reserved before the first allocation.
    /// - Physical memory must be addressable at this location (identity or
    ///   direct mapping in effect).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn from_raw(
        mem_size_kib: u64,
        bitmap_addr: PhysicalAddress,
    ) -> PhysicalMemoryManager<'static> {
        let max_blocks = (mem_size_kib * 1024 / BLOCK_SIZE) as usize;
        let words = BlockBitmap::words_for(max_blocks);
        let ptr = bitmap_addr.as_u64() as usize as *mut u32;
        // SAFETY: per this function's contract the range is valid, exclusive
        // and lives forever.
        let storage = unsafe { core::slice::from_raw_parts_mut(ptr, words) };
        PhysicalMemoryManager::new(mem_size_kib, storage)
    }

    /// Mark the region `[base, base + length)` free.
    ///
    /// `length` is converted to a block count by truncation; a partial
    /// trailing block is lost, so callers must round `length` down (or
    /// accept the loss). The range is clamped to the allocator's declared
    /// extent. Block 0 is unconditionally re-reserved afterwards, preserving
    /// the null-address sentinel even if the freed range covered it.
    #[allow(clippy::cast_possible_truncation)]
    pub fn mark_region_free(&mut self, base: PhysicalAddress, length: u64) {
        let start = base.block_index().min(self.max_blocks);
        let count = (length / BLOCK_SIZE) as usize;
        let end = start.saturating_add(count).min(self.max_blocks);

        let mut freed = 0;
        for block in start..end {
            if self.bitmap.clear(block) {
                freed += 1;
            }
        }
        self.used_blocks -= freed;

        // Block 0 is the "no block" sentinel and must never be handed out.
        if self.max_blocks > 0 && self.bitmap.set(0) {
            self.used_blocks += 1;
        }

        trace!("pmm: freed {freed} blocks at {base} (+{length} bytes)");
    }

    /// Mark the region `[base, base + length)` used.
    ///
    /// Used both for reserving non-RAM holes and for re-reserving ranges
    /// that must not be handed out: the kernel image, the bitmap storage
    /// itself, pre-allocated buffers. Length conversion and clamping follow
    /// [`mark_region_free`](Self::mark_region_free).
    #[allow(clippy::cast_possible_truncation)]
    pub fn mark_region_used(&mut self, base: PhysicalAddress, length: u64) {
        let start = base.block_index().min(self.max_blocks);
        let count = (length / BLOCK_SIZE) as usize;
        let end = start.saturating_add(count).min(self.max_blocks);

        let mut reserved = 0;
        for block in start..end {
            if self.bitmap.set(block) {
                reserved += 1;
            }
        }
        self.used_blocks += reserved;

        trace!("pmm: reserved {reserved} blocks at {base} (+{length} bytes)");
    }

    /// Allocate a single block, returning its physical address.
    ///
    /// First-fit: the lowest-addressed free block wins.
    ///
    /// # Errors
    /// [`AllocError::OutOfMemory`] if every block is in use.
    pub fn alloc_block(&mut self) -> Result<PhysicalAddress, AllocError> {
        if self.used_blocks == self.max_blocks {
            return Err(AllocError::OutOfMemory);
        }
        let index = self
            .bitmap
            .find_first_clear()
            .ok_or(AllocError::OutOfMemory)?;
        self.bitmap.set(index);
        self.used_blocks += 1;
        Ok(PhysicalAddress::from_block_index(index))
    }

    /// Release the block containing `addr`.
    ///
    /// Freeing a block that was never allocated (or double-freeing) is a
    /// caller contract violation; the allocator does not detect it beyond
    /// leaving the accounting unchanged for an already-free block.
    ///
    /// # Panics
    /// Panics if `addr` lies beyond the managed range.
    pub fn free_block(&mut self, addr: PhysicalAddress) {
        let index = addr.block_index();
        assert!(
            index < self.max_blocks,
            "free of {addr} beyond managed range"
        );
        if self.bitmap.clear(index) {
            self.used_blocks -= 1;
        }
    }

    /// Allocate `count` contiguous blocks, returning the run's base address.
    ///
    /// Two phases: a cheap necessary-but-not-sufficient reject on the free
    /// counter keeps the common "definitely out of memory" case O(1); only
    /// a genuine attempt pays for the full scan.
    ///
    /// # Errors
    /// - [`AllocError::InvalidRequest`] for `count == 0`.
    /// - [`AllocError::OutOfMemory`] if fewer than `count` blocks are free in
    ///   aggregate, or if no contiguous run of that length exists
    ///   (fragmentation).
    pub fn alloc_blocks(&mut self, count: usize) -> Result<PhysicalAddress, AllocError> {
        if count == 0 {
            return Err(AllocError::InvalidRequest);
        }
        if self.max_blocks - self.used_blocks < count {
            return Err(AllocError::OutOfMemory);
        }
        let start = self
            .bitmap
            .find_first_clear_run(count)
            .ok_or(AllocError::OutOfMemory)?;
        for block in start..start + count {
            self.bitmap.set(block);
        }
        self.used_blocks += count;
        Ok(PhysicalAddress::from_block_index(start))
    }

    /// Release `count` contiguous blocks starting at `addr`.
    ///
    /// The caller contract of [`free_block`](Self::free_block) applies to
    /// every block in the run.
    ///
    /// # Panics
    /// Panics if any part of the run lies beyond the managed range.
    pub fn free_blocks(&mut self, addr: PhysicalAddress, count: usize) {
        let start = addr.block_index();
        assert!(
            count <= self.max_blocks && start <= self.max_blocks - count,
            "free of {count} blocks at {addr} beyond managed range"
        );
        for block in start..start + count {
            if self.bitmap.clear(block) {
                self.used_blocks -= 1;
            }
        }
    }

    /// Total physical memory described, in bytes.
    #[inline]
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Total number of blocks.
    #[inline]
    #[must_use]
    pub const fn total_blocks(&self) -> usize {
        self.max_blocks
    }

    /// Blocks currently allocated or reserved.
    #[inline]
    #[must_use]
    pub const fn used_blocks(&self) -> usize {
        self.used_blocks
    }

    /// Size of the bitmap's active word store in bytes, for the boot path to
    /// re-reserve after the memory map has been applied.
    #[inline]
    #[must_use]
    pub const fn bitmap_bytes(&self) -> usize {
        self.bitmap.storage_bytes()
    }

    /// Snapshot of the allocator counters. Read-only, no side effects.
    #[must_use]
    pub const fn stats(&self) -> PmmStats {
        PmmStats {
            total_blocks: self.max_blocks,
            used_blocks: self.used_blocks,
            free_blocks: self.max_blocks - self.used_blocks,
        }
    }

    /// Authoritative set-bit population of the bitmap.
    ///
    /// `used_blocks` must always equal this; divergence is an invariant
    /// violation (a bug, not an expected runtime state). Exposed so tests
    /// and debug builds can cross-check after mutations.
    #[must_use]
    pub fn bitmap_population(&self) -> usize {
        self.bitmap.count_set()
    }
}

//! Boot-map integration.
//!
//! Consumes the bootloader-supplied memory map: every usable region is
//! marked free, then the ranges the kernel already occupies (its own image,
//! the bitmap storage, the display backbuffer) are re-reserved so they can
//! never be handed out. The order matters: reservations must follow the
//! free pass, because usable ranges reported by the bootloader may overlap
//! kernel structures.

use crate::addr::PhysicalAddress;
use crate::pmm::PhysicalMemoryManager;
use kernel_info::boot::MemoryRegion;
use kernel_info::memory::{BACKBUFFER_BYTES, BLOCK_SIZE, PHYS_LOAD};
use log::{debug, info};

/// Mark every usable region of the boot memory map free.
///
/// Partial trailing blocks of a region are truncated away by the region
/// marking itself; a region shorter than one block frees nothing.
pub fn apply_memory_map(pmm: &mut PhysicalMemoryManager<'_>, regions: &[MemoryRegion]) {
    for region in regions.iter().filter(|r| r.is_usable()) {
        debug!(
            "pmm: usable region at {:#x}, {} KiB",
            region.base,
            region.length / 1024
        );
        pmm.mark_region_free(PhysicalAddress::new(region.base), region.length);
    }
    info!("pmm: memory map applied, {}", pmm.stats());
}

/// Re-reserve the kernel image at its physical load address.
pub fn reserve_kernel_image(pmm: &mut PhysicalMemoryManager<'_>, image_bytes: u64) {
    pmm.mark_region_used(
        PhysicalAddress::new(PHYS_LOAD),
        image_bytes.next_multiple_of(BLOCK_SIZE),
    );
}

/// Re-reserve the allocator's own bitmap storage.
///
/// The bitmap lives in a caller-reserved physical range (the allocator
/// cannot allocate memory to track memory); if that range fell inside a
/// usable region, [`apply_memory_map`] has just marked it free again.
pub fn reserve_bitmap(pmm: &mut PhysicalMemoryManager<'_>, bitmap_addr: PhysicalAddress) {
    let bytes = (pmm.bitmap_bytes() as u64).next_multiple_of(BLOCK_SIZE);
    pmm.mark_region_used(bitmap_addr, bytes);
}

/// Re-reserve the display backbuffer.
pub fn reserve_backbuffer(pmm: &mut PhysicalMemoryManager<'_>, backbuffer_addr: PhysicalAddress) {
    pmm.mark_region_used(backbuffer_addr, BACKBUFFER_BYTES);
}

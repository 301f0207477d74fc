//! # Kernel Boot Information
//!
//! Structures handed from the bootloader to the kernel entry point. Layouts
//! are `#[repr(C)]` and use fixed-size integers at the ABI boundary.

/// Information the kernel needs immediately after the bootloader hands over.
///
/// Keep this `#[repr(C)]` and prefer fixed-size integers over pointer-sized
/// types at the ABI boundary.
#[repr(C)]
#[derive(Clone)]
pub struct KernelBootInfo {
    /// Pointer to the first [`MemoryRegion`] of the boot memory map.
    pub mmap_ptr: u64,

    /// Number of entries in the boot memory map.
    pub mmap_len: u64,

    /// Framebuffer information, passed through from the bootloader.
    pub fb: FramebufferInfo,
}

/// One entry of the boot memory map: a contiguous physical range and its
/// usability classification.
///
/// The map is an ordered sequence of these entries; the physical memory
/// manager consumes it by freeing every [`Usable`](MemoryRegionKind::Usable)
/// range and then re-reserving anything that overlaps kernel structures.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct MemoryRegion {
    /// Physical start address of the region in bytes.
    pub base: u64,

    /// Length of the region in bytes.
    pub length: u64,

    /// Usability classification reported by the bootloader.
    pub kind: MemoryRegionKind,
}

impl MemoryRegion {
    /// Whether this region may be handed to the physical memory manager as
    /// free RAM.
    #[inline]
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self.kind, MemoryRegionKind::Usable)
    }

    /// Exclusive physical end address of the region.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.base.saturating_add(self.length)
    }
}

/// Usability classification of a memory map entry.
///
/// Discriminants match the tag values of a stivale-style bootloader so the
/// map can be consumed without translation.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryRegionKind {
    /// Conventional RAM, free for the allocator.
    Usable = 1,
    /// Firmware-reserved; never touch.
    Reserved = 2,
    /// ACPI tables; reclaimable after they have been parsed.
    AcpiReclaimable = 3,
    /// ACPI non-volatile storage; never reclaimable.
    AcpiNvs = 4,
    /// Faulty RAM reported by the firmware.
    BadMemory = 5,
    /// Memory holding the kernel image and modules.
    KernelAndModules = 10,
    /// Bootloader-owned memory; reclaimable once the handoff data has been
    /// consumed.
    BootloaderReclaimable = 0x1000,
    /// The linear framebuffer itself.
    Framebuffer = 0x1002,
}

/// Linear framebuffer handoff information.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct FramebufferInfo {
    /// Framebuffer base address (CPU physical address).
    pub framebuffer_ptr: u64,

    /// Total framebuffer size in **bytes**. Helpful for bounds checks.
    pub framebuffer_size: u64,

    /// Visible width in **pixels**.
    pub framebuffer_width: u64,

    /// Visible height in **pixels**.
    pub framebuffer_height: u64,

    /// Pixels per scanline (a.k.a. stride). May be >= width due to padding.
    pub framebuffer_stride: u64,

    /// Bits per pixel. Only 32 bpp framebuffers are drawable by the kernel.
    pub framebuffer_bpp: u16,
}

impl FramebufferInfo {
    /// Number of `u32` pixel cells covering the visible area, based on the
    /// stride (not the width).
    #[inline]
    #[must_use]
    pub const fn pixel_count(&self) -> u64 {
        self.framebuffer_stride * self.framebuffer_height
    }
}

//! # Memory Layout

/// Size of one physical memory block (and of one page), in bytes.
///
/// This is the allocation granule of the physical memory manager; every
/// address it hands out is a multiple of this.
pub const BLOCK_SIZE: u64 = 4096;

/// Where the kernel image is placed in *physical* memory by the bootloader.
///
/// Must agree with the linker script of the kernel binary.
pub const PHYS_LOAD: u64 = 0x0010_0000; // 1 MiB

/// Bytes reserved for the display backbuffer before the allocator is online.
///
/// Enough for a 1024x768 display at 32 bpp.
pub const BACKBUFFER_BYTES: u64 = 3 * 1024 * 1024;

/// The size of the early boot stack.
pub const BOOT_STACK_SIZE: usize = 4096;

const _: () = {
    assert!(BLOCK_SIZE.is_power_of_two());
    assert!(PHYS_LOAD.is_multiple_of(BLOCK_SIZE));
    assert!(BACKBUFFER_BYTES.is_multiple_of(BLOCK_SIZE));
    assert!((BOOT_STACK_SIZE as u64).is_multiple_of(BLOCK_SIZE));
};

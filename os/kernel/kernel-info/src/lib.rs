//! # Kernel Configuration and Boot Interface
//!
//! This crate defines the data structures and memory layout constants that
//! govern the kernel's initialization. It is the authoritative source for the
//! bootloader-to-kernel handoff contract and for the physical memory layout
//! assumed by the rest of the kernel.
//!
//! ## Overview
//!
//! Early boot requires precise coordination between the bootloader, the
//! physical memory manager, and the display driver. This crate centralizes the
//! shared configuration so that no subsystem carries its own private copy of
//! layout information.
//!
//! The crate is organized into two modules:
//!
//! ### Boot Information ([`boot`])
//! Defines the bootloader-to-kernel handoff interface:
//! * **Memory Map**: ordered physical region descriptors with usability tags
//! * **Framebuffer Details**: linear framebuffer address, geometry and depth
//! * **ABI Stability**: C-compatible structures for cross-component use
//!
//! ### Memory Layout ([`memory`])
//! Establishes the kernel's physical memory architecture:
//! * **Block Granularity**: the fixed allocation unit shared with the PMM
//! * **Kernel Placement**: physical load address coordinated with the linker
//! * **Early Reservations**: sizes of buffers carved out before the allocator
//!   is online (display backbuffer, boot stack)
//!
//! ## Physical Memory Layout
//!
//! ```text
//! Physical Memory Layout:
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//!             │  (BIOS, VGA, DMA buffers)       │
//! PHYS_LOAD   ├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │       Kernel Image              │
//!             │   (Text, Data, BSS)             │
//!             ├─────────────────────────────────┤
//!             │    Available RAM                │
//!             │  (Managed by the PMM)           │
//!             └─────────────────────────────────┘
//! ```
//!
//! * **Low Memory Avoidance**: the kernel loads at 1 MiB to avoid legacy
//!   conflicts
//! * **Block 0 Reservation**: physical address 0 is never handed out by the
//!   allocator, so a null physical address always means "no block"
//!
//! ## ABI Compatibility
//!
//! All public structures maintain strict ABI compatibility:
//! * **`#[repr(C)]`**: predictable memory layout for cross-language use
//! * **Fixed-Size Types**: explicit integer sizes for platform independence
//! * **Plain Discriminants**: region kinds are a `#[repr(u32)]` enum matching
//!   the bootloader's tag values
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::boot::{MemoryRegion, MemoryRegionKind};
//!
//! let region = MemoryRegion {
//!     base: 0x10_0000,
//!     length: 64 * 1024 * 1024,
//!     kind: MemoryRegionKind::Usable,
//! };
//! assert!(region.is_usable());
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;

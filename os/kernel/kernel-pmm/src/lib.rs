//! # Physical Memory Manager (PMM)
//!
//! This crate implements the kernel's boot-time physical memory allocator: a
//! bitmap-based block allocator that tracks every fixed-size block of RAM as
//! free or in use. It is the foundation every later memory subsystem (paging,
//! kernel heap) builds on.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │           Boot Integration ([`boot`])               │
//! │    • Consumes the bootloader memory map             │
//! │    • Frees usable regions, re-reserves kernel       │
//! │      image, bitmap storage and backbuffer           │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │     Physical Memory Manager ([`pmm`])               │
//! │    • Block-granular alloc / free                    │
//! │    • Contiguous multi-block (run) allocation        │
//! │    • Region marking and accounting counters         │
//! └─────────────────┬───────────────────────────────────┘
//! ┌─────────────────▼───────────────────────────────────┐
//! │          Block Bitmap ([`bitmap`])                  │
//! │    • One bit per 4 KiB block (set = in use)         │
//! │    • First-fit single-bit and run searches          │
//! │    • Caller-provided, pre-reserved word store       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bootstrap Dependency
//!
//! The allocator cannot allocate memory to track memory before it exists, so
//! the bitmap's word store is **caller-provided**: the boot path reserves a
//! physical range for it (outside any region later marked free) and hands it
//! to [`PhysicalMemoryManager::from_raw`]. Host code and tests pass an
//! ordinary mutable slice instead.
//!
//! ## Invariants
//!
//! * `used_blocks` always equals the number of set bits in the bitmap.
//! * Bit *b* is set **iff** block *b* is allocated or reserved.
//! * Block 0 is permanently reserved from the first region initialization
//!   onward, so a returned physical address of 0 unambiguously means
//!   "no block".
//! * Immediately after initialization every block is considered used; only
//!   the boot memory map knows which ranges are physically backed.
//!
//! ## Allocation Policy
//!
//! Searches are linear and ascending: **first-fit**, always preferring the
//! lowest free physical address. This gives deterministic, reproducible
//! allocation order and keeps early physical memory compact.
//!
//! ## Concurrency Model
//!
//! The allocator assumes a **single logical executor**: no locks, no
//! atomics, no reentrancy guards. Every call is a bounded synchronous scan.
//! Once interrupts or additional cores come into play, callers must wrap
//! every operation in external mutual exclusion.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_pmm::{PhysicalAddress, PhysicalMemoryManager};
//!
//! // 1 MiB of physical memory -> 256 blocks -> 8 bitmap words.
//! let mut storage = [0u32; 8];
//! let mut pmm = PhysicalMemoryManager::new(1024, &mut storage);
//!
//! pmm.mark_region_free(PhysicalAddress::zero(), 1024 * 1024);
//! let block = pmm.alloc_block().expect("free memory available");
//! pmm.free_block(block);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod addr;
pub mod bitmap;
pub mod boot;
pub mod pmm;

pub use addr::PhysicalAddress;
pub use bitmap::BlockBitmap;
pub use pmm::{AllocError, PhysicalMemoryManager, PmmStats};

//! # Global Descriptor Table (GDT) setup
//!
//! With a flat memory model, segmentation does no address translation —
//! every segment spans the whole 4 GiB address space — but **segment
//! descriptors still matter**:
//!
//! - They distinguish **code vs. data/stack** segments.
//! - They carry the **Descriptor Privilege Level (DPL)** used by the CPU to
//!   enforce privilege transitions (Ring-0 ↔ Ring-3).
//!
//! ## GDT layout used here
//! Index | Selector | Meaning
//! ------|----------|--------
//! 0     | 0x00     | Null
//! 1     | 0x08     | Kernel code (DPL=0; [`KERNEL_CS_SEL`](table::KERNEL_CS_SEL))
//! 2     | 0x10     | Kernel data (DPL=0; [`KERNEL_DS_SEL`](table::KERNEL_DS_SEL))
//! 3     | 0x18     | User   code (DPL=3) → with RPL=3: **0x1b** ([`USER_CS_SEL`](table::USER_CS_SEL))
//! 4     | 0x20     | User   data (DPL=3) → with RPL=3: **0x23** ([`USER_DS_SEL`](table::USER_DS_SEL))
//!
//! This crate builds a typed 5-entry table and loads it with `lgdt`. It is a
//! fixed-shape, one-time setup with no runtime state machine: it is invoked
//! exactly once at boot, before any physical memory allocation is required,
//! and has no interaction with the memory manager.
//!
//! ## Preconditions
//! - The table's memory is readable at the address passed to `lgdt` for the
//!   rest of the kernel's lifetime (`&'static self`).
//! - Interrupts should be masked during the switch to avoid using half-set
//!   state.
//! - Segment registers (including CS via a far transfer) must be reloaded by
//!   the boot path after the table is loaded.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod descriptors;
pub mod selectors;
pub mod table;

pub use descriptors::SegmentDescriptor;
pub use selectors::{CodeSel, DataSel, Rpl, SegmentSelector};
pub use table::GlobalDescriptorTable;

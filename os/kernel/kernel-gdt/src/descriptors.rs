//! # Flat-model GDT code/data descriptor encodings (typed builders)
//!
//! Every descriptor spans the full 4 GiB address space (base 0, limit
//! `0xFFFFF` with 4 KiB granularity); paging, not segmentation, provides
//! memory protection. What varies between entries is:
//! - **Type** (code vs data, readable/writable),
//! - **DPL** (descriptor privilege level),
//! - **P** (present).
//!
//! This module provides a bitfield view plus a safe [`SegmentDescriptor`]
//! wrapper with constructors that set the correct invariants for flat
//! **code** and **data** segments, so nobody has to twiddle bits by hand.

use bitfield_struct::bitfield;

/// Bit layout of a segment descriptor.
///
/// Code and data descriptors share this layout; only the `typ` nibble
/// differs (`0b1010` execute+read vs `0b0010` read/write).
#[bitfield(u64)]
#[derive(Eq, PartialEq)]
pub struct SegmentDescBits {
    pub limit_lo: u16, // [15:0]
    pub base_lo: u16,  // [31:16]
    pub base_mid: u8,  // [39:32]
    #[bits(4)]
    pub typ: u8, // [43:40]
    pub s: bool,       // [44]     = 1 (code/data)
    #[bits(2)]
    pub dpl: u8, // [46:45]  = 0 or 3
    pub p: bool,       // [47]     = 1
    #[bits(4)]
    pub limit_hi: u8, // [51:48]
    pub avl: bool,     // [52]
    pub l: bool,       // [53]     = 0 (no long-mode code here)
    pub db: bool,      // [54]     = 1 (32-bit operand size)
    pub g: bool,       // [55]     = 1 (4 KiB limit granularity)
    pub base_hi: u8,   // [63:56]
}

/// A single 8-byte GDT entry.
///
/// Use the constructors to create valid flat descriptors; read the raw
/// encoding with [`to_u64`](Self::to_u64) for table emission.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SegmentDescriptor(SegmentDescBits);

impl SegmentDescriptor {
    /// The mandatory all-zero null descriptor at GDT index 0.
    #[must_use]
    pub const fn null() -> Self {
        Self(SegmentDescBits::new())
    }

    /// Build a flat **code** descriptor (execute+read, base 0, limit 4 GiB).
    ///
    /// `dpl` must be in `0..=3` (masked internally).
    #[must_use]
    pub const fn flat_code(dpl: u8) -> Self {
        Self(Self::flat(dpl).with_typ(0b1010))
    }

    /// Build a flat **data/stack** descriptor (read/write, base 0, limit 4 GiB).
    ///
    /// `dpl` must be in `0..=3` (masked internally).
    #[must_use]
    pub const fn flat_data(dpl: u8) -> Self {
        Self(Self::flat(dpl).with_typ(0b0010))
    }

    /// Common flat-segment fields: base 0, 20-bit limit `0xFFFFF`, page
    /// granularity, 32-bit operand size, present.
    const fn flat(dpl: u8) -> SegmentDescBits {
        SegmentDescBits::new()
            .with_limit_lo(0xFFFF)
            .with_limit_hi(0xF)
            .with_base_lo(0)
            .with_base_mid(0)
            .with_base_hi(0)
            .with_s(true)
            .with_dpl(dpl & 0b11)
            .with_p(true)
            .with_avl(false)
            .with_l(false)
            .with_db(true)
            .with_g(true)
    }

    /// Raw 64-bit encoding.
    #[inline]
    #[must_use]
    pub const fn to_u64(self) -> u64 {
        self.0.into_bits()
    }

    /// Structured view of the descriptor bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> SegmentDescBits {
        self.0
    }
}

// Size guards: each descriptor is exactly 8 bytes.
const _: () = {
    assert!(size_of::<SegmentDescBits>() == 8);
    assert!(size_of::<SegmentDescriptor>() == 8);
};

// The classic flat-model encodings, pinned at compile time.
const _: () = {
    assert!(SegmentDescriptor::null().to_u64() == 0);
    assert!(SegmentDescriptor::flat_code(0).to_u64() == 0x00CF_9A00_0000_FFFF);
    assert!(SegmentDescriptor::flat_data(0).to_u64() == 0x00CF_9200_0000_FFFF);
    assert!(SegmentDescriptor::flat_code(3).to_u64() == 0x00CF_FA00_0000_FFFF);
    assert!(SegmentDescriptor::flat_data(3).to_u64() == 0x00CF_F200_0000_FFFF);
};

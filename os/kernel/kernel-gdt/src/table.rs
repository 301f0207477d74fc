//! The 5-entry descriptor table and its one-time load.

use crate::descriptors::SegmentDescriptor;
use crate::selectors::{CodeSel, DataSel, Rpl, SegmentSelector};

/// Number of descriptors in the table.
pub const GDT_ENTRIES: usize = 5;

/// Well-known selectors matching the table layout below.
///
/// The `*_SEL` are typed wrappers; the bare constants are the encoded `u16`
/// values (useful for inline asm or stack frames).
pub const KERNEL_CS_SEL: SegmentSelector<CodeSel> = SegmentSelector::new(1, Rpl::Ring0);
pub const KERNEL_DS_SEL: SegmentSelector<DataSel> = SegmentSelector::new(2, Rpl::Ring0);
pub const USER_CS_SEL: SegmentSelector<CodeSel> = SegmentSelector::new(3, Rpl::Ring3);
pub const USER_DS_SEL: SegmentSelector<DataSel> = SegmentSelector::new(4, Rpl::Ring3);

/// Encoded selector numbers as `u16` (what the CPU actually loads).
pub const KERNEL_CS: u16 = KERNEL_CS_SEL.encode(); // 0x08
pub const KERNEL_DS: u16 = KERNEL_DS_SEL.encode(); // 0x10
pub const USER_CS: u16 = USER_CS_SEL.encode(); // 0x1b
pub const USER_DS: u16 = USER_DS_SEL.encode(); // 0x23

// Compile-time sanity checks for the selector encodings.
const _: () = {
    // Encoding formula: (index << 3) | (TI=0) | RPL
    const fn enc(index: u16, rpl: u16) -> u16 {
        (index << 3) | rpl
    }

    assert!(KERNEL_CS == 0x08);
    assert!(KERNEL_DS == 0x10);
    assert!(USER_CS == 0x1b);
    assert!(USER_DS == 0x23);

    assert!(KERNEL_CS == enc(1, 0)); // kernel code: index=1, RPL=0
    assert!(KERNEL_DS == enc(2, 0)); // kernel data: index=2, RPL=0
    assert!(USER_CS == enc(3, 3)); // user code: index=3, RPL=3
    assert!(USER_DS == enc(4, 3)); // user data: index=4, RPL=3
};

/// The fixed 5-entry descriptor table: null, kernel code, kernel data, user
/// code, user data.
///
/// One-time register programming with no runtime state machine: build it,
/// keep it `'static`, load it once at boot.
#[repr(C, align(8))]
pub struct GlobalDescriptorTable {
    entries: [SegmentDescriptor; GDT_ENTRIES],
}

impl GlobalDescriptorTable {
    /// Build the table with the canonical flat layout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [
                SegmentDescriptor::null(),
                SegmentDescriptor::flat_code(0),
                SegmentDescriptor::flat_data(0),
                SegmentDescriptor::flat_code(3),
                SegmentDescriptor::flat_data(3),
            ],
        }
    }

    /// The raw descriptors, in table order.
    #[inline]
    #[must_use]
    pub const fn entries(&self) -> &[SegmentDescriptor; GDT_ENTRIES] {
        &self.entries
    }

    /// Load this table into the CPU with `lgdt`.
    ///
    /// Invoked exactly once at boot, before any allocator activity is
    /// required; it has no interaction with the memory manager.
    ///
    /// # Safety
    /// - Interrupts must be masked during the switch.
    /// - The caller must reload the segment registers afterwards (CS via a
    ///   far transfer) before executing any privilege-sensitive code.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn load(&'static self) {
        let ptr = DescriptorTablePointer {
            limit: (size_of::<Self>() - 1) as u16,
            base: core::ptr::from_ref(self) as u64,
        };
        unsafe {
            core::arch::asm!(
                "lgdt [{}]",
                in(reg) &ptr,
                options(readonly, nostack, preserves_flags),
            );
        }
    }
}

impl Default for GlobalDescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Operand for `lgdt`: table limit (bytes - 1) and linear base address.
#[repr(C, packed)]
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
struct DescriptorTablePointer {
    limit: u16,
    base: u64,
}

const _: () = {
    assert!(size_of::<GlobalDescriptorTable>() == GDT_ENTRIES * 8);
};

use kernel_info::boot::{MemoryRegion, MemoryRegionKind};
use kernel_pmm::{AllocError, PhysicalAddress, PhysicalMemoryManager, boot};

const BLOCK: u64 = 4096;

/// A fully-initialized manager over `blocks` blocks with all of memory
/// marked free (block 0 stays reserved as the sentinel).
fn pmm_with_free_blocks(blocks: usize, storage: &mut [u32]) -> PhysicalMemoryManager<'_> {
    let kib = blocks as u64 * BLOCK / 1024;
    let mut pmm = PhysicalMemoryManager::new(kib, storage);
    pmm.mark_region_free(PhysicalAddress::zero(), blocks as u64 * BLOCK);
    pmm
}

fn assert_accounting(pmm: &PhysicalMemoryManager<'_>) {
    assert_eq!(
        pmm.used_blocks(),
        pmm.bitmap_population(),
        "used_blocks diverged from the bitmap population"
    );
}

#[test]
fn init_marks_everything_used() {
    let mut storage = [0u32; 8];
    let pmm = PhysicalMemoryManager::new(1024, &mut storage);
    assert_eq!(pmm.total_blocks(), 256);
    assert_eq!(pmm.used_blocks(), 256);
    assert_eq!(pmm.total_bytes(), 1024 * 1024);
    assert_accounting(&pmm);
    assert_eq!(pmm.stats().free_blocks, 0);
}

#[test]
fn sixteen_kib_boot_scenario() {
    // init(mem_size_kib=16) -> 4 blocks; freeing everything keeps block 0.
    let mut storage = [0u32; 1];
    let mut pmm = PhysicalMemoryManager::new(16, &mut storage);
    assert_eq!(pmm.total_blocks(), 4);

    pmm.mark_region_free(PhysicalAddress::zero(), 16384);
    assert_eq!(pmm.used_blocks(), 1);
    assert_accounting(&pmm);

    assert_eq!(pmm.alloc_block(), Ok(PhysicalAddress::new(4096)));
    assert_eq!(pmm.alloc_block(), Ok(PhysicalAddress::new(8192)));
    assert_eq!(pmm.alloc_block(), Ok(PhysicalAddress::new(12288)));
    assert_eq!(pmm.alloc_block(), Err(AllocError::OutOfMemory));
    assert_accounting(&pmm);
}

#[test]
fn block_zero_guard_is_monotonic() {
    let mut storage = [0u32; 2];
    let mut pmm = PhysicalMemoryManager::new(256, &mut storage);

    // Whatever range is freed, block 0 stays reserved afterwards.
    pmm.mark_region_free(PhysicalAddress::zero(), 256 * 1024);
    assert!(pmm.bitmap_population() >= 1);
    assert_ne!(pmm.alloc_block(), Ok(PhysicalAddress::zero()));

    // Explicitly freeing block 0's own range still leaves it reserved; the
    // next allocation skips past it (block 1 is already taken above).
    pmm.mark_region_free(PhysicalAddress::zero(), BLOCK);
    assert_eq!(pmm.alloc_block(), Ok(PhysicalAddress::new(2 * BLOCK)));
    assert_accounting(&pmm);
}

#[test]
fn first_fit_round_trip_is_deterministic() {
    let mut storage = [0u32; 2];
    let mut pmm = pmm_with_free_blocks(64, &mut storage);

    let a = pmm.alloc_block().unwrap();
    pmm.free_block(a);
    let b = pmm.alloc_block().unwrap();
    assert_eq!(a, b, "first-fit must reuse the lowest free block");
    assert_accounting(&pmm);
}

#[test]
fn exhaustion_yields_n_minus_one_blocks() {
    const N: usize = 32;
    let mut storage = [0u32; 1];
    let mut pmm = pmm_with_free_blocks(N, &mut storage);

    // Block 0 is pre-reserved, so only N-1 new blocks are obtainable.
    let mut obtained = Vec::new();
    loop {
        match pmm.alloc_block() {
            Ok(addr) => obtained.push(addr),
            Err(e) => {
                assert_eq!(e, AllocError::OutOfMemory);
                break;
            }
        }
        assert_accounting(&pmm);
    }
    assert_eq!(obtained.len(), N - 1);
    assert!(!obtained.contains(&PhysicalAddress::zero()));
    assert_eq!(pmm.used_blocks(), N);
}

#[test]
fn contiguous_run_allocation() {
    // A free run of exactly 5 blocks starting at index 10, plus scattered
    // free blocks elsewhere so the aggregate count exceeds 6.
    let mut storage = [0u32; 2];
    let mut pmm = PhysicalMemoryManager::new(256, &mut storage);
    pmm.mark_region_free(PhysicalAddress::from_block_index(10), 5 * BLOCK);
    pmm.mark_region_free(PhysicalAddress::from_block_index(20), BLOCK);
    pmm.mark_region_free(PhysicalAddress::from_block_index(22), BLOCK);

    assert_eq!(
        pmm.alloc_blocks(5),
        Ok(PhysicalAddress::from_block_index(10))
    );
    assert_accounting(&pmm);

    // Enough free blocks in aggregate, but not contiguously.
    pmm.free_blocks(PhysicalAddress::from_block_index(10), 5);
    assert!(pmm.stats().free_blocks >= 6);
    assert_eq!(pmm.alloc_blocks(6), Err(AllocError::OutOfMemory));
    assert_accounting(&pmm);
}

#[test]
fn exact_fit_run_is_not_rejected() {
    // Aggregate free == requested length must succeed (counter check is <,
    // not <=).
    let mut storage = [0u32; 1];
    let mut pmm = PhysicalMemoryManager::new(32 * 4, &mut storage);
    pmm.mark_region_free(PhysicalAddress::from_block_index(4), 3 * BLOCK);
    assert_eq!(pmm.stats().free_blocks, 3);
    assert_eq!(pmm.alloc_blocks(3), Ok(PhysicalAddress::from_block_index(4)));
    assert_accounting(&pmm);
}

#[test]
fn zero_length_request_is_invalid() {
    let mut storage = [0u32; 1];
    let mut pmm = pmm_with_free_blocks(32, &mut storage);
    assert_eq!(pmm.alloc_blocks(0), Err(AllocError::InvalidRequest));
    assert_accounting(&pmm);
}

#[test]
fn single_block_run_delegates_to_first_fit() {
    let mut storage = [0u32; 1];
    let mut pmm = pmm_with_free_blocks(32, &mut storage);
    let single = pmm.alloc_blocks(1).unwrap();
    assert_eq!(single, PhysicalAddress::new(BLOCK));
    assert_accounting(&pmm);
}

#[test]
fn region_inverse_law() {
    let mut storage = [0u32; 2];
    let mut pmm = PhysicalMemoryManager::new(256, &mut storage);
    let before = pmm.used_blocks();

    // free-then-reserve over an arbitrary range is a net no-op, except for
    // the permanent block-0 bit which remains used throughout.
    pmm.mark_region_free(PhysicalAddress::zero(), 40 * BLOCK);
    pmm.mark_region_used(PhysicalAddress::zero(), 40 * BLOCK);
    assert_eq!(pmm.used_blocks(), before);
    assert_accounting(&pmm);

    // Same for a range not touching block 0.
    pmm.mark_region_free(PhysicalAddress::from_block_index(8), 4 * BLOCK);
    pmm.mark_region_used(PhysicalAddress::from_block_index(8), 4 * BLOCK);
    assert_eq!(pmm.used_blocks(), before);
    assert_accounting(&pmm);
}

#[test]
fn region_marking_truncates_partial_blocks() {
    let mut storage = [0u32; 1];
    let mut pmm = PhysicalMemoryManager::new(32 * 4, &mut storage);

    // 1.5 blocks frees exactly one block.
    pmm.mark_region_free(PhysicalAddress::from_block_index(4), BLOCK + BLOCK / 2);
    assert_eq!(pmm.stats().free_blocks, 1);
    assert_accounting(&pmm);
}

#[test]
fn region_marking_clamps_to_managed_range() {
    let mut storage = [0u32; 1];
    let mut pmm = PhysicalMemoryManager::new(16, &mut storage);

    // Freeing far beyond the managed extent must not wrap or panic.
    pmm.mark_region_free(PhysicalAddress::zero(), 1 << 32);
    assert_eq!(pmm.used_blocks(), 1);
    pmm.mark_region_used(PhysicalAddress::new(1 << 40), 1 << 20);
    assert_accounting(&pmm);
}

#[test]
fn large_region_block_counts_do_not_truncate() {
    // Regions larger than 255 blocks exercise full-width block arithmetic
    // (16 MiB -> 4096 blocks).
    let mut storage = vec![0u32; 128];
    let mut pmm = PhysicalMemoryManager::new(16 * 1024, &mut storage);
    pmm.mark_region_free(PhysicalAddress::zero(), 16 * 1024 * 1024);
    assert_eq!(pmm.used_blocks(), 1);
    assert_eq!(pmm.stats().free_blocks, 4095);
    assert_accounting(&pmm);

    let run = pmm.alloc_blocks(300).unwrap();
    assert_eq!(run, PhysicalAddress::from_block_index(1));
    assert_accounting(&pmm);
}

#[test]
fn interleaved_workload_keeps_accounting() {
    let mut storage = [0u32; 4];
    let mut pmm = pmm_with_free_blocks(128, &mut storage);

    let a = pmm.alloc_block().unwrap();
    let run = pmm.alloc_blocks(10).unwrap();
    let b = pmm.alloc_block().unwrap();
    assert_accounting(&pmm);

    pmm.free_block(a);
    assert_accounting(&pmm);
    pmm.free_blocks(run, 10);
    assert_accounting(&pmm);
    pmm.free_block(b);
    assert_accounting(&pmm);

    // Freed space is reusable, lowest address first.
    assert_eq!(pmm.alloc_block(), Ok(a));
}

#[test]
fn stats_display_renders() {
    let mut storage = [0u32; 1];
    let pmm = PhysicalMemoryManager::new(16, &mut storage);
    let report = pmm.stats().to_string();
    assert!(report.contains("4 blocks total"));
    assert!(report.contains("4 used"));
}

#[test]
fn boot_glue_applies_usable_regions_and_reservations() {
    // A stivale-style map: one usable region overlapping the kernel image,
    // one reserved hole, one usable high region.
    let map = [
        MemoryRegion {
            base: 0,
            length: 2 * 1024 * 1024,
            kind: MemoryRegionKind::Usable,
        },
        MemoryRegion {
            base: 2 * 1024 * 1024,
            length: 1024 * 1024,
            kind: MemoryRegionKind::Reserved,
        },
        MemoryRegion {
            base: 3 * 1024 * 1024,
            length: 1024 * 1024,
            kind: MemoryRegionKind::Usable,
        },
    ];

    let mut storage = vec![0u32; 32];
    let mut pmm = PhysicalMemoryManager::new(4 * 1024, &mut storage);
    boot::apply_memory_map(&mut pmm, &map);
    assert_accounting(&pmm);

    // 3 MiB usable = 768 blocks, minus the block-0 sentinel.
    assert_eq!(pmm.stats().free_blocks, 768 - 1);

    // Re-reserve the kernel image at 1 MiB; its blocks are no longer free.
    boot::reserve_kernel_image(&mut pmm, 512 * 1024);
    assert_eq!(pmm.stats().free_blocks, 768 - 1 - 128);
    assert_accounting(&pmm);

    // The reserved hole was never freed.
    let hole = PhysicalAddress::new(2 * 1024 * 1024);
    pmm.mark_region_used(hole, 1024 * 1024);
    assert_eq!(pmm.stats().free_blocks, 768 - 1 - 128);

    // Allocations never land in the hole or the kernel image.
    for _ in 0..100 {
        let addr = pmm.alloc_block().unwrap().as_u64();
        assert!(!(0x10_0000..0x18_0000).contains(&addr));
        assert!(!(0x20_0000..0x30_0000).contains(&addr));
    }
    assert_accounting(&pmm);
}

#[test]
fn bitmap_reservation_survives_overlapping_free() {
    let mut storage = vec![0u32; 8];
    let mut pmm = PhysicalMemoryManager::new(1024, &mut storage);
    pmm.mark_region_free(PhysicalAddress::zero(), 1024 * 1024);

    // Pretend the bitmap lives at 64 KiB inside the freed range.
    let bitmap_addr = PhysicalAddress::new(64 * 1024);
    boot::reserve_bitmap(&mut pmm, bitmap_addr);
    assert_accounting(&pmm);

    let bitmap_block = bitmap_addr.block_index();
    for _ in 0..pmm.stats().free_blocks {
        assert_ne!(pmm.alloc_block().unwrap().block_index(), bitmap_block);
    }
}

//! Block bitmap store.
//!
//! One bit per physical memory block, packed into 32-bit words: bit `k` of
//! word `i` represents block `i * 32 + k`. Set means **in use**, clear means
//! free. The word store is caller-provided; the bitmap never allocates.
//!
//! # Invariants
//!
//! - Bits at indices `>= len_bits` (the tail of a partial final word) are
//!   permanently set, so neither search routine can ever report a block
//!   beyond the allocator's declared range.
//! - All public accessors are bounds-checked; the single unchecked read is
//!   confined to the run probe, which bounds the whole run first.

/// Bits per bitmap word.
pub const BITS_PER_WORD: usize = 32;

/// Packed free/used bitmap over a borrowed word store.
pub struct BlockBitmap<'a> {
    words: &'a mut [u32],
    len_bits: usize,
}

impl<'a> BlockBitmap<'a> {
    /// Number of words required to track `len_bits` blocks.
    #[inline]
    #[must_use]
    pub const fn words_for(len_bits: usize) -> usize {
        len_bits.div_ceil(BITS_PER_WORD)
    }

    /// Wrap a caller-provided word store tracking `len_bits` blocks.
    ///
    /// Only the first [`words_for`](Self::words_for)`(len_bits)` words are
    /// used; any excess storage is ignored. The tail bits of a partial final
    /// word are set immediately, whatever the storage held before.
    ///
    /// # Panics
    /// Panics if `storage` is too small to hold `len_bits` bits.
    #[must_use]
    pub fn new(storage: &'a mut [u32], len_bits: usize) -> Self {
        let words = Self::words_for(len_bits);
        assert!(
            storage.len() >= words,
            "bitmap storage too small: {} words provided, {words} required",
            storage.len(),
        );
        let bitmap = Self {
            words: &mut storage[..words],
            len_bits,
        };
        bitmap.seal_tail()
    }

    /// Set the bits past `len_bits` in a partial final word, establishing the
    /// permanently-set tail invariant regardless of the storage's prior
    /// contents.
    fn seal_tail(mut self) -> Self {
        let tail = self.len_bits % BITS_PER_WORD;
        if tail != 0
            && let Some(last) = self.words.last_mut()
        {
            *last |= !((1u32 << tail) - 1);
        }
        self
    }

    /// Number of blocks this bitmap tracks.
    #[inline]
    #[must_use]
    pub const fn len_bits(&self) -> usize {
        self.len_bits
    }

    /// Size of the active word store in bytes.
    #[inline]
    #[must_use]
    pub const fn storage_bytes(&self) -> usize {
        self.words.len() * size_of::<u32>()
    }

    /// Mark every block in use (all ones), including the tail bits of a
    /// partial final word.
    pub fn fill_used(&mut self) {
        self.words.fill(u32::MAX);
    }

    /// Mark block `index` in use. Returns `true` if the bit was previously
    /// clear (i.e. the population count changed).
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn set(&mut self, index: usize) -> bool {
        assert!(index < self.len_bits, "block index {index} out of range");
        let word = &mut self.words[index / BITS_PER_WORD];
        let mask = 1 << (index % BITS_PER_WORD);
        let was_clear = *word & mask == 0;
        *word |= mask;
        was_clear
    }

    /// Mark block `index` free. Returns `true` if the bit was previously set.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn clear(&mut self, index: usize) -> bool {
        assert!(index < self.len_bits, "block index {index} out of range");
        let word = &mut self.words[index / BITS_PER_WORD];
        let mask = 1 << (index % BITS_PER_WORD);
        let was_set = *word & mask != 0;
        *word &= !mask;
        was_set
    }

    /// Whether block `index` is in use.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn is_set(&self, index: usize) -> bool {
        assert!(index < self.len_bits, "block index {index} out of range");
        self.words[index / BITS_PER_WORD] & (1 << (index % BITS_PER_WORD)) != 0
    }

    /// Unchecked variant of [`is_set`](Self::is_set) for the hot probe loop.
    ///
    /// # Safety
    /// `index` must be less than [`len_bits`](Self::len_bits).
    #[inline]
    unsafe fn is_set_unchecked(&self, index: usize) -> bool {
        let word = unsafe { self.words.get_unchecked(index / BITS_PER_WORD) };
        word & (1 << (index % BITS_PER_WORD)) != 0
    }

    /// Population count: the number of set bits within the tracked range.
    ///
    /// Tail bits of a partial final word are excluded. This is the
    /// authoritative value the allocator's `used_blocks` counter must match.
    #[must_use]
    pub fn count_set(&self) -> usize {
        let mut count = 0;
        for (i, &word) in self.words.iter().enumerate() {
            let word = if (i + 1) * BITS_PER_WORD > self.len_bits {
                // mask off the permanently-set tail bits
                let valid = self.len_bits - i * BITS_PER_WORD;
                word & ((1u32 << valid) - 1)
            } else {
                word
            };
            count += word.count_ones() as usize;
        }
        count
    }

    /// First-fit search for a single free block.
    ///
    /// Scans words in ascending order; a word equal to all-ones is skipped
    /// without testing individual bits. Returns the global index of the first
    /// clear bit, or `None` if every block is in use.
    #[must_use]
    pub fn find_first_clear(&self) -> Option<usize> {
        for (i, &word) in self.words.iter().enumerate() {
            if word == u32::MAX {
                continue;
            }
            let bit = word.trailing_ones() as usize;
            let index = i * BITS_PER_WORD + bit;
            // Tail bits are permanently set, so a hit is always in range.
            debug_assert!(index < self.len_bits);
            return Some(index);
        }
        None
    }

    /// First-fit search for `n` consecutive free blocks.
    ///
    /// `n == 0` has no meaningful answer and returns `None`; `n == 1`
    /// delegates to [`find_first_clear`](Self::find_first_clear). Otherwise
    /// every clear bit is a candidate run start; a forward probe counts
    /// consecutive clear bits from there. An interrupted probe resumes the
    /// outer candidate scan rather than restarting mid-run, trading a little
    /// redundant work for determinism.
    #[must_use]
    pub fn find_first_clear_run(&self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        if n == 1 {
            return self.find_first_clear();
        }
        for (i, &word) in self.words.iter().enumerate() {
            if word == u32::MAX {
                continue;
            }
            for bit in 0..BITS_PER_WORD {
                if word & (1 << bit) != 0 {
                    continue;
                }
                let start = i * BITS_PER_WORD + bit;
                if self.is_clear_run(start, n) {
                    return Some(start);
                }
            }
        }
        None
    }

    /// Whether blocks `start..start + n` are all free.
    fn is_clear_run(&self, start: usize, n: usize) -> bool {
        let Some(end) = start.checked_add(n) else {
            return false;
        };
        if end > self.len_bits {
            return false;
        }
        for index in start..end {
            // SAFETY: `start + n <= len_bits` was checked above.
            if unsafe { self.is_set_unchecked(index) } {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{BITS_PER_WORD, BlockBitmap};

    #[test]
    fn words_for_rounds_up() {
        assert_eq!(BlockBitmap::words_for(0), 0);
        assert_eq!(BlockBitmap::words_for(1), 1);
        assert_eq!(BlockBitmap::words_for(32), 1);
        assert_eq!(BlockBitmap::words_for(33), 2);
    }

    #[test]
    fn set_clear_report_changes() {
        let mut storage = [0u32; 2];
        let mut bm = BlockBitmap::new(&mut storage, 40);

        assert!(bm.set(7));
        assert!(!bm.set(7), "setting a set bit is not a change");
        assert!(bm.is_set(7));
        assert!(bm.clear(7));
        assert!(!bm.clear(7), "clearing a clear bit is not a change");
        assert!(!bm.is_set(7));
    }

    #[test]
    fn count_set_excludes_tail() {
        let mut storage = [0u32; 2];
        let mut bm = BlockBitmap::new(&mut storage, 40);
        bm.fill_used();
        // 64 bits are physically set but only 40 are tracked.
        assert_eq!(bm.count_set(), 40);
    }

    #[test]
    fn first_clear_skips_full_words() {
        let mut storage = [0u32; 3];
        let mut bm = BlockBitmap::new(&mut storage, 96);
        bm.fill_used();
        assert_eq!(bm.find_first_clear(), None);

        bm.clear(70);
        assert_eq!(bm.find_first_clear(), Some(70));
    }

    #[test]
    fn new_seals_tail_of_prefilled_storage() {
        // Storage arrives with every tracked bit set but the tail clear; the
        // constructor must not let the searches wander past bit 40.
        let mut storage = [u32::MAX, 0x0000_00FF];
        let bm = BlockBitmap::new(&mut storage, 40);
        assert_eq!(bm.find_first_clear(), None);
        assert_eq!(bm.find_first_clear_run(2), None);
        assert_eq!(bm.count_set(), 40);
    }

    #[test]
    fn prefilled_storage_keeps_in_range_clear_bits() {
        let mut storage = [u32::MAX, 0x0000_00DF]; // bit 37 clear, tail clear
        let bm = BlockBitmap::new(&mut storage, 40);
        assert_eq!(bm.find_first_clear(), Some(37));
        assert_eq!(bm.count_set(), 39);
    }

    #[test]
    fn first_clear_never_reports_tail_bits() {
        let mut storage = [0u32; 2];
        let mut bm = BlockBitmap::new(&mut storage, 40);
        bm.fill_used();
        // Blocks 0..40 stay used; the tail of word 1 must not be offered.
        assert_eq!(bm.find_first_clear(), None);
        assert_eq!(bm.find_first_clear_run(2), None);
    }

    #[test]
    fn run_search_crosses_word_boundary() {
        let mut storage = [0u32; 2];
        let mut bm = BlockBitmap::new(&mut storage, 64);
        bm.fill_used();
        for i in 30..35 {
            bm.clear(i);
        }
        assert_eq!(bm.find_first_clear_run(5), Some(30));
        assert_eq!(bm.find_first_clear_run(6), None);
    }

    #[test]
    fn run_search_skips_interrupted_candidates() {
        let mut storage = [0u32; 1];
        let mut bm = BlockBitmap::new(&mut storage, 32);
        bm.fill_used();
        // free: 2..4 (too short), 10..14 (long enough)
        for i in [2, 3, 10, 11, 12, 13] {
            bm.clear(i);
        }
        assert_eq!(bm.find_first_clear_run(4), Some(10));
    }

    #[test]
    fn run_search_degenerate_lengths() {
        let mut storage = [0u32; 1];
        let mut bm = BlockBitmap::new(&mut storage, 32);
        bm.fill_used();
        bm.clear(5);
        assert_eq!(bm.find_first_clear_run(0), None);
        assert_eq!(bm.find_first_clear_run(1), Some(5));
    }

    #[test]
    fn run_longer_than_map_is_rejected() {
        let mut storage = [0u32; 1];
        let mut bm = BlockBitmap::new(&mut storage, 8);
        for i in 0..8 {
            let _ = bm.clear(i);
        }
        assert_eq!(bm.find_first_clear_run(9), None);
        assert_eq!(bm.find_first_clear_run(8), Some(0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_access_panics() {
        let mut storage = [0u32; 1];
        let bm = BlockBitmap::new(&mut storage, 8);
        let _ = bm.is_set(8);
    }

    #[test]
    fn word_geometry() {
        // bit k of word i represents block i * 32 + k
        let mut storage = [0u32; 2];
        let mut bm = BlockBitmap::new(&mut storage, 64);
        bm.set(BITS_PER_WORD + 3);
        assert_eq!(storage[1], 1 << 3);
    }
}

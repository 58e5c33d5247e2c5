//! Open-addressing slot buffer with a readable tail.
//!
//! The logical table has a power-of-two length and is indexed through
//! [`PaddedTable::mask`]. Behind it sit `padding` extra slots that repeat the
//! last logical slot, so a full register line starting at any logical index,
//! or one past the last one, can be read without leaving the allocation.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedTable {
    slots: Vec<i64>,
    logical_len: usize,
    empty: i64,
}

impl PaddedTable {
    /// Table of `logical_len` empty slots plus `padding`.
    /// `logical_len` must be a power of two.
    pub fn new(logical_len: usize, padding: usize, empty: i64) -> Self {
        debug_assert!(logical_len.is_power_of_two());
        Self {
            slots: vec![empty; logical_len + padding],
            logical_len,
            empty,
        }
    }

    #[inline(always)]
    pub fn logical_len(&self) -> usize {
        self.logical_len
    }

    #[inline(always)]
    pub fn physical_len(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    pub fn mask(&self) -> usize {
        self.logical_len - 1
    }

    #[inline(always)]
    pub fn slot(&self, index: usize) -> i64 {
        self.slots[index & self.mask()]
    }

    /// Logical slots only, padding excluded.
    pub fn logical_slots(&self) -> &[i64] {
        &self.slots[..self.logical_len]
    }

    /// `width` consecutive physical slots starting at `index`.
    #[inline(always)]
    pub fn line(&self, index: usize, width: usize) -> &[i64] {
        &self.slots[index..index + width]
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const i64 {
        self.slots.as_ptr()
    }

    /// Places `value` in the first empty slot at or after `home`, wrapping.
    /// Returns false when the table is full.
    #[must_use]
    pub(crate) fn insert(&mut self, home: usize, value: i64) -> bool {
        let mask = self.mask();
        for i in home..home + self.logical_len {
            let index = i & mask;
            if self.slots[index] == self.empty {
                self.slots[index] = value;
                return true;
            }
        }
        false
    }

    /// Replicates the last logical slot into the padding.
    pub(crate) fn seal(&mut self) {
        let last = self.slots[self.mask()];
        for slot in &mut self.slots[self.logical_len..] {
            *slot = last;
        }
    }
}

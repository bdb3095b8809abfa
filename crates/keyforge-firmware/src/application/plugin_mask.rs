//! Bit set recording which plugins already rewrote the current event.

const WORD_BITS: usize = u64::BITS as usize;

/// One bit per registered plugin.
///
/// A fresh mask is created for each event.  Bits are only ever set, never
/// cleared, for the lifetime of the mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMask {
    words: Vec<u64>,
    len: usize,
}

impl PluginMask {
    /// A mask for `len` plugins with every bit clear.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Number of plugins the mask covers.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_masked(&self, id: usize) -> bool {
        debug_assert!(id < self.len, "plugin id {id} out of range {}", self.len);
        self.words
            .get(id / WORD_BITS)
            .is_some_and(|word| word & (1 << (id % WORD_BITS)) != 0)
    }

    /// Sets the bit for `id`.  Returns `false` if it was already set.
    pub fn mask(&mut self, id: usize) -> bool {
        debug_assert!(id < self.len, "plugin id {id} out of range {}", self.len);
        let Some(word) = self.words.get_mut(id / WORD_BITS) else {
            return false;
        };
        let bit = 1 << (id % WORD_BITS);
        let was_clear = *word & bit == 0;
        *word |= bit;
        was_clear
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

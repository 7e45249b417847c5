//! Byte/char offset conversion.
//!
//! Regex and automaton matches come back as byte offsets; everything we
//! report is in character positions.

/// Lookup table from byte offsets to character offsets for one string.
#[derive(Debug, Clone)]
pub struct CharIndex {
    // Byte offset of every char boundary, plus `len()` at the end.
    boundaries: Vec<usize>,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    /// Character offset of a byte offset that sits on a char boundary.
    /// Offsets inside a multi-byte char round down to that char.
    pub fn char_offset(&self, byte: usize) -> usize {
        match self.boundaries.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }
}

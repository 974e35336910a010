//! Palette-compressed storage for one 16x16x16 layer of block states.
//!
//! Blocks are stored as offsets into a palette. Offsets are packed into little 32-bit words with
//! `32 / bits_per_block` offsets per word, never straddling a word boundary. This is exactly the
//! layout the client expects, so the word array can be written to the wire as-is.

use thiserror::Error;

pub const ARRAY_DIM: usize = 16;
pub const ARRAY_CAPACITY: usize = ARRAY_DIM * ARRAY_DIM * ARRAY_DIM;

/// Word sizes understood by the client.
const VALID_BITS_PER_BLOCK: [u8; 9] = [0, 1, 2, 3, 4, 5, 6, 8, 16];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    #[error("Invalid bits per block: {0}")]
    InvalidBitsPerBlock(u8),

    #[error("Expected {expected} words for {bits} bits per block, got {actual}")]
    WordCount {
        bits: u8,
        expected: usize,
        actual: usize,
    },

    #[error("Palette cannot be empty")]
    EmptyPalette,

    #[error("A palette of {len} entries cannot be addressed with {bits} bits per block")]
    PaletteTooLarge { bits: u8, len: usize },

    #[error("Offset {offset} at index {index} is outside a palette of {len} entries")]
    OffsetOutOfRange { index: usize, offset: usize, len: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PalettedBlockArray {
    bits_per_block: u8,
    words: Vec<u32>,
    palette: Vec<u32>,
}

impl PalettedBlockArray {
    /// An array where every block is `fill`. Takes no word storage.
    pub fn new(fill: u32) -> Self {
        Self {
            bits_per_block: 0,
            words: Vec::new(),
            palette: vec![fill],
        }
    }

    /// Rebuilds an array from its raw parts, validating every offset.
    pub fn from_data(
        bits_per_block: u8,
        words: Vec<u32>,
        palette: Vec<u32>,
    ) -> Result<Self, PaletteError> {
        Self::validate_bits_per_block(bits_per_block)?;

        let expected = Self::expected_word_count(bits_per_block);
        if words.len() != expected {
            return Err(PaletteError::WordCount {
                bits: bits_per_block,
                expected,
                actual: words.len(),
            });
        }

        if palette.is_empty() {
            return Err(PaletteError::EmptyPalette);
        }
        if palette.len() > Self::palette_capacity(bits_per_block) {
            return Err(PaletteError::PaletteTooLarge {
                bits: bits_per_block,
                len: palette.len(),
            });
        }

        let array = Self {
            bits_per_block,
            words,
            palette,
        };
        for index in 0..ARRAY_CAPACITY {
            let offset = array.offset_at(index);
            if offset >= array.palette.len() {
                return Err(PaletteError::OffsetOutOfRange {
                    index,
                    offset,
                    len: array.palette.len(),
                });
            }
        }

        Ok(array)
    }

    pub fn validate_bits_per_block(bits_per_block: u8) -> Result<(), PaletteError> {
        if VALID_BITS_PER_BLOCK.contains(&bits_per_block) {
            Ok(())
        } else {
            Err(PaletteError::InvalidBitsPerBlock(bits_per_block))
        }
    }

    /// Number of 32-bit words needed to hold 4096 offsets of `bits_per_block` bits.
    pub fn expected_word_count(bits_per_block: u8) -> usize {
        if bits_per_block == 0 {
            return 0;
        }
        let blocks_per_word = 32 / bits_per_block as usize;
        ARRAY_CAPACITY.div_ceil(blocks_per_word)
    }

    fn palette_capacity(bits_per_block: u8) -> usize {
        1 << bits_per_block
    }

    /// Smallest valid word size able to address `len` palette entries.
    fn bits_for_palette_len(len: usize) -> u8 {
        VALID_BITS_PER_BLOCK
            .iter()
            .copied()
            .find(|&bits| len <= Self::palette_capacity(bits))
            .unwrap_or(16)
    }

    pub fn bits_per_block(&self) -> u8 {
        self.bits_per_block
    }

    pub fn word_array(&self) -> &[u32] {
        &self.words
    }

    pub fn palette(&self) -> &[u32] {
        &self.palette
    }

    fn index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < ARRAY_DIM && y < ARRAY_DIM && z < ARRAY_DIM);
        (x << 8) | (z << 4) | y
    }

    fn offset_at(&self, index: usize) -> usize {
        if self.bits_per_block == 0 {
            return 0;
        }
        let bits = self.bits_per_block as usize;
        let blocks_per_word = 32 / bits;
        let word = self.words[index / blocks_per_word];
        let shift = (index % blocks_per_word) * bits;
        let mask = (1u32 << bits) - 1;

        ((word >> shift) & mask) as usize
    }

    fn set_offset(&mut self, index: usize, offset: usize) {
        if self.bits_per_block == 0 {
            return;
        }
        let bits = self.bits_per_block as usize;
        let blocks_per_word = 32 / bits;
        let shift = (index % blocks_per_word) * bits;
        let mask = ((1u32 << bits) - 1) << shift;
        let word = &mut self.words[index / blocks_per_word];

        *word = (*word & !mask) | (((offset as u32) << shift) & mask);
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> u32 {
        self.palette[self.offset_at(Self::index(x, y, z))]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: u32) {
        let offset = match self.palette.iter().position(|&p| p == value) {
            Some(offset) => offset,
            None => {
                // More palette entries than blocks means some entries are unused.
                if self.palette.len() >= ARRAY_CAPACITY {
                    self.collect_garbage();
                }

                self.palette.push(value);
                let needed = Self::bits_for_palette_len(self.palette.len());
                if needed > self.bits_per_block {
                    self.repack(needed);
                }
                self.palette.len() - 1
            }
        };

        self.set_offset(Self::index(x, y, z), offset);
    }

    /// Whether every block in the array is `value`.
    pub fn is_uniform(&self, value: u32) -> bool {
        if self.palette.len() == 1 {
            return self.palette[0] == value;
        }
        (0..ARRAY_CAPACITY).all(|index| self.palette[self.offset_at(index)] == value)
    }

    fn repack(&mut self, bits_per_block: u8) {
        let offsets: Vec<usize> = (0..ARRAY_CAPACITY).map(|i| self.offset_at(i)).collect();

        self.bits_per_block = bits_per_block;
        self.words = vec![0; Self::expected_word_count(bits_per_block)];
        for (index, offset) in offsets.into_iter().enumerate() {
            self.set_offset(index, offset);
        }
    }

    /// Drops palette entries no block refers to and shrinks the word size to fit.
    pub fn collect_garbage(&mut self) {
        let mut remap: Vec<Option<usize>> = vec![None; self.palette.len()];
        let mut palette = Vec::new();
        let offsets: Vec<usize> = (0..ARRAY_CAPACITY)
            .map(|index| {
                let old = self.offset_at(index);
                *remap[old].get_or_insert_with(|| {
                    palette.push(self.palette[old]);
                    palette.len() - 1
                })
            })
            .collect();

        let bits_per_block = Self::bits_for_palette_len(palette.len());
        self.palette = palette;
        self.bits_per_block = bits_per_block;
        self.words = vec![0; Self::expected_word_count(bits_per_block)];
        for (index, offset) in offsets.into_iter().enumerate() {
            self.set_offset(index, offset);
        }
    }
}

/// Tick Bitmap Module
///
/// This module implements a sparse bitmap over every tick-spacing-aligned tick. Each
/// 256-bit word covers 256 consecutive compressed ticks (`tick / tick_spacing`) and is
/// created lazily, so the index costs nothing over ranges that hold no liquidity.
///
/// A set bit means the tick it stands for has non-zero gross liquidity. Searches are
/// bounded to a single word per call; the swap loop repeats the search across words.
use crate::constants::TICK_ARRAY_WORD_BITS;
use crate::errors::ErrorCode;
use anchor_lang::prelude::*;
use primitive_types::U256;
use std::collections::HashMap;
use std::ops::{BitAnd, BitXor, Not};

/// A wrapper around U256 that implements AnchorSerialize and AnchorDeserialize
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct U256Wrapper(U256);

impl U256Wrapper {
    /// Wraps a raw 256-bit value
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// A word with only `bit_pos` set
    pub fn bit(bit_pos: u8) -> Self {
        Self(U256::one() << bit_pos)
    }

    /// Get the inner U256 value
    pub fn value(&self) -> U256 {
        self.0
    }

    /// Check if no bit is set
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Index of the highest set bit; meaningless for zero
    pub fn most_significant_bit(&self) -> u8 {
        (255 - self.0.leading_zeros()) as u8
    }

    /// Index of the lowest set bit; meaningless for zero
    pub fn least_significant_bit(&self) -> u8 {
        self.0.trailing_zeros() as u8
    }

    /// Mask of every bit at or below `bit_pos`
    fn at_or_below(bit_pos: u8) -> Self {
        if bit_pos == 255 {
            Self(U256::MAX)
        } else {
            Self((U256::one() << (bit_pos + 1)) - U256::one())
        }
    }

    /// Mask of every bit at or above `bit_pos`
    fn at_or_above(bit_pos: u8) -> Self {
        !Self((U256::one() << bit_pos) - U256::one())
    }
}

impl BitAnd for U256Wrapper {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitXor for U256Wrapper {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for U256Wrapper {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

// Serialized as 32 big-endian bytes
impl AnchorSerialize for U256Wrapper {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);
        writer.write_all(&bytes)
    }
}

impl AnchorDeserialize for U256Wrapper {
    fn deserialize_reader<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut bytes = [0u8; 32];
        reader.read_exact(&mut bytes)?;
        Ok(Self(U256::from_big_endian(&bytes)))
    }
}

/// Represents a single bitmap word that tracks 256 adjacent compressed ticks
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct TickBitmapWord {
    /// The bitmap data - each bit represents an initialized tick
    pub bitmap: U256Wrapper,
}

impl TickBitmapWord {
    /// Whether `bit_pos` is set
    pub fn is_set(&self, bit_pos: u8) -> bool {
        !(self.bitmap & U256Wrapper::bit(bit_pos)).is_zero()
    }

    /// Returns the word with `bit_pos` toggled
    pub fn flipped(&self, bit_pos: u8) -> Self {
        Self {
            bitmap: self.bitmap ^ U256Wrapper::bit(bit_pos),
        }
    }

    /// Whether no tick in this word is initialized
    pub fn is_empty(&self) -> bool {
        self.bitmap.is_zero()
    }
}

/// Divides a tick by the spacing, rounding toward negative infinity.
///
/// # Errors
/// * `InvalidTickSpacing` if the spacing is zero
pub fn compress_tick(tick: i32, tick_spacing: u16) -> Result<i32> {
    require!(tick_spacing > 0, ErrorCode::InvalidTickSpacing);
    Ok(tick.div_euclid(tick_spacing as i32))
}

/// Calculates the word and bit of a compressed tick.
///
/// `word_pos = compressed >> 8` floors for negative values, and `bit_pos` is the
/// non-negative remainder, so compressed tick -1 lives at bit 255 of word -1.
pub fn position(compressed: i32) -> (i16, u8) {
    let word_pos = (compressed >> 8) as i16;
    let bit_pos = compressed.rem_euclid(TICK_ARRAY_WORD_BITS) as u8;
    (word_pos, bit_pos)
}

/// The word a one-word search starting at `tick` consults.
///
/// A search for `tick' <= tick` starts at the tick's own bit; a search for `tick' > tick`
/// starts one compressed tick to the right.
pub fn search_word_position(tick: i32, tick_spacing: u16, lte: bool) -> Result<i16> {
    let compressed = compress_tick(tick, tick_spacing)?;
    let start = if lte { compressed } else { compressed + 1 };
    Ok(position(start).0)
}

/// Finds the next initialized tick contained in the same word as the starting tick.
///
/// # Parameters
/// * `word` - The bitmap word returned for `search_word_position(tick, tick_spacing, lte)`
/// * `tick` - The starting tick
/// * `tick_spacing` - The spacing between usable ticks
/// * `lte` - Search to the left (less than or equal to the starting tick) when true
///
/// # Returns
/// * `(next_tick, initialized)` - The next initialized tick, or when none exists in this
///   word, the word boundary tick in the search direction with `initialized = false`
pub fn next_initialized_tick_within_one_word(
    word: &TickBitmapWord,
    tick: i32,
    tick_spacing: u16,
    lte: bool,
) -> Result<(i32, bool)> {
    let compressed = compress_tick(tick, tick_spacing)?;
    let spacing = tick_spacing as i32;

    if lte {
        let (_, bit_pos) = position(compressed);
        let masked = word.bitmap & U256Wrapper::at_or_below(bit_pos);
        if masked.is_zero() {
            Ok(((compressed - bit_pos as i32) * spacing, false))
        } else {
            let msb = masked.most_significant_bit();
            Ok(((compressed - (bit_pos - msb) as i32) * spacing, true))
        }
    } else {
        let (_, bit_pos) = position(compressed + 1);
        let masked = word.bitmap & U256Wrapper::at_or_above(bit_pos);
        if masked.is_zero() {
            Ok(((compressed + 1 + (255 - bit_pos) as i32) * spacing, false))
        } else {
            let lsb = masked.least_significant_bit();
            Ok(((compressed + 1 + (lsb - bit_pos) as i32) * spacing, true))
        }
    }
}

/// Sparse map from word position to bitmap word
///
/// Words are created on the first flip inside them and dropped once they are empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickBitmap {
    /// Map from word positions to bitmap words
    pub bitmap_map: HashMap<i16, TickBitmapWord>,
}

impl TickBitmap {
    /// Creates a new empty tick bitmap
    pub fn new() -> Self {
        Self::default()
    }

    /// The word at `word_pos`, all zero when it was never created
    pub fn word(&self, word_pos: i16) -> TickBitmapWord {
        self.bitmap_map.get(&word_pos).copied().unwrap_or_default()
    }

    /// Stores a word, dropping it when empty
    pub fn set_word(&mut self, word_pos: i16, word: TickBitmapWord) {
        if word.is_empty() {
            self.bitmap_map.remove(&word_pos);
        } else {
            self.bitmap_map.insert(word_pos, word);
        }
    }

    /// Toggles the bit of an aligned tick
    ///
    /// # Errors
    /// * `TickNotAligned` if the tick is not a multiple of the spacing
    pub fn flip_tick(&mut self, tick: i32, tick_spacing: u16) -> Result<()> {
        require!(tick_spacing > 0, ErrorCode::InvalidTickSpacing);
        require!(
            tick % tick_spacing as i32 == 0,
            ErrorCode::TickNotAligned
        );
        let (word_pos, bit_pos) = position(compress_tick(tick, tick_spacing)?);
        let word = self.word(word_pos).flipped(bit_pos);
        self.set_word(word_pos, word);
        Ok(())
    }

    /// Checks if a specific tick is initialized in the bitmap
    pub fn is_initialized(&self, tick: i32, tick_spacing: u16) -> bool {
        if tick_spacing == 0 || tick % tick_spacing as i32 != 0 {
            return false;
        }
        let (word_pos, bit_pos) = position(tick.div_euclid(tick_spacing as i32));
        self.word(word_pos).is_set(bit_pos)
    }

    /// One-word search over this bitmap, see [`next_initialized_tick_within_one_word`]
    pub fn next_initialized_tick_within_one_word(
        &self,
        tick: i32,
        tick_spacing: u16,
        lte: bool,
    ) -> Result<(i32, bool)> {
        let word_pos = search_word_position(tick, tick_spacing, lte)?;
        next_initialized_tick_within_one_word(&self.word(word_pos), tick, tick_spacing, lte)
    }

    /// Every initialized tick, in ascending order
    pub fn initialized_ticks(&self, tick_spacing: u16) -> Vec<i32> {
        let mut ticks: Vec<i32> = self
            .bitmap_map
            .iter()
            .flat_map(|(word_pos, word)| {
                let word = *word;
                let base = (*word_pos as i32) * TICK_ARRAY_WORD_BITS;
                (0..=255u8)
                    .filter(move |bit| word.is_set(*bit))
                    .map(move |bit| (base + bit as i32) * tick_spacing as i32)
            })
            .collect();
        ticks.sort_unstable();
        ticks
    }
}

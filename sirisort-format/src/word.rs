//! Word layout of SiRi/CACTUS list-mode blocks.
//!
//! ```text
//! header:  11 000000 0000000000000000 LLLLLLLL   L = data words in the event
//! data:    00 BBBBBB CCCCCCCC VVVVVVVVVVVVVVVV   B = box, C = channel, V = value
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Marker bits of an event header word.
pub const HEADER_MARK: u32 = 0xC000_0000;

/// Mask of the bits that must match [`HEADER_MARK`] in a header word.
pub const HEADER_MASK: u32 = 0xFFFF_FF00;

/// A header word of zero ends the data in a block.
pub const END_OF_DATA: u32 = 0;

/// Bits that must be clear in every data word.
const DATA_FLAG_MASK: u32 = 0xC000_0000;

/// Readout boxes that contribute to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum BoxId {
    /// Trigger pattern unit.
    Pattern = 0x01,
    /// Wall clock, followed by an extension word with the time in seconds.
    Time = 0x02,
    /// Scaler, followed by an extension word with the scaler value.
    Scaler = 0x03,
    /// SiRi back detector ADC.
    SiriBack = 0x10,
    /// SiRi front detector ADC.
    SiriFront = 0x11,
    /// CACTUS ADC.
    CactusAdc = 0x20,
    /// CACTUS TDC.
    CactusTdc = 0x21,
}

impl BoxId {
    /// Looks up a box from the 6-bit box field.
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x01 => Some(BoxId::Pattern),
            0x02 => Some(BoxId::Time),
            0x03 => Some(BoxId::Scaler),
            0x10 => Some(BoxId::SiriBack),
            0x11 => Some(BoxId::SiriFront),
            0x20 => Some(BoxId::CactusAdc),
            0x21 => Some(BoxId::CactusTdc),
            _ => None,
        }
    }

    /// Returns true if the word is followed by a raw 32-bit extension word.
    #[must_use]
    pub fn has_extension(self) -> bool {
        matches!(self, BoxId::Time | BoxId::Scaler)
    }
}

/// Returns the number of data words announced by an event header.
#[inline]
#[must_use]
pub fn header_length(word: u32) -> Option<usize> {
    if word & HEADER_MASK == HEADER_MARK {
        Some((word & 0xFF) as usize)
    } else {
        None
    }
}

/// Builds an event header for `length` data words.
#[inline]
#[must_use]
pub fn encode_header(length: u8) -> u32 {
    HEADER_MARK | u32::from(length)
}

/// A single data word inside an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataWord(u32);

impl DataWord {
    /// Wraps a raw word, rejecting words with header bits set.
    #[inline]
    #[must_use]
    pub fn parse(raw: u32) -> Option<Self> {
        if raw & DATA_FLAG_MASK == 0 {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Builds a data word from its fields. The box id is truncated to 6 bits.
    #[inline]
    #[must_use]
    pub fn new(box_id: u8, channel: u8, value: u16) -> Self {
        Self((u32::from(box_id & 0x3F) << 24) | (u32::from(channel) << 16) | u32::from(value))
    }

    /// The raw 32-bit word.
    #[inline]
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// The 6-bit box field.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn box_id(self) -> u8 {
        ((self.0 >> 24) & 0x3F) as u8
    }

    /// The 8-bit channel field.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn channel(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    /// The 16-bit value field.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn value(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

//! Event decoder for list-mode blocks.

use crate::word::{header_length, BoxId, DataWord, END_OF_DATA};
use crate::{Error, Result};
use sirisort_core::{Event, RecordBlock};

/// Outcome of decoding one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// An event was decoded.
    Okay,
    /// The block is exhausted, no event was decoded.
    End,
    /// The block data could not be interpreted.
    Error,
}

/// Decodes events from blocks and keeps running event length statistics.
///
/// The statistics span every block handed to [`EventDecoder::set_block`]
/// until [`EventDecoder::reset_statistics`] is called.
#[derive(Debug, Clone, Default)]
pub struct EventDecoder {
    length_sum: u64,
    event_count: u64,
}

impl EventDecoder {
    /// Creates a decoder with empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts decoding `block` from its first word.
    pub fn set_block<'d, 'b, B: RecordBlock>(
        &'d mut self,
        block: &'b B,
    ) -> BlockDecoder<'d, 'b, B> {
        BlockDecoder {
            decoder: self,
            block,
            cursor: 0,
            events: 0,
            failed: None,
        }
    }

    /// Average number of data words per decoded event, 0 before the first event.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_event_length(&self) -> f64 {
        if self.event_count > 0 {
            self.length_sum as f64 / self.event_count as f64
        } else {
            0.0
        }
    }

    /// Number of events decoded so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Clears the running statistics.
    pub fn reset_statistics(&mut self) {
        self.length_sum = 0;
        self.event_count = 0;
    }
}

/// Read cursor over one block.
pub struct BlockDecoder<'d, 'b, B: RecordBlock> {
    decoder: &'d mut EventDecoder,
    block: &'b B,
    cursor: usize,
    events: usize,
    failed: Option<Error>,
}

impl<B: RecordBlock> BlockDecoder<'_, '_, B> {
    /// Decodes the next event into `event`.
    ///
    /// After [`DecodeStatus::Error`] the contents of `event` are unspecified
    /// and every further call returns `Error` for this block.
    pub fn next_event(&mut self, event: &mut Event) -> DecodeStatus {
        match self.decode_next(event) {
            Ok(true) => DecodeStatus::Okay,
            Ok(false) => DecodeStatus::End,
            Err(_) => DecodeStatus::Error,
        }
    }

    /// Decodes the next event into `event`, reporting why decoding failed.
    ///
    /// Returns `Ok(true)` for a decoded event and `Ok(false)` at the end of
    /// the block.
    ///
    /// # Errors
    /// Returns an error if the event header, length or a data word cannot be
    /// interpreted. The block is then considered broken and later calls
    /// return the same error.
    pub fn decode_next(&mut self, event: &mut Event) -> Result<bool> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let result = self.decode_one(event);
        if let Err(err) = &result {
            self.failed = Some(err.clone());
        }
        result
    }

    /// Word index of the next header to decode.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of events decoded from this block.
    #[must_use]
    pub fn events_in_block(&self) -> usize {
        self.events
    }

    fn decode_one(&mut self, event: &mut Event) -> Result<bool> {
        let total = self.block.word_count();
        let header = match self.block.word(self.cursor) {
            None | Some(END_OF_DATA) => {
                self.cursor = total;
                return Ok(false);
            }
            Some(word) => word,
        };
        let length = header_length(header).ok_or(Error::BadHeader {
            offset: self.cursor,
            word: header,
        })?;

        let start = self.cursor + 1;
        let end = start + length;
        if end > total {
            return Err(Error::Truncated {
                offset: self.cursor,
                length,
                available: total - start,
            });
        }

        event.reset();
        let mut idx = start;
        while idx < end {
            let raw = self.word_at(idx);
            let word = DataWord::parse(raw).ok_or(Error::BadDataWord {
                offset: idx,
                word: raw,
            })?;
            let box_id = BoxId::from_raw(word.box_id()).ok_or(Error::UnknownBox {
                offset: idx,
                box_id: word.box_id(),
            })?;

            let extension = if box_id.has_extension() {
                if idx + 1 >= end {
                    return Err(Error::MissingExtension { offset: idx });
                }
                idx += 1;
                self.word_at(idx)
            } else {
                0
            };

            match box_id {
                BoxId::Pattern => event.pattern = Some(word.value()),
                BoxId::Time => event.time = Some(extension),
                BoxId::Scaler => event.push_scaler(word.channel(), extension)?,
                BoxId::SiriBack => event.push_e(word.channel(), word.value())?,
                BoxId::SiriFront => event.push_de(word.channel(), word.value())?,
                BoxId::CactusAdc => event.set_na_adc(word.channel(), word.value())?,
                BoxId::CactusTdc => event.set_na_tdc(word.channel(), word.value())?,
            }
            idx += 1;
        }

        self.cursor = end;
        self.events += 1;
        self.decoder.length_sum += length as u64;
        self.decoder.event_count += 1;
        Ok(true)
    }

    #[inline]
    fn word_at(&self, idx: usize) -> u32 {
        self.block.word(idx).unwrap_or(END_OF_DATA)
    }
}

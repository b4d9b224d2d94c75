//! Synchronous block source.

use crate::reader::{FileReader, ReadOutcome};
use crate::source::{block_offset, BlockSource, Fetch, OpenStatus};
use crate::{Error, Result};
use sirisort_core::RecordBlock;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamState {
    Closed,
    Streaming,
    Finished,
    Failed,
}

/// Reads one block per request on the calling thread.
pub struct SequentialBlockSource<B: RecordBlock> {
    block: B,
    reader: Option<FileReader>,
    state: StreamState,
}

impl<B: RecordBlock> SequentialBlockSource<B> {
    /// Creates a closed source that reads into a block shaped like `template`.
    #[must_use]
    pub fn new(template: &B) -> Self {
        Self {
            block: template.new_like(),
            reader: None,
            state: StreamState::Closed,
        }
    }

    fn close(&mut self) {
        if let Some(mut reader) = self.reader.take() {
            reader.close();
        }
        self.state = StreamState::Closed;
    }
}

impl<B: RecordBlock> BlockSource for SequentialBlockSource<B> {
    type Block = B;

    fn open(&mut self, path: &Path, start_block: u64) -> Result<OpenStatus> {
        self.close();
        let offset = block_offset(start_block, self.block.byte_len())
            .ok_or_else(|| Error::InvalidFormat(format!("start block {start_block} out of range")))?;

        let mut reader = FileReader::open(path)?;
        let status = if reader.seek(offset)? {
            self.state = StreamState::Streaming;
            OpenStatus::Ready
        } else {
            self.state = StreamState::Finished;
            OpenStatus::EndOfStream
        };
        self.reader = Some(reader);
        Ok(status)
    }

    fn next_block(&mut self) -> Result<Fetch<'_, B>> {
        match self.state {
            StreamState::Closed => return Err(Error::NotOpen),
            StreamState::Failed => return Err(Error::Unusable),
            StreamState::Finished => return Ok(Fetch::EndOfStream),
            StreamState::Streaming => {}
        }
        let Some(reader) = self.reader.as_mut() else {
            return Err(Error::NotOpen);
        };
        match reader.read_block(self.block.as_bytes_mut()) {
            Ok(ReadOutcome::Filled) => Ok(Fetch::Ready(&self.block)),
            Ok(ReadOutcome::End) => {
                self.state = StreamState::Finished;
                Ok(Fetch::EndOfStream)
            }
            Err(err) => {
                self.state = StreamState::Failed;
                Err(err)
            }
        }
    }

    fn block_bytes(&self) -> usize {
        self.block.byte_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sirisort_core::FixedBlock;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_of_words(words: &[u32]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for word in words {
            file.write_all(&word.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_next_before_open() {
        let mut source = SequentialBlockSource::new(&FixedBlock::new(2).unwrap());
        assert!(matches!(source.next_block(), Err(Error::NotOpen)));
    }

    #[test]
    fn test_blocks_in_order_then_end() {
        let file = file_of_words(&[1, 2, 3, 4, 5, 6]);
        let mut source = SequentialBlockSource::new(&FixedBlock::new(2).unwrap());
        assert_eq!(source.open(file.path(), 0).unwrap(), OpenStatus::Ready);

        for expected in [[1, 2], [3, 4], [5, 6]] {
            let block = source.next_block().unwrap().block().unwrap();
            assert_eq!(block.words().collect::<Vec<_>>(), expected);
        }
        assert!(matches!(source.next_block().unwrap(), Fetch::EndOfStream));
        assert!(matches!(source.next_block().unwrap(), Fetch::EndOfStream));
    }

    #[test]
    fn test_open_at_start_block() {
        let file = file_of_words(&[1, 2, 3, 4, 5, 6]);
        let mut source = SequentialBlockSource::new(&FixedBlock::new(2).unwrap());

        assert_eq!(source.open(file.path(), 2).unwrap(), OpenStatus::Ready);
        let block = source.next_block().unwrap().block().unwrap();
        assert_eq!(block.words().collect::<Vec<_>>(), [5, 6]);

        assert_eq!(source.open(file.path(), 3).unwrap(), OpenStatus::EndOfStream);
        assert!(matches!(source.next_block().unwrap(), Fetch::EndOfStream));
    }

    #[test]
    fn test_short_read_makes_source_unusable_until_reopened() {
        let file = file_of_words(&[1, 2, 3]);
        let mut source = SequentialBlockSource::new(&FixedBlock::new(2).unwrap());
        source.open(file.path(), 0).unwrap();

        assert!(source.next_block().unwrap().block().is_some());
        assert!(matches!(source.next_block(), Err(Error::ShortRead { .. })));
        assert!(matches!(source.next_block(), Err(Error::Unusable)));

        source.open(file.path(), 0).unwrap();
        assert!(source.next_block().unwrap().block().is_some());
    }
}

//! Backing-store access for block sources.
//!
//! Files whose name ends in `.gz` are decompressed on the fly; every other
//! file is read as raw bytes.

use crate::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of reading one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The buffer was filled completely.
    Filled,
    /// The data ended exactly at a block boundary.
    End,
}

enum Backend {
    Raw(BufReader<File>),
    Gzip(BufReader<GzDecoder<BufReader<File>>>),
}

impl Read for Backend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Backend::Raw(r) => r.read(buf),
            Backend::Gzip(r) => r.read(buf),
        }
    }
}

/// Sequential reader over a raw or gzip-compressed data file.
///
/// After the data is exhausted the file is closed and every further read
/// reports [`ReadOutcome::End`]. After a failed read the reader is unusable.
pub struct FileReader {
    backend: Option<Backend>,
    path: PathBuf,
    failed: bool,
}

impl FileReader {
    /// Opens `path`, choosing the decompressing backend for `.gz` files.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = BufReader::new(File::open(&path)?);
        let backend = if is_gzip(&path) {
            Backend::Gzip(BufReader::new(GzDecoder::new(file)))
        } else {
            Backend::Raw(file)
        };
        debug!(path = %path.display(), gzip = is_gzip(&path), "opened data file");
        Ok(Self {
            backend: Some(backend),
            path,
            failed: false,
        })
    }

    /// Positions the reader at byte `offset` of the (decompressed) data.
    ///
    /// Returns `false` if the data ends at or before `offset`. Compressed
    /// streams cannot seek, so the skipped bytes are decompressed and dropped.
    ///
    /// # Errors
    /// Returns an error if seeking or skipping fails.
    pub fn seek(&mut self, offset: u64) -> Result<bool> {
        let result = match self.backend.as_mut() {
            None => return Ok(false),
            Some(Backend::Raw(file)) => Self::seek_raw(file, offset),
            Some(Backend::Gzip(stream)) => Self::skip_gzip(stream, offset),
        };
        result.map_err(|err| {
            self.fail();
            Error::Io(err)
        })
    }

    fn seek_raw(file: &mut BufReader<File>, offset: u64) -> io::Result<bool> {
        let len = file.get_ref().metadata()?.len();
        file.seek(SeekFrom::Start(offset))?;
        Ok(offset < len)
    }

    // Data must remain after the skipped bytes, as for raw files.
    fn skip_gzip<R: BufRead>(stream: &mut R, offset: u64) -> io::Result<bool> {
        let skipped = io::copy(&mut stream.by_ref().take(offset), &mut io::sink())?;
        Ok(skipped == offset && !stream.fill_buf()?.is_empty())
    }

    /// Fills `buf` with the next block.
    ///
    /// # Errors
    /// Returns [`Error::ShortRead`] if the data ends inside the block, an I/O
    /// error if reading fails, and [`Error::Unusable`] after an earlier failure.
    pub fn read_block(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        if self.failed {
            return Err(Error::Unusable);
        }
        let Some(backend) = self.backend.as_mut() else {
            return Ok(ReadOutcome::End);
        };

        let mut filled = 0;
        while filled < buf.len() {
            match backend.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    self.fail();
                    return Err(Error::Io(err));
                }
            }
        }

        if filled == buf.len() {
            Ok(ReadOutcome::Filled)
        } else if filled == 0 {
            self.close();
            Ok(ReadOutcome::End)
        } else {
            self.fail();
            Err(Error::ShortRead {
                expected: buf.len(),
                got: filled,
            })
        }
    }

    /// Closes the underlying file.
    pub fn close(&mut self) {
        if self.backend.take().is_some() {
            debug!(path = %self.path.display(), "closed data file");
        }
    }

    /// Returns true if a read or seek has failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.failed
    }

    /// Path of the file being read.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fail(&mut self) {
        self.failed = true;
        self.close();
    }
}

/// Returns true if `path` names a gzip-compressed file.
#[must_use]
pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn raw_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn gz_file(bytes: &[u8]) -> NamedTempFile {
        let file = tempfile::Builder::new().suffix(".gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::fast());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap();
        file
    }

    fn counting(n: u8) -> Vec<u8> {
        (0..n).collect()
    }

    #[test]
    fn test_reads_whole_blocks_then_end() {
        let file = raw_file(&counting(8));
        let mut reader = FileReader::open(file.path()).unwrap();
        let mut buf = [0u8; 4];

        assert_eq!(reader.read_block(&mut buf).unwrap(), ReadOutcome::Filled);
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(reader.read_block(&mut buf).unwrap(), ReadOutcome::Filled);
        assert_eq!(buf, [4, 5, 6, 7]);
        assert_eq!(reader.read_block(&mut buf).unwrap(), ReadOutcome::End);
        assert_eq!(reader.read_block(&mut buf).unwrap(), ReadOutcome::End);
        assert!(!reader.is_error());
    }

    #[test]
    fn test_partial_block_is_a_short_read() {
        let file = raw_file(&counting(6));
        let mut reader = FileReader::open(file.path()).unwrap();
        let mut buf = [0u8; 4];

        assert_eq!(reader.read_block(&mut buf).unwrap(), ReadOutcome::Filled);
        assert!(matches!(
            reader.read_block(&mut buf),
            Err(Error::ShortRead {
                expected: 4,
                got: 2
            })
        ));
        assert!(reader.is_error());
        assert!(matches!(reader.read_block(&mut buf), Err(Error::Unusable)));
    }

    #[test]
    fn test_seek_raw() {
        let file = raw_file(&counting(12));
        let mut reader = FileReader::open(file.path()).unwrap();
        let mut buf = [0u8; 4];

        assert!(reader.seek(8).unwrap());
        assert_eq!(reader.read_block(&mut buf).unwrap(), ReadOutcome::Filled);
        assert_eq!(buf, [8, 9, 10, 11]);
        assert!(!reader.seek(12).unwrap());
        assert!(!reader.seek(100).unwrap());
    }

    #[test]
    fn test_gzip_is_selected_by_suffix() {
        let file = gz_file(&counting(12));
        assert!(is_gzip(file.path()));
        let mut reader = FileReader::open(file.path()).unwrap();
        let mut buf = [0u8; 4];

        assert!(reader.seek(4).unwrap());
        assert_eq!(reader.read_block(&mut buf).unwrap(), ReadOutcome::Filled);
        assert_eq!(buf, [4, 5, 6, 7]);
        assert_eq!(reader.read_block(&mut buf).unwrap(), ReadOutcome::Filled);
        assert_eq!(reader.read_block(&mut buf).unwrap(), ReadOutcome::End);
    }

    #[test]
    fn test_gzip_seek_past_end() {
        let file = gz_file(&counting(8));
        let mut reader = FileReader::open(file.path()).unwrap();
        assert!(!reader.seek(16).unwrap());
    }

    #[test]
    fn test_gzip_seek_to_exact_end() {
        let raw = raw_file(&counting(16));
        let gz = gz_file(&counting(16));
        let mut raw_reader = FileReader::open(raw.path()).unwrap();
        let mut gz_reader = FileReader::open(gz.path()).unwrap();
        assert!(!raw_reader.seek(16).unwrap());
        assert!(!gz_reader.seek(16).unwrap());

        let mut gz_reader = FileReader::open(gz.path()).unwrap();
        let mut buf = [0u8; 8];
        assert!(gz_reader.seek(8).unwrap());
        assert_eq!(gz_reader.read_block(&mut buf).unwrap(), ReadOutcome::Filled);
        assert_eq!(buf, [8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(gz_reader.read_block(&mut buf).unwrap(), ReadOutcome::End);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FileReader::open("/nonexistent/run_0001.data"),
            Err(Error::Io(_))
        ));
    }
}

//! Positioned reads from a vendor data file.
//!
//! A [`DataChannel`] owns the open file of one raw source.  Any failed or
//! short read closes the channel; every later read fails with
//! [`ReadError::Closed`] until the source is reopened.

use crate::byteswap::{decode_f32s, ByteOrderKind};
use nmrdata_core::NmrDataError;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Data truncated at offset {offset}: expected {expected} bytes, got {got}")]
    Truncated {
        offset: u64,
        expected: usize,
        got: usize,
    },
    #[error("Data channel is closed")]
    Closed,
}

impl From<ReadError> for NmrDataError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::Io(e) => NmrDataError::Io(e),
            ReadError::Truncated {
                offset,
                expected,
                got,
            } => NmrDataError::ReadIo {
                offset,
                expected,
                got,
            },
            ReadError::Closed => NmrDataError::ChannelClosed,
        }
    }
}

/// Fill `buf` from `reader`, stopping early only at end of file.
/// Returns the number of bytes read.
pub fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Exclusive handle on an open data file.
#[derive(Debug)]
pub struct DataChannel {
    path: PathBuf,
    file: Option<File>,
    order: ByteOrderKind,
    len: u64,
}

impl DataChannel {
    pub fn open(path: &Path, order: ByteOrderKind) -> Result<Self, ReadError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        log::debug!("Opened data channel {} ({} bytes)", path.display(), len);
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            order,
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn byte_order(&self) -> ByteOrderKind {
        self.order
    }

    /// File length in bytes at open time.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Release the file. Safe to call more than once.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            log::debug!("Closed data channel {}", self.path.display());
        }
    }

    /// Read exactly `buf.len()` bytes at `offset`.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), ReadError> {
        let file = self.file.as_mut().ok_or(ReadError::Closed)?;
        let result = file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| read_fully(file, buf));
        match result {
            Ok(n) if n == buf.len() => Ok(()),
            Ok(n) => {
                log::warn!(
                    "Short read on {} at offset {}: {} of {} bytes, closing",
                    self.path.display(),
                    offset,
                    n,
                    buf.len()
                );
                self.close();
                Err(ReadError::Truncated {
                    offset,
                    expected: buf.len(),
                    got: n,
                })
            }
            Err(e) => {
                log::warn!("Read error on {}: {}, closing", self.path.display(), e);
                self.close();
                Err(ReadError::Io(e))
            }
        }
    }

    /// Read `count` floats starting at `offset`.
    pub fn read_floats_at(&mut self, offset: u64, count: usize) -> Result<Vec<f32>, ReadError> {
        let mut buf = vec![0u8; count * 4];
        self.read_at(offset, &mut buf)?;
        Ok(decode_f32s(&buf, self.order))
    }
}

impl Drop for DataChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byteswap::encode_f32s;
    use std::io::Write;

    fn temp_data(values: &[f32]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.dat");
        let mut f = File::create(&path).unwrap();
        f.write_all(&encode_f32s(values, ByteOrderKind::BigEndian))
            .unwrap();
        (dir, path)
    }

    #[test]
    fn test_positioned_reads() {
        let (_dir, path) = temp_data(&[1.0, 2.0, 3.0, 4.0]);
        let mut ch = DataChannel::open(&path, ByteOrderKind::BigEndian).unwrap();
        assert_eq!(ch.len(), 16);
        assert_eq!(ch.read_floats_at(8, 2).unwrap(), vec![3.0, 4.0]);
        assert_eq!(ch.read_floats_at(0, 1).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_short_read_closes() {
        let (_dir, path) = temp_data(&[1.0, 2.0]);
        let mut ch = DataChannel::open(&path, ByteOrderKind::BigEndian).unwrap();
        match ch.read_floats_at(4, 2) {
            Err(ReadError::Truncated { expected, got, .. }) => {
                assert_eq!(expected, 8);
                assert_eq!(got, 4);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
        assert!(!ch.is_open());
        assert!(matches!(ch.read_floats_at(0, 1), Err(ReadError::Closed)));
    }

    #[test]
    fn test_close_twice() {
        let (_dir, path) = temp_data(&[1.0]);
        let mut ch = DataChannel::open(&path, ByteOrderKind::BigEndian).unwrap();
        ch.close();
        ch.close();
        let err: NmrDataError = ch.read_floats_at(0, 1).unwrap_err().into();
        assert!(matches!(err, NmrDataError::ChannelClosed));
    }
}

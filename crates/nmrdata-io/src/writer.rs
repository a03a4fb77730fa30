//! Float writers with an explicit byte order.

use crate::byteswap::{encode_f32s, ByteOrderKind};
use nmrdata_core::NmrDataError;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

impl From<WriteError> for NmrDataError {
    fn from(e: WriteError) -> Self {
        match e {
            WriteError::Io(e) => NmrDataError::Io(e),
            WriteError::InvalidPath(p) => NmrDataError::Unsupported(format!("output path {}", p)),
        }
    }
}

/// Write `data` as 32-bit floats in `order`.
pub fn write_float_data<W: Write>(
    writer: &mut W,
    data: &[f32],
    order: ByteOrderKind,
) -> Result<(), WriteError> {
    writer.write_all(&encode_f32s(data, order))?;
    Ok(())
}

/// Streams vectors of floats to a writer, counting what was written.
pub struct FloatWriter<W: Write> {
    writer: W,
    order: ByteOrderKind,
    written: usize,
}

impl<W: Write> FloatWriter<W> {
    pub fn new(writer: W, order: ByteOrderKind) -> Self {
        Self {
            writer,
            order,
            written: 0,
        }
    }

    /// Write a single vector (one row).
    pub fn write_vector(&mut self, data: &[f32]) -> Result<(), WriteError> {
        write_float_data(&mut self.writer, data, self.order)?;
        self.written += data.len();
        Ok(())
    }

    /// Write f64 samples, narrowing to f32.
    pub fn write_vector_f64(&mut self, data: &[f64]) -> Result<(), WriteError> {
        let narrowed: Vec<f32> = data.iter().map(|&v| v as f32).collect();
        self.write_vector(&narrowed)
    }

    /// Floats written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

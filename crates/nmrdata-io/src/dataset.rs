//! Materialized dataset container: per-axis layout plus metadata, backed by
//! a flat float file.
//!
//! Axis 0 is stored contiguously; rows along the other axes follow with
//! axis 1 varying fastest.  The descriptor itself is persisted as JSON.

use crate::byteswap::{decode_f32s, encode_f32s, ByteOrderKind};
use crate::reader::{read_fully, ReadError};
use crate::writer::WriteError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Descriptor error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Row {row:?} outside dataset of sizes {sizes:?}")]
    RowOutOfBounds { row: Vec<usize>, sizes: Vec<usize> },
    #[error("Row length {got} does not match axis 0 size {expected}")]
    RowLength { expected: usize, got: usize },
    #[error("Axis {dim} outside dataset of {n_dim} axes")]
    AxisOutOfRange { dim: usize, n_dim: usize },
    #[error("Inconsistent descriptor: {0}")]
    Inconsistent(String),
}

// ─── Layout ─────────────────────────────────────────────────────────────────

/// Sizes and block sizes of each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetLayout {
    sizes: Vec<usize>,
    block_sizes: Vec<usize>,
    n_blocks: Vec<usize>,
}

impl DatasetLayout {
    pub fn new(n_dim: usize) -> Self {
        Self {
            sizes: vec![1; n_dim],
            block_sizes: vec![1; n_dim],
            n_blocks: vec![1; n_dim],
        }
    }

    pub fn n_dim(&self) -> usize {
        self.sizes.len()
    }

    fn check_dim(&self, dim: usize) -> Result<(), DatasetError> {
        if dim < self.n_dim() {
            Ok(())
        } else {
            Err(DatasetError::AxisOutOfRange {
                dim,
                n_dim: self.n_dim(),
            })
        }
    }

    pub fn size(&self, dim: usize) -> Option<usize> {
        self.sizes.get(dim).copied()
    }

    pub fn set_size(&mut self, dim: usize, size: usize) -> Result<(), DatasetError> {
        self.check_dim(dim)?;
        self.sizes[dim] = size;
        Ok(())
    }

    pub fn block_size(&self, dim: usize) -> Option<usize> {
        self.block_sizes.get(dim).copied()
    }

    pub fn set_block_size(&mut self, dim: usize, size: usize) -> Result<(), DatasetError> {
        self.check_dim(dim)?;
        self.block_sizes[dim] = size.max(1);
        Ok(())
    }

    /// Blocks along `dim`; valid after [`dim_dataset`](Self::dim_dataset).
    pub fn n_blocks(&self, dim: usize) -> Option<usize> {
        self.n_blocks.get(dim).copied()
    }

    /// Floats in one axis-0 row.
    pub fn row_len(&self) -> usize {
        self.sizes.first().copied().unwrap_or(0)
    }

    /// Per-axis vectors agree in length and there is at least one axis.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.sizes.is_empty() {
            return Err(DatasetError::Inconsistent("no axes".into()));
        }
        if self.block_sizes.len() != self.sizes.len() || self.n_blocks.len() != self.sizes.len() {
            return Err(DatasetError::Inconsistent(format!(
                "{} sizes, {} block sizes, {} block counts",
                self.sizes.len(),
                self.block_sizes.len(),
                self.n_blocks.len()
            )));
        }
        Ok(())
    }

    /// Derive the block counts from sizes and block sizes.
    pub fn dim_dataset(&mut self) {
        self.n_blocks = self
            .sizes
            .iter()
            .zip(&self.block_sizes)
            .map(|(&size, &bs)| size.div_ceil(bs.max(1)))
            .collect();
    }

    /// Total number of stored floats.
    pub fn total_points(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Number of axis-0 rows.
    pub fn n_rows(&self) -> usize {
        self.sizes.iter().skip(1).product()
    }

    /// Flat row number of `pt` (one index per axis ≥ 1, axis 1 fastest).
    pub fn row_index(&self, pt: &[usize]) -> Option<usize> {
        if pt.len() + 1 != self.n_dim() {
            return None;
        }
        let mut row = 0;
        let mut stride = 1;
        for (i, &p) in pt.iter().enumerate() {
            let size = self.sizes[i + 1];
            if p >= size {
                return None;
            }
            row += p * stride;
            stride *= size;
        }
        Some(row)
    }
}

// ─── Axis metadata ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisParams {
    pub complex: bool,
    pub sf: f64,
    pub sw: f64,
    pub ref_value: f64,
    pub ref_point: f64,
    pub freq_domain: bool,
    pub nucleus: String,
    pub label: String,
    pub reversed: bool,
    pub ph0: f64,
    pub ph1: f64,
}

impl Default for AxisParams {
    fn default() -> Self {
        Self {
            complex: false,
            sf: 1.0,
            sw: 1.0,
            ref_value: 0.0,
            ref_point: 0.0,
            freq_domain: false,
            nucleus: String::new(),
            label: String::new(),
            reversed: false,
            ph0: 0.0,
            ph1: 0.0,
        }
    }
}

// ─── Dataset ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub name: String,
    /// Backing float file.
    pub file: PathBuf,
    pub layout: DatasetLayout,
    pub axes: Vec<AxisParams>,
    pub scale: f64,
    pub data_type: i32,
    pub byte_order: ByteOrderKind,
    pub header_size: u64,
}

impl Dataset {
    pub fn new(
        file: impl Into<PathBuf>,
        name: impl Into<String>,
        layout: DatasetLayout,
        byte_order: ByteOrderKind,
        header_size: u64,
    ) -> Self {
        let n_dim = layout.n_dim();
        Self {
            id: Uuid::new_v4(),
            created: Utc::now(),
            name: name.into(),
            file: file.into(),
            layout,
            axes: vec![AxisParams::default(); n_dim],
            scale: 1.0,
            data_type: 0,
            byte_order,
            header_size,
        }
    }

    pub fn n_dim(&self) -> usize {
        self.layout.n_dim()
    }

    pub fn size(&self, dim: usize) -> Option<usize> {
        self.layout.size(dim)
    }

    /// Size in real points (complex axes count pairs once).
    pub fn size_real(&self, dim: usize) -> Option<usize> {
        let size = self.layout.size(dim)?;
        let axis = self.axes.get(dim)?;
        Some(if axis.complex { size / 2 } else { size })
    }

    pub fn axis(&self, dim: usize) -> Option<&AxisParams> {
        self.axes.get(dim)
    }

    pub fn axis_mut(&mut self, dim: usize) -> Option<&mut AxisParams> {
        self.axes.get_mut(dim)
    }

    /// Layout and axis metadata describe the same axes.
    pub fn validate(&self) -> Result<(), DatasetError> {
        self.layout.validate()?;
        if self.axes.len() != self.layout.n_dim() {
            return Err(DatasetError::Inconsistent(format!(
                "{} axes for a {}-axis layout",
                self.axes.len(),
                self.layout.n_dim()
            )));
        }
        Ok(())
    }

    // ─── Descriptor persistence ─────────────────────────────────────────

    pub fn save_json(&self, path: &Path) -> Result<(), DatasetError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Saved dataset descriptor {} -> {}", self.name, path.display());
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, DatasetError> {
        let text = std::fs::read_to_string(path)?;
        let dataset: Self = serde_json::from_str(&text)?;
        dataset.validate()?;
        Ok(dataset)
    }

    // ─── Row access ─────────────────────────────────────────────────────

    fn row_offset(&self, pt: &[usize]) -> Result<u64, DatasetError> {
        let row = self
            .layout
            .row_index(pt)
            .ok_or_else(|| DatasetError::RowOutOfBounds {
                row: pt.to_vec(),
                sizes: self.layout.sizes.clone(),
            })?;
        Ok(self.header_size + (row * self.layout.row_len() * 4) as u64)
    }

    /// Read the axis-0 row at `pt` (one index per axis ≥ 1).
    pub fn read_row(&self, pt: &[usize]) -> Result<Vec<f32>, DatasetError> {
        let offset = self.row_offset(pt)?;
        let mut file = File::open(&self.file)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.layout.row_len() * 4];
        let got = read_fully(&mut file, &mut buf)?;
        if got < buf.len() {
            return Err(ReadError::Truncated {
                offset,
                expected: buf.len(),
                got,
            }
            .into());
        }
        Ok(decode_f32s(&buf, self.byte_order))
    }

    /// Write the axis-0 row at `pt`, creating the file if needed.
    pub fn write_row(&self, pt: &[usize], row: &[f32]) -> Result<(), DatasetError> {
        if row.len() != self.layout.row_len() {
            return Err(DatasetError::RowLength {
                expected: self.layout.row_len(),
                got: row.len(),
            });
        }
        let offset = self.row_offset(pt)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.file)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&encode_f32s(row, self.byte_order))
            .map_err(WriteError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_2d() -> DatasetLayout {
        let mut layout = DatasetLayout::new(2);
        layout.set_size(0, 8).unwrap();
        layout.set_block_size(0, 8).unwrap();
        layout.set_size(1, 3).unwrap();
        layout.set_block_size(1, 1).unwrap();
        layout.dim_dataset();
        layout
    }

    #[test]
    fn test_layout_blocks() {
        let layout = layout_2d();
        assert_eq!(layout.n_blocks(0), Some(1));
        assert_eq!(layout.n_blocks(1), Some(3));
        assert_eq!(layout.total_points(), 24);
        assert_eq!(layout.n_rows(), 3);
        assert_eq!(layout.row_index(&[2]), Some(2));
        assert_eq!(layout.row_index(&[3]), None);
        assert_eq!(layout.row_index(&[]), None);
    }

    #[test]
    fn test_row_index_axis1_fastest() {
        let mut layout = DatasetLayout::new(3);
        layout.set_size(0, 4).unwrap();
        layout.set_size(1, 5).unwrap();
        layout.set_size(2, 2).unwrap();
        assert_eq!(layout.row_index(&[1, 1]), Some(6));
    }

    #[test]
    fn test_write_then_read_rows() {
        let dir = tempfile::tempdir().unwrap();
        let ds = Dataset::new(
            dir.path().join("rows.dat"),
            "rows",
            layout_2d(),
            ByteOrderKind::LittleEndian,
            0,
        );
        let row: Vec<f32> = (0..8).map(|v| v as f32).collect();
        ds.write_row(&[0], &[0.0; 8]).unwrap();
        ds.write_row(&[2], &row).unwrap();
        assert_eq!(ds.read_row(&[2]).unwrap(), row);
        assert!(matches!(ds.read_row(&[1]), Ok(r) if r == vec![0.0; 8]));
        assert!(matches!(
            ds.write_row(&[0], &[1.0]),
            Err(DatasetError::RowLength { .. })
        ));
    }

    #[test]
    fn test_descriptor_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut ds = Dataset::new("x.dat", "demo", layout_2d(), ByteOrderKind::BigEndian, 0);
        ds.axis_mut(0).unwrap().complex = true;
        ds.axis_mut(1).unwrap().reversed = true;
        let path = dir.path().join("demo.json");
        ds.save_json(&path).unwrap();
        let loaded = Dataset::load_json(&path).unwrap();
        assert_eq!(loaded, ds);
        assert_eq!(loaded.size_real(0), Some(4));
        assert_eq!(loaded.size_real(1), Some(3));
    }

    #[test]
    fn test_axis_outside_layout() {
        let mut layout = layout_2d();
        assert_eq!(layout.size(2), None);
        assert_eq!(layout.block_size(2), None);
        assert_eq!(layout.n_blocks(2), None);
        assert!(matches!(
            layout.set_size(2, 4),
            Err(DatasetError::AxisOutOfRange { dim: 2, n_dim: 2 })
        ));
        assert!(matches!(
            layout.set_block_size(5, 1),
            Err(DatasetError::AxisOutOfRange { dim: 5, .. })
        ));

        let mut ds = Dataset::new("x.dat", "demo", layout, ByteOrderKind::BigEndian, 0);
        assert!(ds.axis(2).is_none());
        assert!(ds.axis_mut(2).is_none());
        assert_eq!(ds.size(2), None);
        assert_eq!(ds.size_real(2), None);
    }

    #[test]
    fn test_load_rejects_mismatched_axes() {
        let dir = tempfile::tempdir().unwrap();
        let mut ds = Dataset::new("x.dat", "demo", layout_2d(), ByteOrderKind::BigEndian, 0);
        ds.axes.pop();
        let path = dir.path().join("bad.json");
        ds.save_json(&path).unwrap();
        assert!(matches!(
            Dataset::load_json(&path),
            Err(DatasetError::Inconsistent(_))
        ));

        let empty = Dataset::new("x.dat", "empty", DatasetLayout::new(0), ByteOrderKind::BigEndian, 0);
        let path = dir.path().join("empty.json");
        empty.save_json(&path).unwrap();
        assert!(Dataset::load_json(&path).is_err());
    }
}

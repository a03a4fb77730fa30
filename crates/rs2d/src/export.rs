//! Dataset materialization and RS2D export.

use crate::data::{Rs2dData, Rs2dError, DATA_FILE_NAME, HEADER_FILE_NAME, PROC_DIR, SERIES_FILE_NAME};
use crate::parameter::DIMENSION_PARAMS;
use nmrdata_core::{NmrData, Value, MAXDIM};
use nmrdata_io::{ByteOrderKind, Dataset, DatasetError, DatasetLayout, FloatWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Suggested dataset name `<root>_<num>_<procnum>` for a file laid out as
/// `<root>/<num>/Proc/<procnum>/data.dat`. Spaces in the root become `_`.
pub fn suggest_name(path: &Path) -> String {
    let file = if path.is_dir() {
        path.join(DATA_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let name_of = |p: Option<&Path>| -> String {
        p.and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let proc_num = file.parent();
    let num = proc_num.and_then(Path::parent).and_then(Path::parent);
    let root = num.and_then(Path::parent);
    format!(
        "{}_{}_{}",
        name_of(root).replace(' ', "_"),
        name_of(num),
        name_of(proc_num)
    )
}

/// Is `proc_num` a `Proc/<number>` directory?
pub fn is_valid_dataset_path(proc_num: &Path) -> bool {
    let numeric = proc_num
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false);
    let in_proc = proc_num
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        == Some(PROC_DIR);
    numeric && in_proc
}

/// Write `dataset` as an RS2D `data.dat`: big-endian complex rows, axis 1
/// varying fastest and reversed. Real rows get a zero imaginary part.
pub fn save_to_rs2d_file(dataset: &Dataset, path: &Path) -> Result<(), Rs2dError> {
    dataset.validate()?;
    let n_dim = dataset.n_dim();
    let complex0 = dataset.axis(0).is_some_and(|a| a.complex);
    let sizes = (1..n_dim)
        .map(|i| {
            dataset
                .size_real(i)
                .ok_or(DatasetError::AxisOutOfRange { dim: i, n_dim })
        })
        .collect::<Result<Vec<usize>, _>>()?;

    let out = BufWriter::new(File::create(path)?);
    let mut writer = FloatWriter::new(out, ByteOrderKind::BigEndian);

    let mut write_row = |pt: &[usize]| -> Result<(), Rs2dError> {
        let row = dataset.read_row(pt)?;
        if complex0 {
            writer.write_vector(&row)?;
        } else {
            let interleaved: Vec<f32> = row.iter().flat_map(|&v| [v, 0.0]).collect();
            writer.write_vector(&interleaved)?;
        }
        Ok(())
    };

    if n_dim == 1 {
        write_row(&[])?;
    } else {
        let total: usize = sizes.iter().product();
        let mut pt = vec![0usize; sizes.len()];
        for flat in 0..total {
            let mut rem = flat;
            for (i, &size) in sizes.iter().enumerate() {
                pt[i] = rem % size;
                rem /= size;
            }
            pt[0] = sizes[0] - 1 - pt[0];
            write_row(&pt)?;
        }
    }

    writer.flush()?;
    log::info!("Wrote {} floats to {}", writer.written(), path.display());
    Ok(())
}

impl Rs2dData {
    /// Build a dataset descriptor over this source's `data.dat`.
    ///
    /// Sweep widths are reset first so they come from the header rather than
    /// any override.
    pub fn to_dataset(&mut self, name: Option<&str>) -> Result<Dataset, Rs2dError> {
        let path = self.file_path().join(DATA_FILE_NAME);
        let n_dim = self.n_dim().max(1);

        let mut layout = DatasetLayout::new(n_dim);
        for i in 0..n_dim {
            if i == 0 {
                layout.set_size(i, 2 * self.size(0))?;
                layout.set_block_size(i, 2 * self.size(0))?;
            } else {
                layout.set_size(i, self.size(i))?;
                layout.set_block_size(i, 1)?;
            }
        }
        layout.dim_dataset();

        let name = match name {
            Some(n) => n.to_string(),
            None => suggest_name(&path),
        };
        let mut dataset = Dataset::new(&path, name, layout, ByteOrderKind::BigEndian, 0);
        for i in 0..n_dim {
            self.reset_sw(i);
            let sf = self.sf(i)?;
            let sw = self.sw(i)?;
            let ref_value = self.ref_value(i)?;
            let nucleus = self.tn(i)?;
            let axis = dataset
                .axis_mut(i)
                .ok_or(DatasetError::AxisOutOfRange { dim: i, n_dim })?;
            axis.complex = i == 0;
            axis.sf = sf;
            axis.sw = sw;
            axis.ref_value = ref_value;
            axis.ref_point = self.size(i) as f64 / 2.0;
            axis.freq_domain = true;
            axis.label = format!("{}{}", nucleus, i + 1);
            axis.nucleus = nucleus;
        }
        if let Some(axis) = dataset.axis_mut(1) {
            axis.reversed = true;
        }
        dataset.scale = self.scale();
        dataset.data_type = 0;
        log::info!("Materialized dataset {} from {}", dataset.name, path.display());
        Ok(dataset)
    }

    /// Record the dataset's real sizes as `MATRIX_DIMENSION_*`.
    pub fn set_header_matrix_dimensions(&mut self, dataset: &Dataset) {
        for (i, param) in DIMENSION_PARAMS.iter().enumerate().take(MAXDIM) {
            if let Some(size) = dataset.size_real(i) {
                self.header.put(param.name(), Value::Number(size as f64));
            }
        }
    }

    /// Record per-axis phases as `PHASE_0` / `PHASE_1`.
    pub fn set_header_phases(&mut self, dataset: &Dataset) {
        let ph0: Vec<f64> = dataset.axes.iter().map(|a| a.ph0).collect();
        let ph1: Vec<f64> = dataset.axes.iter().map(|a| a.ph1).collect();
        self.header.put("PHASE_0", Value::NumberList(ph0));
        self.header.put("PHASE_1", Value::NumberList(ph1));
    }

    /// Update the header from `dataset` and write everything into the
    /// directory holding the dataset's file.
    pub fn save_dataset(&mut self, dataset: &Dataset) -> Result<PathBuf, Rs2dError> {
        self.set_header_matrix_dimensions(dataset);
        self.set_header_phases(dataset);
        let proc_num = dataset
            .file
            .parent()
            .ok_or_else(|| Rs2dError::InvalidPath(dataset.file.clone()))?
            .to_path_buf();
        self.write_output_file(dataset, &proc_num)?;
        Ok(proc_num)
    }

    /// Write `data.dat`, `header.xml` and (when one was read) `Serie.xml`
    /// into a `Proc/<number>` directory.
    pub fn write_output_file(&self, dataset: &Dataset, proc_num: &Path) -> Result<(), Rs2dError> {
        if !is_valid_dataset_path(proc_num) {
            return Err(Rs2dError::InvalidPath(proc_num.to_path_buf()));
        }
        std::fs::create_dir_all(proc_num)?;
        save_to_rs2d_file(dataset, &proc_num.join(DATA_FILE_NAME))?;
        self.header.write(&proc_num.join(HEADER_FILE_NAME))?;
        if let Some(series) = &self.series {
            std::fs::write(proc_num.join(SERIES_FILE_NAME), series)?;
        }
        log::info!("Saved SPINit dataset to {}", proc_num.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_name() {
        let p = Path::new("/data/My Study/3/Proc/1/data.dat");
        assert_eq!(suggest_name(p), "My_Study_3_1");
    }

    #[test]
    fn test_valid_dataset_path() {
        assert!(is_valid_dataset_path(Path::new("/x/3/Proc/12")));
        assert!(!is_valid_dataset_path(Path::new("/x/3/Proc/a1")));
        assert!(!is_valid_dataset_path(Path::new("/x/3/Data/1")));
    }
}

//! RS2D / SPINit raw data source.
//!
//! An experiment directory holds `header.xml` (typed parameters),
//! `data.dat` (big-endian 32-bit floats, direct dimension fastest) and an
//! optional `Serie.xml`.  Opening parses the header, decodes the
//! acquisition scheme and opens the data channel; vectors are then read on
//! demand.

use crate::header::Header;
use crate::parameter::*;
use nmrdata_core::{
    resolve_phase_mods, AcqOrder, AcquisitionScheme, AxisCache, DimScheme, FtType, NmrData,
    NmrDataError, ParameterCache, ParameterStore, RawVector, Resolution, SampleSchedule, Samples,
    VendorPar, MAXDIM,
};
use nmrdata_io::{ByteOrderKind, DataChannel, DatasetError, ReadError, WriteError};
use num_complex::Complex64;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DATA_FILE_NAME: &str = "data.dat";
pub const HEADER_FILE_NAME: &str = "header.xml";
pub const SERIES_FILE_NAME: &str = "Serie.xml";
pub const PROC_DIR: &str = "Proc";

const FLOAT_BYTES: usize = 4;

#[derive(Error, Debug)]
pub enum Rs2dError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid header: {0}")]
    Header(String),
    #[error("Invalid SPINit path: {0}")]
    InvalidPath(PathBuf),
    #[error(transparent)]
    Data(#[from] NmrDataError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl From<ReadError> for Rs2dError {
    fn from(e: ReadError) -> Self {
        Rs2dError::Data(e.into())
    }
}

impl From<Rs2dError> for NmrDataError {
    fn from(e: Rs2dError) -> Self {
        match e {
            Rs2dError::Io(e) => NmrDataError::Io(e),
            Rs2dError::Header(msg) => NmrDataError::HeaderParse(msg),
            Rs2dError::InvalidPath(p) => {
                NmrDataError::Unsupported(format!("invalid SPINit path {}", p.display()))
            }
            Rs2dError::Data(e) => e,
            Rs2dError::Dataset(e) => NmrDataError::Unsupported(e.to_string()),
            Rs2dError::Write(e) => e.into(),
        }
    }
}

/// Options for opening an RS2D source.
#[derive(Debug, Clone, Default)]
pub struct Rs2dOptions {
    /// Read a processed (`Proc/<n>`) dataset instead of a raw FID.
    pub processed: bool,
    /// Non-uniform sampling schedule to attach at open time.
    pub nus_file: Option<PathBuf>,
    /// Treat the NUS schedule as a demo (synthetic) schedule.
    pub nus_demo: bool,
}

/// Does `dir` contain both `header.xml` and `data.dat`?
pub fn has_fid_files(dir: &Path) -> bool {
    dir.join(HEADER_FILE_NAME).is_file() && dir.join(DATA_FILE_NAME).is_file()
}

/// Resolve `path` to an experiment directory: the directory itself, or the
/// parent of a `data.dat` file.
pub fn find_fid(path: &Path) -> Option<PathBuf> {
    if has_fid_files(path) {
        return Some(path.to_path_buf());
    }
    let parent = path.parent()?;
    if path.file_name().and_then(|n| n.to_str()) == Some(DATA_FILE_NAME) && has_fid_files(parent)
    {
        return Some(parent.to_path_buf());
    }
    None
}

/// An open RS2D source.
#[derive(Debug)]
pub struct Rs2dData {
    path: PathBuf,
    pub(crate) header: Header,
    pub(crate) series: Option<String>,
    channel: DataChannel,
    n_dim: usize,
    td_size: [usize; MAXDIM],
    dims: Vec<DimScheme>,
    exchange_xy: bool,
    negate_pairs: bool,
    cache: ParameterCache,
    group_delay: f64,
    schedule: Option<SampleSchedule>,
    acq_order: AcqOrder,
    n_vectors: usize,
    np: usize,
    tbytes: usize,
    obs_nucleus: String,
    scale: f64,
    temp_k: f64,
}

impl Rs2dData {
    /// Open an experiment directory (or its `data.dat`).
    pub fn open(path: &Path, options: &Rs2dOptions) -> Result<Self, Rs2dError> {
        let dir = find_fid(path).ok_or_else(|| Rs2dError::InvalidPath(path.to_path_buf()))?;
        log::info!("Opening RS2D file: {}", dir.display());

        let header = Header::read(&dir.join(HEADER_FILE_NAME))?;
        let series_path = dir.join(SERIES_FILE_NAME);
        let series = if series_path.is_file() {
            Some(std::fs::read_to_string(&series_path)?)
        } else {
            None
        };
        let channel = DataChannel::open(&dir.join(DATA_FILE_NAME), ByteOrderKind::BigEndian)?;

        let mut data = Self {
            path: dir,
            header,
            series,
            channel,
            n_dim: 0,
            td_size: [1; MAXDIM],
            dims: vec![DimScheme::real(); MAXDIM],
            exchange_xy: false,
            negate_pairs: false,
            cache: ParameterCache::new(),
            group_delay: 0.0,
            schedule: None,
            acq_order: AcqOrder::default(),
            n_vectors: 1,
            np: 1,
            tbytes: 1,
            obs_nucleus: String::new(),
            scale: 1.0,
            temp_k: 298.15,
        };
        data.read_layout(options.processed)?;

        if let Some(nus) = &options.nus_file {
            data.schedule = Some(SampleSchedule::read_file(nus, options.nus_demo)?);
        }
        Ok(data)
    }

    fn read_layout(&mut self, processed: bool) -> Result<(), Rs2dError> {
        self.group_delay = self.read_group_delay();
        self.obs_nucleus = self.header.string_value(Parameter::OBSERVED_NUCLEUS.name())?;
        let obs_sw = self.header.double_value(Parameter::SPECTRAL_WIDTH.name())?;
        self.temp_k = match self.header.optional_double(Parameter::SAMPLE_TEMPERATURE.name()) {
            Some(t) => t,
            None => {
                log::warn!("No SAMPLE_TEMPERATURE in header, using {}", self.temp_k);
                self.temp_k
            }
        };

        let nuclei: Vec<String> = NUCLEUS_PARAMS
            .iter()
            .map(|p| self.header.optional_string(p.name()).unwrap_or_default())
            .collect();
        let obs_freq = nuclei
            .iter()
            .position(|n| *n == self.obs_nucleus)
            .map(|i| self.sf(i))
            .transpose()?;

        if processed {
            if let Ok(modes) = self.header.string_list(Parameter::DATA_REPRESENTATION.name()) {
                for (i, mode) in modes.iter().take(MAXDIM).enumerate() {
                    self.dims[i].is_complex = mode == "COMPLEX";
                }
            }
        }

        let size_params = if processed {
            &DIMENSION_PARAMS
        } else {
            &ACQUISITION_DIMENSION_PARAMS
        };
        self.n_dim = 0;
        for i in 0..MAXDIM {
            let dim_size = self
                .header
                .optional(size_params[i].name())
                .and_then(|v| v.as_i64())
                .unwrap_or(1)
                .max(0) as usize;
            let axis = self.axis(i)?;
            match obs_freq {
                Some(freq) if nuclei[i] == self.obs_nucleus => {
                    axis.sf.set(freq);
                    axis.sw.set(obs_sw);
                }
                _ => {
                    let sf = axis.sf.get_or_resolve(|| self.resolve_sf(i));
                    axis.sf.set(sf);
                }
            }
            self.td_size[i] = dim_size;
            if dim_size > 1 {
                self.n_dim += 1;
                if i > 0 {
                    self.n_vectors *= dim_size;
                } else {
                    self.np = 2 * dim_size;
                    self.tbytes = dim_size * 2 * FLOAT_BYTES;
                }
            }
        }

        if !processed {
            self.set_ft_params();
        }
        log::info!(
            "RS2D layout: {} dims, sizes {:?}, {} vectors of {} floats",
            self.n_dim,
            &self.td_size[..self.n_dim.max(1)],
            self.n_vectors,
            self.np
        );
        Ok(())
    }

    fn read_group_delay(&self) -> f64 {
        let removed = self
            .header
            .optional(Parameter::DIGITAL_FILTER_REMOVED.name())
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        match self.header.optional_double(Parameter::DIGITAL_FILTER_SHIFT.name()) {
            Some(shift) if !removed => {
                log::info!("Using group delay: {}", shift);
                shift
            }
            _ => 0.0,
        }
    }

    fn set_ft_params(&mut self) {
        let phase_mod = self.header.string_list(Parameter::PHASE_MOD.name()).ok();
        let acq_mode = self
            .header
            .string_list(Parameter::ACQUISITION_MODE.name())
            .ok();
        let mods = resolve_phase_mods(phase_mod.as_deref(), acq_mode.as_deref());
        let scheme = AcquisitionScheme::decode(&mods, MAXDIM);
        let sizes = scheme.time_domain_sizes(&self.td_size);
        self.td_size.copy_from_slice(&sizes);
        self.exchange_xy = scheme.exchange_xy;
        self.negate_pairs = scheme.negate_pairs;
        self.dims = scheme.dims;
    }

    // ─── Parameter resolution ───────────────────────────────────────────

    fn axis(&self, dim: usize) -> nmrdata_core::Result<&AxisCache> {
        self.cache
            .axis(dim)
            .ok_or(NmrDataError::UnsupportedDimension { dim, max: MAXDIM })
    }

    fn offset(&self, dim: usize) -> f64 {
        self.header
            .optional_double(OFFSET_FREQ_PARAMS[dim].name())
            .unwrap_or(0.0)
    }

    fn resolve_sf(&self, dim: usize) -> Resolution {
        match self.header.optional_double(BASE_FREQ_PARAMS[dim].name()) {
            Some(base) => Resolution::Derived(base + self.offset(dim) / 1.0e6),
            None => Resolution::Default(1.0),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    pub fn observed_nucleus(&self) -> &str {
        &self.obs_nucleus
    }

    /// Bytes per direct-dimension vector.
    pub fn bytes_per_vector(&self) -> usize {
        self.tbytes
    }

    pub fn exchange_xy(&self) -> bool {
        self.exchange_xy
    }

    // ─── Vector reads ───────────────────────────────────────────────────

    fn scheme(&self, dim: usize) -> Option<&DimScheme> {
        self.dims.get(dim)
    }

    fn decode_direct(&self, floats: &[f32], real: bool) -> RawVector {
        let scale = self.scale;
        let pair = |j: usize| -> (f64, f64) {
            let px = floats[j] as f64;
            let py = floats[j + 1] as f64;
            if self.exchange_xy {
                (py / scale, px / scale)
            } else {
                (px / scale, -py / scale)
            }
        };
        if real {
            let mut data = vec![0.0; self.np];
            for j in (0..self.np).step_by(2) {
                let (re, im) = pair(j);
                data[j] = re;
                data[j + 1] = im;
            }
            if self.negate_pairs {
                for j in (2..self.np).step_by(4) {
                    data[j] = -data[j];
                    data[j + 1] = -data[j + 1];
                }
            }
            let mut v = RawVector::real(0);
            v.samples = Samples::Real(data);
            v
        } else {
            let mut data: Vec<Complex64> = (0..self.np)
                .step_by(2)
                .map(|j| {
                    let (re, im) = pair(j);
                    Complex64::new(re, im)
                })
                .collect();
            if self.negate_pairs {
                for c in data.iter_mut().skip(1).step_by(2) {
                    *c = -*c;
                }
            }
            let mut v = RawVector::complex(0);
            v.samples = Samples::Complex(data);
            v
        }
    }

    /// Byte distance between consecutive rows along `dim`.
    fn stride(&self, dim: usize) -> u64 {
        let mut stride = self.tbytes as u64;
        for i in 1..dim {
            let n_per = if self.is_complex(i) { 2 } else { 1 };
            stride *= (self.td_size[i] * n_per) as u64;
        }
        stride
    }

    /// Physical row of logical position `i` along an indirect dimension.
    fn physical_row(&self, i: usize) -> Option<usize> {
        match &self.schedule {
            Some(schedule) => schedule.lookup(&[i / 2]).map(|p| p * 2 + i % 2),
            None => Some(i),
        }
    }
}

impl NmrData for Rs2dData {
    fn vendor(&self) -> &'static str {
        "rs2d"
    }

    fn file_path(&self) -> &Path {
        &self.path
    }

    fn n_dim(&self) -> usize {
        self.n_dim
    }

    fn size(&self, dim: usize) -> usize {
        self.td_size.get(dim).copied().unwrap_or(0)
    }

    fn set_size(&mut self, dim: usize, size: usize) {
        if let Some(s) = self.td_size.get_mut(dim) {
            *s = size;
        }
    }

    fn n_vectors(&self) -> usize {
        self.n_vectors
    }

    fn n_points(&self) -> usize {
        self.np / 2
    }

    fn is_fid(&self) -> bool {
        match self.header.int_list(Parameter::STATE.name()) {
            Ok(states) if !states.is_empty() => states[0] == 0,
            _ => {
                log::debug!("Unable to find state parameter. Setting state to FID.");
                true
            }
        }
    }

    fn is_complex(&self, dim: usize) -> bool {
        self.scheme(dim).map(|s| s.is_complex).unwrap_or(false)
    }

    fn set_complex(&mut self, dim: usize, value: bool) {
        if let Some(s) = self.dims.get_mut(dim) {
            s.is_complex = value;
        }
    }

    fn ft_type(&self, dim: usize) -> FtType {
        self.scheme(dim).map(|s| s.ft_type).unwrap_or(FtType::Real)
    }

    fn symbolic_coefs(&self, dim: usize) -> Option<String> {
        self.scheme(dim).and_then(|s| s.symbolic_coefs.clone())
    }

    fn coefs(&self, dim: usize) -> Vec<f64> {
        self.scheme(dim).map(|s| s.coefs.clone()).unwrap_or_default()
    }

    fn negate_imag(&self, dim: usize) -> bool {
        self.scheme(dim).map(|s| s.negate_imag).unwrap_or(false)
    }

    fn sf(&self, dim: usize) -> nmrdata_core::Result<f64> {
        let axis = self.axis(dim)?;
        Ok(axis.sf.get_or_resolve(|| self.resolve_sf(dim)))
    }

    fn set_sf(&mut self, dim: usize, value: f64) {
        if let Ok(axis) = self.axis(dim) {
            axis.sf.set(value);
        }
    }

    fn reset_sf(&mut self, dim: usize) {
        if let Ok(axis) = self.axis(dim) {
            axis.sf.reset();
        }
    }

    fn sw(&self, dim: usize) -> nmrdata_core::Result<f64> {
        let axis = self.axis(dim)?;
        Ok(axis.sw.get_or_resolve(|| {
            match self.header.optional_double(SW_PARAMS[dim].name()) {
                Some(sw) => Resolution::Derived(sw),
                None => Resolution::Default(1.0),
            }
        }))
    }

    fn set_sw(&mut self, dim: usize, value: f64) {
        if let Ok(axis) = self.axis(dim) {
            axis.sw.set(value);
        }
    }

    fn reset_sw(&mut self, dim: usize) {
        if let Ok(axis) = self.axis(dim) {
            axis.sw.reset();
        }
    }

    fn ref_value(&self, dim: usize) -> nmrdata_core::Result<f64> {
        let axis = self.axis(dim)?;
        Ok(axis.reference.get_or_resolve(|| {
            let sr = self
                .header
                .optional(Parameter::SR.name())
                .and_then(|v| v.as_f64_list())
                .and_then(|list| list.get(dim).copied());
            match sr {
                Some(sr) => {
                    let offset = self.offset(dim);
                    let sf = axis.sf.get_or_resolve(|| self.resolve_sf(dim));
                    Resolution::Derived((sr + offset) / (sf - offset / 1.0e6))
                }
                None => Resolution::Default(1.0),
            }
        }))
    }

    fn set_ref(&mut self, dim: usize, value: f64) {
        if let Ok(axis) = self.axis(dim) {
            axis.reference.set(value);
        }
    }

    fn reset_ref(&mut self, dim: usize) {
        if let Ok(axis) = self.axis(dim) {
            axis.reference.reset();
        }
    }

    fn tn(&self, dim: usize) -> nmrdata_core::Result<String> {
        let axis = self.axis(dim)?;
        Ok(axis.nucleus.get_or_resolve(|| {
            self.header
                .optional_string(NUCLEUS_PARAMS[dim].name())
                .unwrap_or_default()
        }))
    }

    fn group_delay(&self) -> f64 {
        self.group_delay
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn temp_k(&self) -> f64 {
        self.temp_k
    }

    fn solvent(&self) -> String {
        self.header
            .optional_string(Parameter::SOLVENT.name())
            .unwrap_or_default()
    }

    fn sequence(&self) -> String {
        self.header
            .optional_string(Parameter::SEQUENCE_NAME.name())
            .unwrap_or_default()
    }

    fn pars(&self) -> Vec<VendorPar> {
        self.header.pars()
    }

    fn read_vector(&mut self, i_vec: usize, real: bool) -> nmrdata_core::Result<RawVector> {
        if i_vec >= self.n_vectors {
            return Err(NmrDataError::IndexOutOfBounds {
                index: i_vec,
                count: self.n_vectors,
            });
        }
        let offset = (i_vec * self.tbytes) as u64;
        let floats = self.channel.read_floats_at(offset, self.np)?;
        let mut vec = self.decode_direct(&floats, real);
        vec.group_delay = self.group_delay;
        vec.set_spectral(self.sw(0)?, self.sf(0)?, self.ref_value(0)?);
        log::debug!("Read direct vector {} ({} points)", i_vec, vec.len());
        Ok(vec)
    }

    fn read_vector_dim(
        &mut self,
        dim: usize,
        i_vec: usize,
        real: bool,
    ) -> nmrdata_core::Result<RawVector> {
        if dim >= MAXDIM {
            return Err(NmrDataError::UnsupportedDimension { dim, max: MAXDIM });
        }
        if dim >= self.n_dim() {
            return Err(NmrDataError::UnsupportedDimension {
                dim,
                max: self.n_dim(),
            });
        }
        if dim == 0 {
            return self.read_vector(i_vec, real);
        }

        let shift = if !real && self.group_delay > 0.0 {
            self.group_delay.round() as usize
        } else {
            0
        };
        let x_col = i_vec + shift;
        if x_col >= self.n_points() {
            return Err(NmrDataError::IndexOutOfBounds {
                index: x_col,
                count: self.n_points(),
            });
        }

        let n_per = if self.is_complex(dim) { 2 } else { 1 };
        let n_points = self.size(dim) * n_per;
        let stride = self.stride(dim);
        let col_offset = (x_col * FLOAT_BYTES * 2) as u64;
        let rows: Vec<Option<usize>> = (0..n_points).map(|i| self.physical_row(i)).collect();

        let mut vec = if real {
            let mut data = vec![0.0; n_points];
            for (i, row) in rows.iter().enumerate() {
                if let Some(row) = row {
                    let offset = *row as u64 * stride + col_offset;
                    let v = self.channel.read_floats_at(offset, 1)?;
                    data[i] = v[0] as f64 / self.scale;
                }
            }
            let mut v = RawVector::real(0);
            v.samples = Samples::Real(data);
            v
        } else {
            let mut data = vec![Complex64::new(0.0, 0.0); n_points];
            for (i, row) in rows.iter().enumerate() {
                if let Some(row) = row {
                    let offset = *row as u64 * stride + col_offset;
                    let v = self.channel.read_floats_at(offset, 2)?;
                    data[i] = Complex64::new(v[0] as f64 / self.scale, v[1] as f64 / self.scale);
                }
            }
            let mut v = RawVector::complex(0);
            v.samples = Samples::Complex(data);
            v
        };

        vec.set_spectral(self.sw(dim)?, self.sf(dim)?, self.ref_value(dim)?);
        vec.ph0 = self.ph0(dim);
        vec.ph1 = self.ph1(dim);
        vec.group_delay = 0.0;
        log::debug!(
            "Read vector {} along dim {} ({} points, stride {})",
            i_vec,
            dim,
            n_points,
            stride
        );
        Ok(vec)
    }

    fn sample_schedule(&self) -> Option<&SampleSchedule> {
        self.schedule.as_ref()
    }

    fn set_sample_schedule(&mut self, schedule: Option<SampleSchedule>) {
        self.schedule = schedule;
    }

    fn acq_order(&self) -> Vec<String> {
        self.acq_order.get(self.n_dim)
    }

    fn set_acq_order(&mut self, order: &[String]) {
        self.acq_order
            .set(order, self.n_dim, self.schedule.as_ref());
    }

    fn reset_acq_order(&mut self) {
        self.acq_order.reset();
    }

    fn acq_order_short(&self) -> String {
        self.acq_order.short(self.n_dim)
    }

    fn close(&mut self) {
        self.channel.close();
    }
}

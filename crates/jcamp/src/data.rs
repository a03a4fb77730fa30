//! JCAMP-DX NMR source.
//!
//! Parameters come from the first block of the document; the FID is the
//! block's `R`/`I` pages. At most two dimensions are addressable.

use crate::document::{normalize_label, to_nucleus_name, JcampBlock, JcampDocument, JcampError, JcampRecord};
use nmrdata_core::{
    guess_nucleus_from_freq, AcqOrder, AxisCache, CacheState, FtType, LazyValue, NmrData,
    NmrDataError, ParameterCache, RawVector, SampleSchedule, Samples, VendorPar,
};
use num_complex::Complex64;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Highest dimension count a JCAMP source exposes.
pub const JCAMP_MAXDIM: usize = 2;

const MATCHING_EXTENSIONS: [&str; 2] = ["jdx", "dx"];

const OBSERVE_FREQUENCY: &str = ".OBSERVE FREQUENCY";
const OBSERVE_NUCLEUS: &str = ".OBSERVE NUCLEUS";
const SOLVENT_NAME: &str = ".SOLVENT NAME";
const PULSE_SEQUENCE: &str = ".PULSE SEQUENCE";
const BF1: &str = "$BF1";
const BF2: &str = "$BF2";
const BFREQ: &str = "$BFREQ";
const SF: &str = "$SF";
const SW_H: &str = "$SW_h";
const NUC1: &str = "$NUC1";
const NUC2: &str = "$NUC2";
const T2_NUCLEUS: &str = "$T2NUCLEUS";
const TD: &str = "$TD";
const FN_MODE: &str = "$FnMODE";
const AQ_MOD: &str = "$AQ_mod";
const PHC0: &str = "$PHC0";
const PHC1: &str = "$PHC1";
const GRPDLY: &str = "$GRPDLY";
const TEMPERATURE: &str = "TEMPERATURE";
const TE: &str = "$TE";
const SOLVENT: &str = "$SOLVENT";
const PULPROG: &str = "$PULPROG";
const NUMDIM: &str = "NUM DIM";
const ORIGIN: &str = "ORIGIN";

const HYPER_COEFS: [f64; 8] = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];
const ECHO_ANTIECHO_COEFS: [f64; 8] = [1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 0.0, 1.0];
const SEP_COEFS: [f64; 4] = [1.0, 0.0, 0.0, 1.0];

/// Does `path` carry a JCAMP-DX extension (`.jdx`, `.dx`)?
pub fn has_jcamp_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MATCHING_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
        .unwrap_or(false)
}

fn cached(value: &LazyValue, resolve: impl FnOnce() -> nmrdata_core::Result<f64>) -> nmrdata_core::Result<f64> {
    if let CacheState::Resolved(v) = value.state() {
        return Ok(v);
    }
    let v = resolve()?;
    value.set(v);
    Ok(v)
}

/// An open JCAMP-DX document.
#[derive(Debug)]
pub struct JcampData {
    path: PathBuf,
    document: JcampDocument,
    block: JcampBlock,
    cache: ParameterCache,
    sizes: [Option<usize>; JCAMP_MAXDIM],
    complex: [Option<bool>; JCAMP_MAXDIM],
    schedule: Option<SampleSchedule>,
    acq_order: AcqOrder,
}

impl JcampData {
    pub fn open(path: &Path) -> Result<Self, JcampError> {
        log::info!("Opening JCAMP file: {}", path.display());
        let document = JcampDocument::read(path)?;
        let block = document
            .blocks()
            .first()
            .cloned()
            .ok_or_else(|| JcampError::Invalid("document doesn't contain any block".into()))?;
        let data = Self {
            path: path.to_path_buf(),
            document,
            block,
            cache: ParameterCache::new(),
            sizes: [None; JCAMP_MAXDIM],
            complex: [None; JCAMP_MAXDIM],
            schedule: None,
            acq_order: AcqOrder::default(),
        };
        log::info!(
            "JCAMP layout: {} dims, {} points, {} R pages, {} I pages",
            data.n_dim(),
            data.n_points(),
            data.block.pages_for_y_symbol("R").len(),
            data.block.pages_for_y_symbol("I").len()
        );
        Ok(data)
    }

    pub fn document(&self) -> &JcampDocument {
        &self.document
    }

    pub fn block(&self) -> &JcampBlock {
        &self.block
    }

    /// `##ORIGIN=` of the block, or `JCamp`.
    pub fn origin(&self) -> String {
        self.block
            .get(ORIGIN)
            .map(JcampRecord::string)
            .unwrap_or_else(|| "JCamp".to_string())
    }

    fn check_dim(dim: usize) -> nmrdata_core::Result<()> {
        if dim >= JCAMP_MAXDIM {
            Err(NmrDataError::UnsupportedDimension {
                dim,
                max: JCAMP_MAXDIM,
            })
        } else {
            Ok(())
        }
    }

    fn axis(&self, dim: usize) -> nmrdata_core::Result<&AxisCache> {
        Self::check_dim(dim)?;
        self.cache.axis(dim).ok_or(NmrDataError::UnsupportedDimension {
            dim,
            max: JCAMP_MAXDIM,
        })
    }

    fn fn_mode(&self, dim: usize) -> Option<i64> {
        self.block.int_at(FN_MODE, dim)
    }

    fn resolve_sf(&self, dim: usize) -> nmrdata_core::Result<f64> {
        let labels: &[&str] = if dim == 0 {
            &[OBSERVE_FREQUENCY, BF1, BFREQ, SF]
        } else {
            &[BF2]
        };
        self.block
            .optional(labels)
            .and_then(JcampRecord::double)
            .ok_or_else(|| NmrDataError::missing(labels.join(", ")))
    }

    fn resolve_ref(&self, dim: usize) -> nmrdata_core::Result<f64> {
        let (unit, first) = match (self.block.get("UNITS"), self.block.get("FIRST")) {
            (Some(units), Some(first)) => (units.string_at(0), first.double_at(0)),
            _ => (
                self.block.get("XUNITS").map(JcampRecord::string),
                self.block.double_at("FIRSTX", 0),
            ),
        };
        let (Some(unit), Some(first)) = (unit, first) else {
            return Ok(0.0);
        };
        match normalize_label(&unit).as_str() {
            "HZ" => Ok(first / self.sf(dim)?),
            "PPM" => Ok(first),
            _ => Ok(0.0),
        }
    }

    /// Size from `$TD` (real points, halved), else the page layout.
    fn declared_size(&self, dim: usize) -> usize {
        if let Some(td) = self.block.int_at(TD, dim) {
            return (td.max(0) / 2) as usize;
        }
        let r_pages = self.block.pages_for_y_symbol("R");
        match dim {
            0 => r_pages
                .first()
                .and_then(|p| self.block.page_values(p).ok())
                .map(|v| v.len())
                .unwrap_or(0),
            _ => r_pages.len(),
        }
    }
}

impl NmrData for JcampData {
    fn vendor(&self) -> &'static str {
        "jcamp"
    }

    fn file_path(&self) -> &Path {
        &self.path
    }

    fn n_dim(&self) -> usize {
        let n = self
            .block
            .int_at(NUMDIM, 0)
            .map(|n| n.max(1) as usize)
            .unwrap_or(1);
        if n > JCAMP_MAXDIM {
            log::warn!("JCAMP document declares {} dims, using {}", n, JCAMP_MAXDIM);
        }
        n.min(JCAMP_MAXDIM)
    }

    fn size(&self, dim: usize) -> usize {
        if dim >= JCAMP_MAXDIM {
            return 0;
        }
        self.sizes[dim].unwrap_or_else(|| self.declared_size(dim))
    }

    fn set_size(&mut self, dim: usize, size: usize) {
        if let Some(s) = self.sizes.get_mut(dim) {
            *s = Some(size);
        }
    }

    fn n_vectors(&self) -> usize {
        (1..self.n_dim()).map(|i| self.size(i)).product()
    }

    fn n_points(&self) -> usize {
        self.size(0)
    }

    fn is_fid(&self) -> bool {
        match self.block.data_type() {
            Some(t) => !t.to_ascii_uppercase().contains("SPECTRUM"),
            None => true,
        }
    }

    /// Axis 0 is complex when the block has imaginary pages. Axis 1 is
    /// complex unless FnMODE is 2 (QSEQ) or 3 (TPPI); FnMODE 1 (QF) counts
    /// as complex because JCAMP sources carry no per-axis value list that
    /// would mark the axis as arrayed.
    fn is_complex(&self, dim: usize) -> bool {
        if let Some(Some(c)) = self.complex.get(dim) {
            return *c;
        }
        match dim {
            0 => !self.block.pages_for_y_symbol("I").is_empty(),
            1 => !matches!(self.fn_mode(dim), Some(2) | Some(3)),
            _ => false,
        }
    }

    fn set_complex(&mut self, dim: usize, value: bool) {
        if let Some(c) = self.complex.get_mut(dim) {
            *c = Some(value);
        }
    }

    fn ft_type(&self, dim: usize) -> FtType {
        if dim == 0 {
            return match self.block.int_at(AQ_MOD, 0) {
                Some(2) => FtType::Rft,
                _ => FtType::Ft,
            };
        }
        match self.fn_mode(dim) {
            Some(2) | Some(3) => FtType::Rft,
            Some(0) | Some(5) => FtType::Negate,
            _ => FtType::Ft,
        }
    }

    fn symbolic_coefs(&self, dim: usize) -> Option<String> {
        if dim == 0 {
            return None;
        }
        let coefs = match self.fn_mode(dim)? {
            2 | 3 => "real",
            4 => "hyper-r",
            0 | 5 => "hyper",
            6 => "echo-antiecho-r",
            _ => "sep",
        };
        Some(coefs.to_string())
    }

    fn coefs(&self, dim: usize) -> Vec<f64> {
        if dim == 0 {
            return Vec::new();
        }
        match self.fn_mode(dim) {
            None | Some(1) | Some(2) | Some(3) => Vec::new(),
            Some(0) | Some(4) | Some(5) => HYPER_COEFS.to_vec(),
            Some(6) => ECHO_ANTIECHO_COEFS.to_vec(),
            Some(_) => SEP_COEFS.to_vec(),
        }
    }

    fn negate_imag(&self, dim: usize) -> bool {
        dim > 0
    }

    fn sf(&self, dim: usize) -> nmrdata_core::Result<f64> {
        cached(&self.axis(dim)?.sf, || self.resolve_sf(dim))
    }

    fn set_sf(&mut self, dim: usize, value: f64) {
        if let Ok(axis) = self.axis(dim) {
            axis.sf.set(value);
        }
    }

    fn reset_sf(&mut self, dim: usize) {
        if let Some(axis) = self.cache.axis(dim) {
            axis.sf.reset();
        }
    }

    fn sw(&self, dim: usize) -> nmrdata_core::Result<f64> {
        cached(&self.axis(dim)?.sw, || {
            self.block
                .double_at(SW_H, dim)
                .ok_or_else(|| NmrDataError::missing(format!("{}[{}]", SW_H, dim)))
        })
    }

    fn set_sw(&mut self, dim: usize, value: f64) {
        if let Ok(axis) = self.axis(dim) {
            axis.sw.set(value);
        }
    }

    fn reset_sw(&mut self, dim: usize) {
        if let Some(axis) = self.cache.axis(dim) {
            axis.sw.reset();
        }
    }

    fn ref_value(&self, dim: usize) -> nmrdata_core::Result<f64> {
        cached(&self.axis(dim)?.reference, || self.resolve_ref(dim))
    }

    fn set_ref(&mut self, dim: usize, value: f64) {
        if let Ok(axis) = self.axis(dim) {
            axis.reference.set(value);
        }
    }

    fn reset_ref(&mut self, dim: usize) {
        if let Some(axis) = self.cache.axis(dim) {
            axis.reference.reset();
        }
    }

    fn tn(&self, dim: usize) -> nmrdata_core::Result<String> {
        let axis = self.axis(dim)?;
        if axis.nucleus.is_resolved() {
            return Ok(axis.nucleus.get_or_resolve(String::new));
        }
        let labels: &[&str] = if dim == 0 {
            &[OBSERVE_NUCLEUS, NUC1, T2_NUCLEUS]
        } else {
            &[NUC2]
        };
        let name = match self.block.optional(labels) {
            Some(record) => to_nucleus_name(&record.string()),
            None => guess_nucleus_from_freq(self.sf(dim)?).to_string(),
        };
        Ok(axis.nucleus.get_or_resolve(|| name))
    }

    fn ph0(&self, dim: usize) -> f64 {
        let mut ph0 = self.block.double_at(PHC0, dim).unwrap_or(0.0);
        if dim == 0 {
            ph0 -= 90.0;
        }
        -ph0
    }

    fn ph1(&self, dim: usize) -> f64 {
        -self.block.double_at(PHC1, dim).unwrap_or(0.0)
    }

    fn group_delay(&self) -> f64 {
        self.block
            .double_at(GRPDLY, 0)
            .filter(|g| *g > 0.0)
            .unwrap_or(0.0)
    }

    fn temp_k(&self) -> f64 {
        self.block
            .optional(&[TEMPERATURE, TE])
            .and_then(JcampRecord::double)
            .map(|t| if t > 150.0 { t } else { t + 273.15 })
            .unwrap_or(298.0)
    }

    fn solvent(&self) -> String {
        self.block
            .optional(&[SOLVENT_NAME, SOLVENT])
            .map(JcampRecord::string)
            .unwrap_or_default()
    }

    fn sequence(&self) -> String {
        self.block
            .optional(&[PULSE_SEQUENCE, PULPROG])
            .map(JcampRecord::string)
            .unwrap_or_default()
    }

    /// Block records first, then document records the block doesn't define.
    fn pars(&self) -> Vec<VendorPar> {
        let mut defined = HashSet::new();
        self.block
            .records()
            .iter()
            .chain(self.document.records())
            .filter(|r| defined.insert(r.normalized.clone()))
            .map(|r| VendorPar {
                name: r.label.clone(),
                value: r.display_value(),
            })
            .collect()
    }

    /// Row `i_vec` from the `i_vec`-th R/I page pair. Real and imaginary
    /// parts are swapped on purpose: the pages store them the other way
    /// round.
    fn read_vector(&mut self, i_vec: usize, real: bool) -> nmrdata_core::Result<RawVector> {
        let real_pages = self.block.pages_for_y_symbol("R");
        let imag_pages = self.block.pages_for_y_symbol("I");
        let page = real_pages.get(i_vec).ok_or(NmrDataError::IndexOutOfBounds {
            index: i_vec,
            count: real_pages.len(),
        })?;
        let r_values = self.block.page_values(page)?;

        let mut vec = match imag_pages.get(i_vec) {
            Some(ipage) => {
                let i_values = self.block.page_values(ipage)?;
                if i_values.len() != r_values.len() {
                    return Err(NmrDataError::HeaderParse(format!(
                        "page {}: {} real but {} imaginary values",
                        i_vec,
                        r_values.len(),
                        i_values.len()
                    )));
                }
                let data: Vec<Complex64> = r_values
                    .iter()
                    .zip(&i_values)
                    .map(|(&re, &im)| Complex64::new(im, re))
                    .collect();
                let mut v = RawVector::complex(0);
                v.samples = Samples::Complex(data);
                if real {
                    v.samples = Samples::Real(v.to_interleaved());
                }
                v
            }
            None => {
                let mut v = RawVector::real(0);
                v.samples = Samples::Real(r_values);
                v
            }
        };

        vec.set_spectral(self.sw(0)?, self.sf(0)?, self.ref_value(0)?);
        vec.group_delay = self.group_delay();
        vec.ph0 = self.ph0(0);
        vec.ph1 = self.ph1(0);
        log::debug!("Read JCAMP vector {} ({} points)", i_vec, vec.len());
        Ok(vec)
    }

    fn read_vector_dim(
        &mut self,
        dim: usize,
        i_vec: usize,
        real: bool,
    ) -> nmrdata_core::Result<RawVector> {
        Self::check_dim(dim)?;
        if dim == 0 {
            return self.read_vector(i_vec, real);
        }
        Err(NmrDataError::Unsupported(
            "indirect-dimension reads from JCAMP".into(),
        ))
    }

    fn sample_schedule(&self) -> Option<&SampleSchedule> {
        self.schedule.as_ref()
    }

    fn set_sample_schedule(&mut self, schedule: Option<SampleSchedule>) {
        self.schedule = schedule;
    }

    fn acq_order(&self) -> Vec<String> {
        self.acq_order.get(self.n_dim())
    }

    fn set_acq_order(&mut self, order: &[String]) {
        let n_dim = self.n_dim();
        self.acq_order.set(order, n_dim, self.schedule.as_ref());
    }

    fn reset_acq_order(&mut self) {
        self.acq_order.reset();
    }

    fn acq_order_short(&self) -> String {
        self.acq_order.short(self.n_dim())
    }

    fn close(&mut self) {}
}

//! Acquisition-scheme enumerations and the per-dimension scheme decoder.
//!
//! Every indirect dimension of a multidimensional FID was acquired with some
//! quadrature-detection scheme (States, TPPI, Echo-AntiEcho, ...).  The scheme
//! decides whether the dimension is complex, which FT variant processes it and
//! which coefficients combine the real/imaginary rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of dimensions any supported vendor format carries.
pub const MAXDIM: usize = 4;

// ─── FT type ────────────────────────────────────────────────────────────────

/// Fourier-transform variant a dimension should be processed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FtType {
    /// Complex FT.
    Ft,
    /// Real FT (TPPI-style sequential data).
    Rft,
    /// Complex FT after negating every other pair.
    Negate,
    /// Real data, no quadrature.
    Real,
}

impl FtType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ft => "ft",
            Self::Rft => "rft",
            Self::Negate => "negate",
            Self::Real => "real",
        }
    }
}

impl fmt::Display for FtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FtType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ft" => Ok(Self::Ft),
            "rft" => Ok(Self::Rft),
            "negate" => Ok(Self::Negate),
            "real" => Ok(Self::Real),
            other => Err(format!("unknown FT type '{}'", other)),
        }
    }
}

// ─── Phase modulation ──────────────────────────────────────────────────────

/// Quadrature-detection scheme of one indirect dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseMod {
    None,
    Qf,
    Tppi,
    States,
    StatesTppi,
    EchoAntiEcho,
}

const HYPER_COEFS: [f64; 8] = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];
const ECHO_ANTIECHO_COEFS: [f64; 8] = [1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 0.0, 1.0];

/// Squash a scheme name so that `States-TPPI`, `STATES_TPPI` and
/// `states tppi` compare equal.
fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_uppercase)
        .collect()
}

impl PhaseMod {
    /// Parse a `PHASE_MOD` entry. Unknown names fall back to `None`.
    pub fn from_name(name: &str) -> Self {
        match squash(name).as_str() {
            "QF" => Self::Qf,
            "TPPI" => Self::Tppi,
            "STATES" => Self::States,
            "STATESTPPI" => Self::StatesTppi,
            "ECHOANTIECHO" => Self::EchoAntiEcho,
            "NONE" | "" => Self::None,
            _ => {
                log::warn!("Unknown phase modulation '{}', treating as None", name);
                Self::None
            }
        }
    }

    /// Parse an `ACQUISITION_MODE` entry (fallback when `PHASE_MOD` is absent).
    pub fn from_acquisition_mode(mode: &str) -> Self {
        match squash(mode).as_str() {
            "COMPLEX" | "STATES" => Self::States,
            "TPPI" => Self::Tppi,
            "STATESTPPI" | "TPPISTATES" => Self::StatesTppi,
            "ECHOANTIECHO" => Self::EchoAntiEcho,
            "REAL" | "" => Self::None,
            _ => {
                log::warn!("Unknown acquisition mode '{}', treating as None", mode);
                Self::None
            }
        }
    }

    pub fn is_complex(self) -> bool {
        matches!(self, Self::States | Self::StatesTppi | Self::EchoAntiEcho)
    }

    pub fn ft_type(self) -> FtType {
        match self {
            Self::None => FtType::Real,
            Self::Qf | Self::Tppi => FtType::Rft,
            Self::States | Self::EchoAntiEcho => FtType::Ft,
            Self::StatesTppi => FtType::Negate,
        }
    }

    pub fn symbolic_coefs(self) -> &'static str {
        match self {
            Self::None | Self::Qf | Self::Tppi => "real",
            Self::States | Self::StatesTppi => "hyper",
            Self::EchoAntiEcho => "echo-antiecho",
        }
    }

    pub fn coefs(self) -> &'static [f64] {
        match self {
            Self::None | Self::Qf | Self::Tppi => &[],
            Self::States | Self::StatesTppi => &HYPER_COEFS,
            Self::EchoAntiEcho => &ECHO_ANTIECHO_COEFS,
        }
    }

    /// TPPI and Echo-AntiEcho data need the imaginary part negated.
    pub fn negates_imaginary(self) -> bool {
        matches!(self, Self::Tppi | Self::EchoAntiEcho)
    }
}

impl fmt::Display for PhaseMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Qf => write!(f, "QF"),
            Self::Tppi => write!(f, "TPPI"),
            Self::States => write!(f, "States"),
            Self::StatesTppi => write!(f, "States-TPPI"),
            Self::EchoAntiEcho => write!(f, "Echo-AntiEcho"),
        }
    }
}

/// Resolve the per-dimension phase modulation list from the primary
/// phase-modulation codes, or the acquisition-mode fallback.
///
/// With neither present every dimension defaults to `None` and a warning is
/// logged.
pub fn resolve_phase_mods(
    phase_mod: Option<&[String]>,
    acquisition_mode: Option<&[String]>,
) -> Vec<PhaseMod> {
    if let Some(codes) = phase_mod {
        let mods: Vec<PhaseMod> = codes.iter().map(|c| PhaseMod::from_name(c)).collect();
        log::info!("Setting FT params from PHASE_MOD: {:?}", mods);
        mods
    } else if let Some(modes) = acquisition_mode {
        let mut mods: Vec<PhaseMod> = modes
            .iter()
            .map(|m| PhaseMod::from_acquisition_mode(m))
            .collect();
        if let Some(first) = mods.first_mut() {
            *first = PhaseMod::None;
        }
        log::info!("Setting FT params from ACQUISITION_MODE: {:?}", mods);
        mods
    } else {
        log::warn!("No PHASE_MOD or ACQUISITION_MODE found, FT params will have default values.");
        Vec::new()
    }
}

// ─── Decoded scheme ─────────────────────────────────────────────────────────

/// Decoded acquisition parameters of a single dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimScheme {
    pub is_complex: bool,
    pub ft_type: FtType,
    pub symbolic_coefs: Option<String>,
    pub coefs: Vec<f64>,
    pub negate_imag: bool,
}

impl DimScheme {
    /// The fixed scheme of the direct dimension.
    pub fn direct() -> Self {
        Self {
            is_complex: true,
            ft_type: FtType::Ft,
            symbolic_coefs: None,
            coefs: Vec::new(),
            negate_imag: false,
        }
    }

    pub fn from_phase_mod(mode: PhaseMod) -> Self {
        Self {
            is_complex: mode.is_complex(),
            ft_type: mode.ft_type(),
            symbolic_coefs: Some(mode.symbolic_coefs().to_string()),
            coefs: mode.coefs().to_vec(),
            negate_imag: mode.negates_imaginary(),
        }
    }

    /// A plain real dimension, used where no scheme is known.
    pub fn real() -> Self {
        Self::from_phase_mod(PhaseMod::None)
    }
}

/// Schemes of all dimensions plus the direct-dimension read flags.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionScheme {
    pub dims: Vec<DimScheme>,
    /// Real and imaginary samples of the direct dimension are stored swapped.
    pub exchange_xy: bool,
    /// Negate every other complex pair of the direct dimension.
    pub negate_pairs: bool,
}

impl AcquisitionScheme {
    /// Decode `phase_mod` for `n_dims` dimensions.
    ///
    /// Dimension 0 is always the complex direct dimension; entry 0 of
    /// `phase_mod` is ignored. Dimensions past the end of `phase_mod`
    /// default to `PhaseMod::None`.
    pub fn decode(phase_mod: &[PhaseMod], n_dims: usize) -> Self {
        let mut dims = Vec::with_capacity(n_dims);
        for i in 0..n_dims {
            if i == 0 {
                dims.push(DimScheme::direct());
            } else {
                let mode = phase_mod.get(i).copied().unwrap_or(PhaseMod::None);
                dims.push(DimScheme::from_phase_mod(mode));
            }
        }
        Self {
            dims,
            exchange_xy: true,
            negate_pairs: false,
        }
    }

    /// Convert acquired point counts into time-domain sizes: complex
    /// indirect dimensions count complex pairs, so their size is halved.
    pub fn time_domain_sizes(&self, acquired: &[usize]) -> Vec<usize> {
        acquired
            .iter()
            .enumerate()
            .map(|(i, &n)| match self.dims.get(i) {
                Some(scheme) if i > 0 && scheme.is_complex => n / 2,
                _ => n,
            })
            .collect()
    }
}

//! Nucleus labels and a frequency-based nucleus guess.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Nucleus type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Nucleus {
    H1,
    H2,
    C13,
    N15,
    F19,
    P31,
    Other(String),
}

impl fmt::Display for Nucleus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nucleus::H1 => write!(f, "1H"),
            Nucleus::H2 => write!(f, "2H"),
            Nucleus::C13 => write!(f, "13C"),
            Nucleus::N15 => write!(f, "15N"),
            Nucleus::F19 => write!(f, "19F"),
            Nucleus::P31 => write!(f, "31P"),
            Nucleus::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for Nucleus {
    type Err = std::convert::Infallible;

    /// Accepts `1H` and `H1` style names; anything else is `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase();
        Ok(match norm.as_str() {
            "1H" | "H1" | "H" => Nucleus::H1,
            "2H" | "H2" | "D" => Nucleus::H2,
            "13C" | "C13" | "C" => Nucleus::C13,
            "15N" | "N15" | "N" => Nucleus::N15,
            "19F" | "F19" | "F" => Nucleus::F19,
            "31P" | "P31" | "P" => Nucleus::P31,
            _ => Nucleus::Other(s.trim().to_string()),
        })
    }
}

impl Nucleus {
    /// Frequency ratio relative to 1H.
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Nucleus::H1 => Some(1.0),
            Nucleus::H2 => Some(0.153_506_088),
            Nucleus::C13 => Some(0.251_449_530),
            Nucleus::N15 => Some(0.101_329_118),
            Nucleus::F19 => Some(0.940_866_982),
            Nucleus::P31 => Some(0.404_807_420),
            Nucleus::Other(_) => None,
        }
    }
}

/// Proton frequencies (MHz) of common spectrometers.
const PROTON_FREQS: [f64; 16] = [
    60.0, 80.0, 100.0, 200.0, 250.0, 300.0, 360.0, 400.0, 500.0, 600.0, 700.0, 750.0, 800.0,
    900.0, 950.0, 1000.0,
];

const CANDIDATES: [Nucleus; 6] = [
    Nucleus::H1,
    Nucleus::C13,
    Nucleus::N15,
    Nucleus::F19,
    Nucleus::P31,
    Nucleus::H2,
];

/// Guess the nucleus observed at `sf` (Hz or MHz; values above 1e4 are
/// treated as Hz) by finding the candidate whose implied proton frequency is
/// closest to a common spectrometer field.
pub fn guess_nucleus_from_freq(sf: f64) -> Nucleus {
    let mhz = if sf > 1.0e4 { sf / 1.0e6 } else { sf };
    let mut best = Nucleus::H1;
    let mut best_dev = f64::MAX;
    for nucleus in CANDIDATES.iter() {
        let Some(ratio) = nucleus.ratio() else {
            continue;
        };
        let proton = mhz / ratio;
        for &field in PROTON_FREQS.iter() {
            let dev = ((proton - field) / field).abs();
            if dev < best_dev {
                best_dev = dev;
                best = nucleus.clone();
            }
        }
    }
    best
}

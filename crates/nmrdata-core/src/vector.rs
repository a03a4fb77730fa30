//! `RawVector`: one 1D vector pulled from a raw source, plus provenance.

use num_complex::Complex64;

/// Sample storage of a vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Complex(Vec<Complex64>),
    /// Real values, or interleaved re/im pairs when read in real mode.
    Real(Vec<f64>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Complex(v) => v.len(),
            Samples::Real(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of a single read; owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVector {
    pub samples: Samples,
    /// Seconds per point (1 / sweep width).
    pub dwell: f64,
    /// Spectrometer frequency in Hz.
    pub center_freq: f64,
    /// Reference value after the half-bin correction.
    pub ref_value: f64,
    /// Digital-filter group delay in points (direct dimension only).
    pub group_delay: f64,
    pub ph0: f64,
    pub ph1: f64,
}

impl RawVector {
    pub fn complex(n: usize) -> Self {
        Self::with_samples(Samples::Complex(vec![Complex64::new(0.0, 0.0); n]))
    }

    pub fn real(n: usize) -> Self {
        Self::with_samples(Samples::Real(vec![0.0; n]))
    }

    fn with_samples(samples: Samples) -> Self {
        Self {
            samples,
            dwell: 1.0,
            center_freq: 1.0,
            ref_value: 0.0,
            group_delay: 0.0,
            ph0: 0.0,
            ph1: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.samples, Samples::Complex(_))
    }

    pub fn as_complex(&self) -> Option<&[Complex64]> {
        match &self.samples {
            Samples::Complex(v) => Some(v),
            Samples::Real(_) => None,
        }
    }

    pub fn as_real(&self) -> Option<&[f64]> {
        match &self.samples {
            Samples::Real(v) => Some(v),
            Samples::Complex(_) => None,
        }
    }

    /// Attach the spectral provenance of the axis the vector lies along.
    ///
    /// The reference is shifted by half of `(1 / dwell) / center_freq`.
    pub fn set_spectral(&mut self, sw: f64, sf: f64, reference: f64) {
        self.dwell = 1.0 / sw;
        self.center_freq = sf;
        self.ref_value = reference + (1.0 / self.dwell) / self.center_freq / 2.0;
    }

    /// Sweep width recovered from the dwell time.
    pub fn sw(&self) -> f64 {
        1.0 / self.dwell
    }

    /// Flatten to interleaved `re, im` values (real vectors are returned as-is).
    pub fn to_interleaved(&self) -> Vec<f64> {
        match &self.samples {
            Samples::Complex(v) => v.iter().flat_map(|c| [c.re, c.im]).collect(),
            Samples::Real(v) => v.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_bin_reference() {
        let mut v = RawVector::complex(4);
        v.set_spectral(5000.0, 600.0e6, 4.7);
        assert!((v.dwell - 2.0e-4).abs() < 1e-12);
        assert_eq!(v.center_freq, 600.0e6);
        let expected = 4.7 + 5000.0 / 600.0e6 / 2.0;
        assert!((v.ref_value - expected).abs() < 1e-12);
        assert!((v.sw() - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_interleaved() {
        let mut v = RawVector::complex(2);
        if let Samples::Complex(data) = &mut v.samples {
            data[0] = Complex64::new(1.0, 2.0);
            data[1] = Complex64::new(3.0, 4.0);
        }
        assert_eq!(v.to_interleaved(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(v.is_complex());
        assert!(v.as_real().is_none());
        assert_eq!(RawVector::real(6).len(), 6);
    }
}

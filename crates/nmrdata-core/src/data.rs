//! The `NmrData` contract every vendor reader implements.

use crate::enums::FtType;
use crate::error::Result;
use crate::params::VendorPar;
use crate::schedule::SampleSchedule;
use crate::vector::RawVector;
use std::path::Path;

/// Uniform access to one raw vendor source.
///
/// Derived parameters (`sf`, `sw`, `ref_value`, `tn`) are resolved lazily
/// and cached per axis; `set_*` overrides a cache entry and `reset_*` clears
/// it so the next read recomputes from the header.
pub trait NmrData {
    fn vendor(&self) -> &'static str;
    fn file_path(&self) -> &Path;

    // ─── Layout ─────────────────────────────────────────────────────────

    fn n_dim(&self) -> usize;
    /// Time-domain size of `dim` (complex pairs for complex axes).
    fn size(&self, dim: usize) -> usize;
    fn set_size(&mut self, dim: usize, size: usize);
    /// Number of direct-dimension vectors in the file.
    fn n_vectors(&self) -> usize;
    /// Complex points per direct-dimension vector.
    fn n_points(&self) -> usize;
    fn is_fid(&self) -> bool {
        true
    }

    // ─── Acquisition scheme ─────────────────────────────────────────────

    fn is_complex(&self, dim: usize) -> bool;
    fn set_complex(&mut self, dim: usize, value: bool);
    fn ft_type(&self, dim: usize) -> FtType;
    fn symbolic_coefs(&self, dim: usize) -> Option<String>;
    fn coefs(&self, dim: usize) -> Vec<f64>;
    fn negate_imag(&self, dim: usize) -> bool;
    fn negate_pairs(&self, dim: usize) -> bool {
        self.ft_type(dim) == FtType::Negate
    }

    // ─── Resolved parameters ────────────────────────────────────────────

    fn sf(&self, dim: usize) -> Result<f64>;
    fn set_sf(&mut self, dim: usize, value: f64);
    fn reset_sf(&mut self, dim: usize);

    fn sw(&self, dim: usize) -> Result<f64>;
    fn set_sw(&mut self, dim: usize, value: f64);
    fn reset_sw(&mut self, dim: usize);

    fn ref_value(&self, dim: usize) -> Result<f64>;
    fn set_ref(&mut self, dim: usize, value: f64);
    fn reset_ref(&mut self, dim: usize);
    fn ref_point(&self, dim: usize) -> f64 {
        self.size(dim) as f64 / 2.0
    }

    /// Nucleus label of `dim`.
    fn tn(&self, dim: usize) -> Result<String>;

    fn ph0(&self, _dim: usize) -> f64 {
        0.0
    }
    fn ph1(&self, _dim: usize) -> f64 {
        0.0
    }
    fn group_delay(&self) -> f64 {
        0.0
    }
    fn scale(&self) -> f64 {
        1.0
    }
    fn temp_k(&self) -> f64;
    fn solvent(&self) -> String {
        String::new()
    }
    fn sequence(&self) -> String {
        String::new()
    }

    /// Axis labels; repeated nuclei are suffixed with `_<axis+1>`.
    fn label_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.n_dim());
        for i in 0..self.n_dim() {
            let mut name = self.tn(i).unwrap_or_default();
            if names.contains(&name) {
                name = format!("{}_{}", name, i + 1);
            }
            names.push(name);
        }
        names
    }

    /// Flat `(name, value)` listing of every parsed header record.
    fn pars(&self) -> Vec<VendorPar>;

    // ─── Reads ──────────────────────────────────────────────────────────

    /// Read direct-dimension vector `i_vec`. With `real` the samples come
    /// back interleaved as re/im values instead of complex.
    fn read_vector(&mut self, i_vec: usize, real: bool) -> Result<RawVector>;

    /// Read the vector along `dim` at column `i_vec`.
    fn read_vector_dim(&mut self, dim: usize, i_vec: usize, real: bool) -> Result<RawVector>;

    fn sample_schedule(&self) -> Option<&SampleSchedule>;
    fn set_sample_schedule(&mut self, schedule: Option<SampleSchedule>);

    fn acq_order(&self) -> Vec<String>;
    fn set_acq_order(&mut self, order: &[String]);
    fn reset_acq_order(&mut self);
    fn acq_order_short(&self) -> String;

    /// Release the data channel. Calling it twice is harmless.
    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NmrDataError;

    struct Stub {
        nuclei: Vec<&'static str>,
    }

    impl NmrData for Stub {
        fn vendor(&self) -> &'static str {
            "stub"
        }
        fn file_path(&self) -> &Path {
            Path::new("stub")
        }
        fn n_dim(&self) -> usize {
            self.nuclei.len()
        }
        fn size(&self, _dim: usize) -> usize {
            8
        }
        fn set_size(&mut self, _dim: usize, _size: usize) {}
        fn n_vectors(&self) -> usize {
            1
        }
        fn n_points(&self) -> usize {
            8
        }
        fn is_complex(&self, _dim: usize) -> bool {
            true
        }
        fn set_complex(&mut self, _dim: usize, _value: bool) {}
        fn ft_type(&self, dim: usize) -> FtType {
            if dim == 1 {
                FtType::Negate
            } else {
                FtType::Ft
            }
        }
        fn symbolic_coefs(&self, _dim: usize) -> Option<String> {
            None
        }
        fn coefs(&self, _dim: usize) -> Vec<f64> {
            Vec::new()
        }
        fn negate_imag(&self, _dim: usize) -> bool {
            false
        }
        fn sf(&self, _dim: usize) -> Result<f64> {
            Ok(1.0)
        }
        fn set_sf(&mut self, _dim: usize, _value: f64) {}
        fn reset_sf(&mut self, _dim: usize) {}
        fn sw(&self, _dim: usize) -> Result<f64> {
            Ok(1.0)
        }
        fn set_sw(&mut self, _dim: usize, _value: f64) {}
        fn reset_sw(&mut self, _dim: usize) {}
        fn ref_value(&self, _dim: usize) -> Result<f64> {
            Ok(0.0)
        }
        fn set_ref(&mut self, _dim: usize, _value: f64) {}
        fn reset_ref(&mut self, _dim: usize) {}
        fn tn(&self, dim: usize) -> Result<String> {
            Ok(self.nuclei[dim].to_string())
        }
        fn temp_k(&self) -> f64 {
            298.0
        }
        fn pars(&self) -> Vec<VendorPar> {
            Vec::new()
        }
        fn read_vector(&mut self, _i_vec: usize, _real: bool) -> Result<RawVector> {
            Err(NmrDataError::ChannelClosed)
        }
        fn read_vector_dim(&mut self, _dim: usize, _i_vec: usize, _real: bool) -> Result<RawVector> {
            Err(NmrDataError::ChannelClosed)
        }
        fn sample_schedule(&self) -> Option<&SampleSchedule> {
            None
        }
        fn set_sample_schedule(&mut self, _schedule: Option<SampleSchedule>) {}
        fn acq_order(&self) -> Vec<String> {
            Vec::new()
        }
        fn set_acq_order(&mut self, _order: &[String]) {}
        fn reset_acq_order(&mut self) {}
        fn acq_order_short(&self) -> String {
            String::new()
        }
        fn close(&mut self) {}
    }

    #[test]
    fn test_label_names_disambiguated() {
        let stub = Stub {
            nuclei: vec!["1H", "13C", "1H"],
        };
        assert_eq!(stub.label_names(), vec!["1H", "13C", "1H_3"]);
    }

    #[test]
    fn test_default_methods() {
        let stub = Stub { nuclei: vec!["1H", "15N"] };
        assert!(stub.negate_pairs(1));
        assert!(!stub.negate_pairs(0));
        assert_eq!(stub.ref_point(0), 4.0);
        assert!(stub.is_fid());
    }
}

//! Digital-filter group-delay removal for direct-dimension FIDs.
//!
//! Oversampling receivers with decimation filters delay the FID by a
//! (possibly fractional) number of points.  The shift is undone in the
//! frequency domain:
//!
//! ```text
//!   1.  Zero-pad to N = next_power_of_2(len)
//!   2.  Inverse FFT (unnormalized)
//!   3.  Swap halves, apply exp(−j·2π·k·delay/N), swap halves back
//!   4.  Forward FFT and divide by N
//!   5.  Double the first point
//!   6.  Zero the trailing ceil(delay) + skip_tail points
//! ```

use nmrdata_core::{RawVector, Samples};
use rustfft::{num_complex::Complex64, num_traits::Zero, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// In-place fftshift for an even-length buffer.
fn swap_halves(buf: &mut [Complex64]) {
    let half = buf.len() / 2;
    for i in 0..half {
        buf.swap(i, i + half);
    }
}

/// Pre-planned corrector for vectors of one length.
pub struct DFCorrector {
    fft_size: usize,
    in_size: usize,
    valid: usize,
    delay: f64,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
}

impl DFCorrector {
    /// * `in_size`   – complex points per vector
    /// * `delay`     – group delay in points, fractional allowed
    /// * `skip_tail` – extra trailing points to zero beyond `ceil(delay)`
    pub fn new(in_size: usize, delay: f64, skip_tail: usize) -> Self {
        let fft_size = next_pow2(in_size);
        let head = delay.max(0.0).ceil() as usize;
        let valid = in_size.saturating_sub(head + skip_tail);
        let mut planner = FftPlanner::<f64>::new();
        Self {
            fft_size,
            in_size,
            valid,
            delay,
            fwd: planner.plan_fft_forward(fft_size),
            inv: planner.plan_fft_inverse(fft_size),
        }
    }

    /// Points left uncontaminated after correction.
    pub fn valid_points(&self) -> usize {
        self.valid
    }

    /// Correct `data` in place; the vector keeps its length and the
    /// contaminated tail is zeroed.
    pub fn correct(&self, data: &mut [Complex64]) {
        let n = self.fft_size;
        let len = data.len().min(self.in_size);
        let mut buf = vec![Complex64::zero(); n];
        buf[..len].copy_from_slice(&data[..len]);

        let mut scratch = vec![Complex64::zero(); self.inv.get_inplace_scratch_len()];
        self.inv.process_with_scratch(&mut buf, &mut scratch);

        swap_halves(&mut buf);
        let step = -2.0 * PI * self.delay / n as f64;
        for (k, z) in buf.iter_mut().enumerate() {
            *z *= Complex64::from_polar(1.0, step * k as f64);
        }
        swap_halves(&mut buf);

        scratch.resize(self.fwd.get_inplace_scratch_len(), Complex64::zero());
        self.fwd.process_with_scratch(&mut buf, &mut scratch);

        let inv_n = 1.0 / n as f64;
        buf[0] *= 2.0;
        for (i, z) in data.iter_mut().enumerate() {
            *z = if i < self.valid {
                buf[i] * inv_n
            } else {
                Complex64::zero()
            };
        }
    }
}

/// Group-delay removal on a read vector.
pub trait GroupDelayCorrection {
    /// Shift out the attached group delay and set it to zero. Real vectors
    /// and vectors without delay are left untouched.
    fn correct_group_delay(&mut self);
}

impl GroupDelayCorrection for RawVector {
    fn correct_group_delay(&mut self) {
        if self.group_delay <= 0.0 {
            return;
        }
        if let Samples::Complex(data) = &mut self.samples {
            log::debug!(
                "Removing group delay of {} points from {}-point vector",
                self.group_delay,
                data.len()
            );
            DFCorrector::new(data.len(), self.group_delay, 0).correct(data);
            self.group_delay = 0.0;
        }
    }
}

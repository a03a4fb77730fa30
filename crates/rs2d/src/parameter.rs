//! Names of the RS2D header parameters the reader relies on.

use std::fmt;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    BASE_FREQ_1,
    BASE_FREQ_2,
    BASE_FREQ_3,
    BASE_FREQ_4,
    OFFSET_FREQ_1,
    OFFSET_FREQ_2,
    OFFSET_FREQ_3,
    OFFSET_FREQ_4,
    SPECTRAL_WIDTH,
    SPECTRAL_WIDTH_2D,
    SPECTRAL_WIDTH_3D,
    SPECTRAL_WIDTH_4D,
    NUCLEUS_1,
    NUCLEUS_2,
    NUCLEUS_3,
    NUCLEUS_4,
    ACQUISITION_MATRIX_DIMENSION_1D,
    ACQUISITION_MATRIX_DIMENSION_2D,
    ACQUISITION_MATRIX_DIMENSION_3D,
    ACQUISITION_MATRIX_DIMENSION_4D,
    MATRIX_DIMENSION_1D,
    MATRIX_DIMENSION_2D,
    MATRIX_DIMENSION_3D,
    MATRIX_DIMENSION_4D,
    OBSERVED_NUCLEUS,
    SAMPLE_TEMPERATURE,
    DIGITAL_FILTER_SHIFT,
    DIGITAL_FILTER_REMOVED,
    PHASE_MOD,
    ACQUISITION_MODE,
    SR,
    STATE,
    DATA_REPRESENTATION,
    SOLVENT,
    SEQUENCE_NAME,
    PHASE_0,
    PHASE_1,
}

use Parameter::*;

pub const BASE_FREQ_PARAMS: [Parameter; 4] = [BASE_FREQ_1, BASE_FREQ_2, BASE_FREQ_3, BASE_FREQ_4];
pub const OFFSET_FREQ_PARAMS: [Parameter; 4] =
    [OFFSET_FREQ_1, OFFSET_FREQ_2, OFFSET_FREQ_3, OFFSET_FREQ_4];
pub const SW_PARAMS: [Parameter; 4] = [
    SPECTRAL_WIDTH,
    SPECTRAL_WIDTH_2D,
    SPECTRAL_WIDTH_3D,
    SPECTRAL_WIDTH_4D,
];
pub const NUCLEUS_PARAMS: [Parameter; 4] = [NUCLEUS_1, NUCLEUS_2, NUCLEUS_3, NUCLEUS_4];
pub const ACQUISITION_DIMENSION_PARAMS: [Parameter; 4] = [
    ACQUISITION_MATRIX_DIMENSION_1D,
    ACQUISITION_MATRIX_DIMENSION_2D,
    ACQUISITION_MATRIX_DIMENSION_3D,
    ACQUISITION_MATRIX_DIMENSION_4D,
];
pub const DIMENSION_PARAMS: [Parameter; 4] = [
    MATRIX_DIMENSION_1D,
    MATRIX_DIMENSION_2D,
    MATRIX_DIMENSION_3D,
    MATRIX_DIMENSION_4D,
];

impl Parameter {
    pub fn name(self) -> &'static str {
        match self {
            BASE_FREQ_1 => "BASE_FREQ_1",
            BASE_FREQ_2 => "BASE_FREQ_2",
            BASE_FREQ_3 => "BASE_FREQ_3",
            BASE_FREQ_4 => "BASE_FREQ_4",
            OFFSET_FREQ_1 => "OFFSET_FREQ_1",
            OFFSET_FREQ_2 => "OFFSET_FREQ_2",
            OFFSET_FREQ_3 => "OFFSET_FREQ_3",
            OFFSET_FREQ_4 => "OFFSET_FREQ_4",
            SPECTRAL_WIDTH => "SPECTRAL_WIDTH",
            SPECTRAL_WIDTH_2D => "SPECTRAL_WIDTH_2D",
            SPECTRAL_WIDTH_3D => "SPECTRAL_WIDTH_3D",
            SPECTRAL_WIDTH_4D => "SPECTRAL_WIDTH_4D",
            NUCLEUS_1 => "NUCLEUS_1",
            NUCLEUS_2 => "NUCLEUS_2",
            NUCLEUS_3 => "NUCLEUS_3",
            NUCLEUS_4 => "NUCLEUS_4",
            ACQUISITION_MATRIX_DIMENSION_1D => "ACQUISITION_MATRIX_DIMENSION_1D",
            ACQUISITION_MATRIX_DIMENSION_2D => "ACQUISITION_MATRIX_DIMENSION_2D",
            ACQUISITION_MATRIX_DIMENSION_3D => "ACQUISITION_MATRIX_DIMENSION_3D",
            ACQUISITION_MATRIX_DIMENSION_4D => "ACQUISITION_MATRIX_DIMENSION_4D",
            MATRIX_DIMENSION_1D => "MATRIX_DIMENSION_1D",
            MATRIX_DIMENSION_2D => "MATRIX_DIMENSION_2D",
            MATRIX_DIMENSION_3D => "MATRIX_DIMENSION_3D",
            MATRIX_DIMENSION_4D => "MATRIX_DIMENSION_4D",
            OBSERVED_NUCLEUS => "OBSERVED_NUCLEUS",
            SAMPLE_TEMPERATURE => "SAMPLE_TEMPERATURE",
            DIGITAL_FILTER_SHIFT => "DIGITAL_FILTER_SHIFT",
            DIGITAL_FILTER_REMOVED => "DIGITAL_FILTER_REMOVED",
            PHASE_MOD => "PHASE_MOD",
            ACQUISITION_MODE => "ACQUISITION_MODE",
            SR => "SR",
            STATE => "STATE",
            DATA_REPRESENTATION => "DATA_REPRESENTATION",
            SOLVENT => "SOLVENT",
            SEQUENCE_NAME => "SEQUENCE_NAME",
            PHASE_0 => "PHASE_0",
            PHASE_1 => "PHASE_1",
        }
    }
}

impl AsRef<str> for Parameter {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_line_up() {
        assert_eq!(BASE_FREQ_PARAMS[2].name(), "BASE_FREQ_3");
        assert_eq!(SW_PARAMS[0].name(), "SPECTRAL_WIDTH");
        assert_eq!(SW_PARAMS[1].name(), "SPECTRAL_WIDTH_2D");
        assert_eq!(DIMENSION_PARAMS[3].to_string(), "MATRIX_DIMENSION_4D");
        assert_eq!(
            ACQUISITION_DIMENSION_PARAMS[0].as_ref(),
            "ACQUISITION_MATRIX_DIMENSION_1D"
        );
    }
}

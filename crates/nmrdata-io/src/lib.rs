//! Binary plumbing for raw NMR data: byte-order aware float decoding,
//! positioned data channels, float writers, group-delay correction and the
//! materialized dataset container.

pub mod byteswap;
pub mod dataset;
pub mod dfcorrect;
pub mod reader;
pub mod writer;

pub use byteswap::*;
pub use dataset::*;
pub use dfcorrect::*;
pub use reader::*;
pub use writer::*;

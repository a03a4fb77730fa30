//! JCAMP-DX NMR reader.
//!
//! Parses labelled-record documents (blocks, NTUPLES pages, ASDF-compressed
//! ordinates) and exposes the first block as an [`nmrdata_core::NmrData`]
//! source of up to two dimensions.

pub mod asdf;
pub mod data;
pub mod document;

pub use data::{has_jcamp_extension, JcampData, JCAMP_MAXDIM};
pub use document::{
    normalize_label, to_nucleus_name, JcampBlock, JcampDocument, JcampError, JcampPage,
    JcampRecord,
};

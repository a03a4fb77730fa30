//! Vendor-neutral contract for raw NMR data sources.
//!
//! Parameter Store values, the acquisition-scheme decoder, lazy parameter
//! caches, NUS sample schedules, acquisition order handling and the
//! [`NmrData`] trait implemented by each vendor reader.

pub mod acqorder;
pub mod data;
pub mod enums;
pub mod error;
pub mod nucleus;
pub mod params;
pub mod resolver;
pub mod schedule;
pub mod vector;

pub use acqorder::*;
pub use data::*;
pub use enums::*;
pub use error::*;
pub use nucleus::*;
pub use params::*;
pub use resolver::*;
pub use schedule::*;
pub use vector::*;

//! RS2D / SPINit raw data reader and exporter.
//!
//! Parses `header.xml`, reads direct and indirect vectors from `data.dat`
//! (with optional NUS schedule), materializes dataset descriptors and writes
//! processed data back into a `Proc/<n>` directory.

pub mod data;
pub mod export;
pub mod header;
pub mod parameter;

pub use data::{find_fid, has_fid_files, Rs2dData, Rs2dError, Rs2dOptions};
pub use export::{is_valid_dataset_path, save_to_rs2d_file, suggest_name};
pub use header::Header;
pub use parameter::Parameter;

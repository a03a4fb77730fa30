//! Uniform access to raw NMR vendor data.
//!
//! [`open_fid`] picks a reader for a path by running an ordered list of
//! probes; the first probe that accepts the path opens it.

pub use jcamp;
pub use nmrdata_core;
pub use nmrdata_io;
pub use rs2d;

use jcamp::{has_jcamp_extension, JcampData};
use nmrdata_core::{NmrData, NmrDataError, SampleSchedule};
use rs2d::{find_fid, Rs2dData, Rs2dOptions};
use std::path::{Path, PathBuf};

/// Options applied when opening a source of any vendor.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Open a processed dataset instead of a raw FID (RS2D only).
    pub processed: bool,
    /// NUS schedule to attach after opening.
    pub nus_file: Option<PathBuf>,
    pub nus_demo: bool,
}

type Probe = fn(&Path) -> bool;
type Opener = fn(&Path, &OpenOptions) -> Result<Box<dyn NmrData>, NmrDataError>;

/// Readers in probe order.
const READERS: [(&str, Probe, Opener); 2] = [
    ("rs2d", probe_rs2d, open_rs2d),
    ("jcamp", has_jcamp_extension, open_jcamp),
];

fn probe_rs2d(path: &Path) -> bool {
    find_fid(path).is_some()
}

fn open_rs2d(path: &Path, options: &OpenOptions) -> Result<Box<dyn NmrData>, NmrDataError> {
    let options = Rs2dOptions {
        processed: options.processed,
        nus_file: options.nus_file.clone(),
        nus_demo: options.nus_demo,
    };
    Ok(Box::new(Rs2dData::open(path, &options)?))
}

fn open_jcamp(path: &Path, options: &OpenOptions) -> Result<Box<dyn NmrData>, NmrDataError> {
    let mut data = JcampData::open(path)?;
    if let Some(nus) = &options.nus_file {
        data.set_sample_schedule(Some(SampleSchedule::read_file(nus, options.nus_demo)?));
    }
    Ok(Box::new(data))
}

/// Name of the reader that accepts `path`, if any.
pub fn detect_vendor(path: &Path) -> Option<&'static str> {
    let path: PathBuf = path.components().collect();
    READERS
        .iter()
        .find(|(_, probe, _)| probe(&path))
        .map(|(name, _, _)| *name)
}

/// Open `path` with default options.
pub fn open_fid(path: &Path) -> Result<Box<dyn NmrData>, NmrDataError> {
    open_fid_with(path, &OpenOptions::default())
}

/// Open `path` with the first reader whose probe accepts it. A trailing
/// separator is ignored.
pub fn open_fid_with(
    path: &Path,
    options: &OpenOptions,
) -> Result<Box<dyn NmrData>, NmrDataError> {
    let path: PathBuf = path.components().collect();
    for (name, probe, open) in READERS.iter() {
        if probe(&path) {
            log::info!("Opening {} with the {} reader", path.display(), name);
            return open(&path, options);
        }
    }
    Err(NmrDataError::Unsupported(format!(
        "no reader recognises {}",
        path.display()
    )))
}

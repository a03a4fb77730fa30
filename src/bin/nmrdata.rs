//! nmrdata: inspect raw NMR vendor data and export RS2D datasets.

use clap::{Parser, Subcommand};
use nmr_vendor_data::nmrdata_io::{Dataset, GroupDelayCorrection};
use nmr_vendor_data::rs2d::{Rs2dData, Rs2dOptions};
use nmr_vendor_data::{detect_vendor, open_fid_with, OpenOptions};
use nmrdata_core::{NmrData, Samples};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nmrdata",
    version,
    about = "Read raw NMR vendor data (RS2D/SPINit, JCAMP-DX)"
)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print dimensions and per-axis parameters
    Info {
        path: PathBuf,
        /// Read a processed dataset (RS2D Proc directory)
        #[arg(long, default_value_t = false)]
        processed: bool,
    },
    /// List vendor parameters
    Pars { path: PathBuf },
    /// Read one vector and print its samples
    Vector {
        path: PathBuf,
        /// Dimension to read along
        #[arg(short, long, default_value_t = 0)]
        dim: usize,
        /// Vector index
        #[arg(short, long, default_value_t = 0)]
        index: usize,
        /// Interleaved real output
        #[arg(long, default_value_t = false)]
        real: bool,
        /// NUS schedule file
        #[arg(long)]
        nus: Option<PathBuf>,
        /// Treat the NUS schedule as a demo schedule
        #[arg(long, default_value_t = false)]
        demo: bool,
        /// Remove the digital-filter group delay before printing
        #[arg(long, default_value_t = false)]
        correct_gd: bool,
    },
    /// Build a dataset descriptor for an RS2D experiment and save it as JSON
    Materialize {
        path: PathBuf,
        /// Dataset name (default derived from the path)
        #[arg(short, long)]
        name: Option<String>,
        /// Output descriptor (default stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Write a materialized dataset into an RS2D Proc/<n> directory
    Export {
        descriptor: PathBuf,
        proc_dir: PathBuf,
    },
}

fn print_info(data: &dyn NmrData) -> Result<(), Box<dyn std::error::Error>> {
    println!("File:      {}", data.file_path().display());
    println!("Vendor:    {}", data.vendor());
    println!("FID:       {}", data.is_fid());
    println!("Dims:      {}", data.n_dim());
    println!("Vectors:   {}", data.n_vectors());
    println!("Points:    {}", data.n_points());
    println!("Temp (K):  {:.2}", data.temp_k());
    let solvent = data.solvent();
    if !solvent.is_empty() {
        println!("Solvent:   {}", solvent);
    }
    let sequence = data.sequence();
    if !sequence.is_empty() {
        println!("Sequence:  {}", sequence);
    }
    println!("Group delay: {}", data.group_delay());
    for dim in 0..data.n_dim().max(1) {
        println!(
            "  [{}] {:>6} size={} complex={} sf={:.6} sw={:.3} ref={:.4} ft={} coefs={}",
            dim,
            data.tn(dim)?,
            data.size(dim),
            data.is_complex(dim),
            data.sf(dim)?,
            data.sw(dim)?,
            data.ref_value(dim)?,
            data.ft_type(dim),
            data.symbolic_coefs(dim).unwrap_or_else(|| "-".into())
        );
    }
    if data.n_dim() > 1 {
        println!("Acq order: {}", data.acq_order().join(","));
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_secs()
        .init();

    match cli.command {
        Command::Info { path, processed } => {
            let options = OpenOptions {
                processed,
                ..Default::default()
            };
            let mut data = open_fid_with(&path, &options)?;
            print_info(&*data)?;
            data.close();
        }
        Command::Pars { path } => {
            let mut data = open_fid_with(&path, &OpenOptions::default())?;
            for par in data.pars() {
                println!("{} = {}", par.name, par.value);
            }
            data.close();
        }
        Command::Vector {
            path,
            dim,
            index,
            real,
            nus,
            demo,
            correct_gd,
        } => {
            let options = OpenOptions {
                nus_file: nus,
                nus_demo: demo,
                ..Default::default()
            };
            let mut data = open_fid_with(&path, &options)?;
            let mut vec = data.read_vector_dim(dim, index, real)?;
            if correct_gd {
                vec.correct_group_delay();
            }
            println!(
                "# dim={} index={} points={} sw={:.3} sf={:.6} ref={:.4} gd={}",
                dim,
                index,
                vec.len(),
                vec.sw(),
                vec.center_freq,
                vec.ref_value,
                vec.group_delay
            );
            match &vec.samples {
                Samples::Complex(values) => {
                    for (i, c) in values.iter().enumerate() {
                        println!("{}\t{}\t{}", i, c.re, c.im);
                    }
                }
                Samples::Real(values) => {
                    for (i, v) in values.iter().enumerate() {
                        println!("{}\t{}", i, v);
                    }
                }
            }
            data.close();
        }
        Command::Materialize { path, name, out } => {
            if detect_vendor(&path) != Some("rs2d") {
                return Err(format!("{} is not an RS2D experiment", path.display()).into());
            }
            let mut data = Rs2dData::open(&path, &Rs2dOptions::default())?;
            let dataset = data.to_dataset(name.as_deref())?;
            data.close();
            match out {
                Some(out) => dataset.save_json(&out)?,
                None => println!("{}", serde_json::to_string_pretty(&dataset)?),
            }
        }
        Command::Export {
            descriptor,
            proc_dir,
        } => {
            let dataset = Dataset::load_json(&descriptor)?;
            let mut source = Rs2dData::open(&dataset.file, &Rs2dOptions::default())?;
            source.set_header_matrix_dimensions(&dataset);
            source.set_header_phases(&dataset);
            source.write_output_file(&dataset, &proc_dir)?;
            source.close();
            println!("Exported {} to {}", dataset.name, proc_dir.display());
        }
    }
    Ok(())
}

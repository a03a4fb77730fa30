use byteorder::{BigEndian, WriteBytesExt};
use nmrdata_core::{NmrData, NmrDataError, SampleSchedule, Value};
use rs2d::{save_to_rs2d_file, Header, Rs2dData, Rs2dOptions};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const SIZE0: usize = 4;
const ROWS: usize = 6;

fn value(r: usize, j: usize) -> f32 {
    (r * 100 + j + 1) as f32
}

fn base_header() -> Header {
    let mut h = Header::default();
    h.put("OBSERVED_NUCLEUS", Value::Text("1H".into()));
    h.put("NUCLEUS_1", Value::Text("1H".into()));
    h.put("NUCLEUS_2", Value::Text("13C".into()));
    h.put("BASE_FREQ_1", Value::Number(600.0e6));
    h.put("BASE_FREQ_2", Value::Number(150.9e6));
    h.put("OFFSET_FREQ_1", Value::Number(1200.0));
    h.put("SPECTRAL_WIDTH", Value::Number(5000.0));
    h.put("SPECTRAL_WIDTH_2D", Value::Number(20000.0));
    h.put("SR", Value::NumberList(vec![10.0, 0.0]));
    h.put("SAMPLE_TEMPERATURE", Value::Number(298.0));
    h.put("SOLVENT", Value::Text("D2O".into()));
    h.put("ACQUISITION_MATRIX_DIMENSION_1D", Value::Number(SIZE0 as f64));
    h.put("ACQUISITION_MATRIX_DIMENSION_2D", Value::Number(ROWS as f64));
    h.put("ACQUISITION_MATRIX_DIMENSION_3D", Value::Number(1.0));
    h.put("ACQUISITION_MATRIX_DIMENSION_4D", Value::Number(1.0));
    h.put(
        "PHASE_MOD",
        Value::TextList(vec!["None".into(), "States".into()]),
    );
    h
}

fn write_experiment(dir: &Path, header: &Header, rows: usize) {
    std::fs::create_dir_all(dir).unwrap();
    header.write(&dir.join("header.xml")).unwrap();
    let mut out = BufWriter::new(File::create(dir.join("data.dat")).unwrap());
    for r in 0..rows {
        for j in 0..SIZE0 * 2 {
            out.write_f32::<BigEndian>(value(r, j)).unwrap();
        }
    }
}

fn open_2d(header: &Header) -> (tempfile::TempDir, Rs2dData) {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("exp");
    write_experiment(&dir, header, ROWS);
    let data = Rs2dData::open(&dir, &Rs2dOptions::default()).unwrap();
    (tmp, data)
}

#[test]
fn test_layout_and_scheme() {
    let (_tmp, data) = open_2d(&base_header());
    assert_eq!(data.vendor(), "rs2d");
    assert_eq!(data.n_dim(), 2);
    assert_eq!(data.size(0), SIZE0);
    assert_eq!(data.size(1), ROWS / 2);
    assert_eq!(data.n_vectors(), ROWS);
    assert_eq!(data.n_points(), SIZE0);
    assert_eq!(data.bytes_per_vector(), SIZE0 * 8);
    assert!(data.is_complex(0));
    assert!(data.is_complex(1));
    assert!(data.exchange_xy());
    assert_eq!(data.symbolic_coefs(1).as_deref(), Some("hyper"));
    assert!(!data.negate_imag(1));
    assert!(data.is_fid());
    assert_eq!(data.solvent(), "D2O");
    assert_eq!(data.temp_k(), 298.0);
    assert_eq!(data.label_names(), vec!["1H", "13C"]);
}

#[test]
fn test_sf_override_and_reset() {
    let (_tmp, mut data) = open_2d(&base_header());
    let expected = 600.0e6 + 1200.0 / 1.0e6;
    assert_eq!(data.sw(0).unwrap(), 5000.0);
    assert!((data.sf(0).unwrap() - expected).abs() < 1e-6);

    data.set_sf(0, 601.0e6);
    assert_eq!(data.sf(0).unwrap(), 601.0e6);
    assert_eq!(data.sf(0).unwrap(), 601.0e6);

    data.reset_sf(0);
    assert!((data.sf(0).unwrap() - expected).abs() < 1e-6);
    assert_eq!(data.sf(1).unwrap(), 150.9e6);
    assert_eq!(data.sw(1).unwrap(), 20000.0);
}

#[test]
fn test_reference_recomputed_after_reset() {
    let (_tmp, mut data) = open_2d(&base_header());
    let offset = 1200.0;
    let first = data.ref_value(0).unwrap();
    let sf = data.sf(0).unwrap();
    assert!((first - (10.0 + offset) / (sf - offset / 1.0e6)).abs() < 1e-15);

    data.set_sf(0, 500.0e6);
    assert_eq!(data.ref_value(0).unwrap(), first);

    data.reset_ref(0);
    let again = data.ref_value(0).unwrap();
    assert!((again - (10.0 + offset) / (500.0e6 - offset / 1.0e6)).abs() < 1e-15);
    assert!(again != first);

    data.set_ref(1, 4.7);
    assert_eq!(data.ref_value(1).unwrap(), 4.7);
}

#[test]
fn test_missing_keys_fall_back() {
    let mut h = base_header();
    h.put("NUCLEUS_3", Value::Text("15N".into()));
    let (_tmp, mut data) = open_2d(&h);
    // No BASE_FREQ_3 / SPECTRAL_WIDTH_3D / SR[2].
    assert_eq!(data.sf(2).unwrap(), 1.0);
    assert_eq!(data.sw(2).unwrap(), 1.0);
    assert_eq!(data.ref_value(2).unwrap(), 1.0);
    data.reset_sf(2);
    assert_eq!(data.sf(2).unwrap(), 1.0);
    assert_eq!(data.tn(2).unwrap(), "15N");
    assert_eq!(data.tn(3).unwrap(), "");
    assert!(matches!(
        data.sf(4),
        Err(NmrDataError::UnsupportedDimension { dim: 4, .. })
    ));
}

#[test]
fn test_direct_read_exchanges_re_im() {
    let (_tmp, mut data) = open_2d(&base_header());
    let v = data.read_vector(1, false).unwrap();
    let c = v.as_complex().unwrap();
    assert_eq!(c.len(), SIZE0);
    for (k, z) in c.iter().enumerate() {
        assert_eq!(z.re, value(1, 2 * k + 1) as f64);
        assert_eq!(z.im, value(1, 2 * k) as f64);
    }
    assert!((v.dwell - 1.0 / 5000.0).abs() < 1e-15);
    let half_bin = 5000.0 / data.sf(0).unwrap() / 2.0;
    assert!((v.ref_value - (data.ref_value(0).unwrap() + half_bin)).abs() < 1e-15);

    let r = data.read_vector(1, true).unwrap();
    let flat = r.as_real().unwrap();
    assert_eq!(flat.len(), SIZE0 * 2);
    assert_eq!(flat[0], value(1, 1) as f64);
    assert_eq!(flat[1], value(1, 0) as f64);
}

#[test]
fn test_index_out_of_bounds() {
    let (_tmp, mut data) = open_2d(&base_header());
    assert!(matches!(
        data.read_vector(ROWS, false),
        Err(NmrDataError::IndexOutOfBounds { index: 6, count: 6 })
    ));
    assert!(matches!(
        data.read_vector_dim(4, 0, false),
        Err(NmrDataError::UnsupportedDimension { dim: 4, .. })
    ));
    assert_eq!(data.n_dim(), 2);
    assert!(matches!(
        data.read_vector_dim(2, 0, false),
        Err(NmrDataError::UnsupportedDimension { dim: 2, max: 2 })
    ));
    // A contract violation leaves the channel usable.
    assert!(data.read_vector(0, false).is_ok());
}

#[test]
fn test_indirect_dense_read() {
    let (_tmp, mut data) = open_2d(&base_header());
    let v = data.read_vector_dim(1, 1, false).unwrap();
    let c = v.as_complex().unwrap();
    assert_eq!(c.len(), data.size(1) * 2);
    for (i, z) in c.iter().enumerate() {
        assert_eq!(z.re, value(i, 2) as f64);
        assert_eq!(z.im, value(i, 3) as f64);
        assert!(z.re != 0.0 && z.im != 0.0);
    }
    assert_eq!(v.center_freq, 150.9e6);
    assert!((v.dwell - 1.0 / 20000.0).abs() < 1e-15);
    assert_eq!(v.group_delay, 0.0);

    let r = data.read_vector_dim(1, 1, true).unwrap();
    let flat = r.as_real().unwrap();
    assert_eq!(flat.len(), 6);
    assert_eq!(flat[4], value(4, 2) as f64);
}

#[test]
fn test_indirect_nus_read_matches_dense() {
    let (_tmp, mut data) = open_2d(&base_header());
    let dense = data.read_vector_dim(1, 1, false).unwrap();
    let dense = dense.as_complex().unwrap().to_vec();

    let schedule = SampleSchedule::from_points(vec![vec![0], vec![2]], false).unwrap();
    data.set_sample_schedule(Some(schedule));
    let nus = data.read_vector_dim(1, 1, false).unwrap();
    let nus = nus.as_complex().unwrap();
    assert_eq!(nus.len(), dense.len());
    assert_eq!(nus[0], dense[0]);
    assert_eq!(nus[1], dense[1]);
    assert_eq!(nus[2].re, 0.0);
    assert_eq!(nus[2].im, 0.0);
    assert_eq!(nus[3].re, 0.0);
    assert_eq!(nus[3].im, 0.0);
    assert_eq!(nus[4], dense[2]);
    assert_eq!(nus[5], dense[3]);
}

#[test]
fn test_nus_file_option() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("exp");
    write_experiment(&dir, &base_header(), ROWS);
    let nus = tmp.path().join("nuslist");
    std::fs::write(&nus, "0\n2\n").unwrap();
    let options = Rs2dOptions {
        nus_file: Some(nus),
        ..Default::default()
    };
    let mut data = Rs2dData::open(&dir.join("data.dat"), &options).unwrap();
    assert_eq!(data.sample_schedule().unwrap().total_samples(), 2);

    data.set_acq_order(&["21".to_string()]);
    assert_eq!(data.acq_order(), vec!["p1", "d1"]);
    assert_eq!(data.acq_order_short(), "21");
}

#[test]
fn test_group_delay_shifts_indirect_columns() {
    let mut h = base_header();
    h.put("DIGITAL_FILTER_SHIFT", Value::Number(1.0));
    h.put("DIGITAL_FILTER_REMOVED", Value::Bool(false));
    let (_tmp, mut data) = open_2d(&h);
    assert_eq!(data.group_delay(), 1.0);
    assert_eq!(data.read_vector(0, false).unwrap().group_delay, 1.0);

    let shifted = data.read_vector_dim(1, 0, false).unwrap();
    assert_eq!(shifted.as_complex().unwrap()[0].re, value(0, 2) as f64);
    assert_eq!(shifted.group_delay, 0.0);

    let real = data.read_vector_dim(1, 0, true).unwrap();
    assert_eq!(real.as_real().unwrap()[0], value(0, 0) as f64);

    h.put("DIGITAL_FILTER_REMOVED", Value::Bool(true));
    let (_tmp2, data) = open_2d(&h);
    assert_eq!(data.group_delay(), 0.0);
}

#[test]
fn test_short_read_closes_channel() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("exp");
    write_experiment(&dir, &base_header(), ROWS - 1);
    let mut data = Rs2dData::open(&dir, &Rs2dOptions::default()).unwrap();
    assert!(matches!(
        data.read_vector(ROWS - 1, false),
        Err(NmrDataError::ReadIo { expected: 32, got: 0, .. })
    ));
    assert!(matches!(
        data.read_vector(0, false),
        Err(NmrDataError::ChannelClosed)
    ));
}

#[test]
fn test_close_is_idempotent() {
    let (_tmp, mut data) = open_2d(&base_header());
    data.close();
    data.close();
    assert!(matches!(
        data.read_vector(0, false),
        Err(NmrDataError::ChannelClosed)
    ));
}

#[test]
fn test_acquisition_mode_fallback() {
    let mut h = base_header();
    let mut reduced = Header::default();
    for (k, v) in h.all() {
        if k != "PHASE_MOD" {
            reduced.put(k, v.clone());
        }
    }
    reduced.put(
        "ACQUISITION_MODE",
        Value::TextList(vec!["COMPLEX".into(), "TPPI".into()]),
    );
    h = reduced;
    let (_tmp, data) = open_2d(&h);
    assert!(!data.is_complex(1));
    assert!(data.negate_imag(1));
    assert_eq!(data.size(1), ROWS);
}

#[test]
fn test_pars_listing() {
    let (_tmp, data) = open_2d(&base_header());
    let pars = data.pars();
    assert_eq!(pars.len(), base_header().len());
    assert!(pars
        .iter()
        .any(|p| p.name == "PHASE_MOD" && p.value == "None,States"));
}

#[test]
fn test_to_dataset_layout() {
    let (_tmp, mut data) = open_2d(&base_header());
    data.set_sw(1, 1.0);
    let ds = data.to_dataset(Some("demo")).unwrap();
    assert_eq!(ds.name, "demo");
    assert_eq!(ds.layout.size(0), Some(SIZE0 * 2));
    assert_eq!(ds.layout.block_size(0), Some(SIZE0 * 2));
    assert_eq!(ds.layout.size(1), Some(ROWS / 2));
    assert_eq!(ds.layout.block_size(1), Some(1));
    assert!(ds.axis(2).is_none());
    let (a0, a1) = (ds.axis(0).unwrap(), ds.axis(1).unwrap());
    assert!(a0.complex);
    assert!(!a1.complex);
    assert!(a1.reversed);
    assert!(!a0.reversed);
    assert_eq!(a1.sw, 20000.0);
    assert_eq!(a0.label, "1H1");
    assert_eq!(a1.label, "13C2");
    assert_eq!(a0.ref_point, 2.0);
    assert_eq!(a1.ref_point, 1.5);
    assert!(a0.freq_domain);
    assert!(ds.file.ends_with("data.dat"));
}

#[test]
fn test_save_rows_reversed() {
    let (tmp, mut data) = open_2d(&base_header());
    let ds = data.to_dataset(Some("demo")).unwrap();
    let out = tmp.path().join("out.dat");
    save_to_rs2d_file(&ds, &out).unwrap();
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(bytes.len(), (ROWS / 2) * SIZE0 * 2 * 4);
    let first = f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(first, value(2, 0));
}

#[test]
fn test_export_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let mut h = Header::default();
    for (k, v) in base_header().all() {
        if !k.contains("_2") && k != "PHASE_MOD" && k != "NUCLEUS_2" {
            h.put(k, v.clone());
        }
    }
    h.put("ACQUISITION_MATRIX_DIMENSION_2D", Value::Number(1.0));
    let src = tmp.path().join("src");
    write_experiment(&src, &h, 1);
    let mut source = Rs2dData::open(&src, &Rs2dOptions::default()).unwrap();
    assert_eq!(source.n_dim(), 1);

    let proc_dir = tmp.path().join("Study A").join("7").join("Proc").join("1");
    std::fs::create_dir_all(&proc_dir).unwrap();
    let mut layout = nmrdata_io::DatasetLayout::new(1);
    layout.set_size(0, SIZE0 * 2).unwrap();
    layout.set_block_size(0, SIZE0 * 2).unwrap();
    layout.dim_dataset();
    let mut ds = nmrdata_io::Dataset::new(
        proc_dir.join("rows.nv"),
        "rows",
        layout,
        nmrdata_io::ByteOrderKind::BigEndian,
        0,
    );
    let axis = ds.axis_mut(0).unwrap();
    axis.complex = true;
    axis.ph0 = 12.5;
    let orig: Vec<f32> = (0..SIZE0 * 2).map(|j| j as f32 * 0.5 - 1.0).collect();
    ds.write_row(&[], &orig).unwrap();

    let written = source.save_dataset(&ds).unwrap();
    assert_eq!(written, proc_dir);
    assert_eq!(rs2d::suggest_name(&proc_dir), "Study_A_7_1");

    let header = Header::read(&proc_dir.join("header.xml")).unwrap();
    assert_eq!(
        nmrdata_core::ParameterStore::int_value(&header, "MATRIX_DIMENSION_1D").unwrap(),
        SIZE0 as i64
    );
    assert_eq!(
        nmrdata_core::ParameterStore::double_list(&header, "PHASE_0").unwrap(),
        vec![12.5]
    );

    let mut raw = Rs2dData::open(&proc_dir, &Rs2dOptions::default()).unwrap();
    let v = raw.read_vector_dim(0, 0, false).unwrap();
    for (k, z) in v.as_complex().unwrap().iter().enumerate() {
        assert!((z.re - orig[2 * k + 1] as f64).abs() < 1e-6);
        assert!((z.im - orig[2 * k] as f64).abs() < 1e-6);
    }

    let processed = Rs2dOptions {
        processed: true,
        ..Default::default()
    };
    let mut proc = Rs2dData::open(&proc_dir, &processed).unwrap();
    assert_eq!(proc.size(0), SIZE0);
    let v = proc.read_vector(0, false).unwrap();
    for (k, z) in v.as_complex().unwrap().iter().enumerate() {
        assert!((z.re - orig[2 * k] as f64).abs() < 1e-6);
        assert!((z.im + orig[2 * k + 1] as f64).abs() < 1e-6);
    }
}

#[test]
fn test_write_output_requires_proc_dir() {
    let (tmp, mut data) = open_2d(&base_header());
    let ds = data.to_dataset(Some("demo")).unwrap();
    let bad = tmp.path().join("out").join("1");
    assert!(data.write_output_file(&ds, &bad).is_err());
}

#[test]
fn test_save_rejects_inconsistent_dataset() {
    let (tmp, mut data) = open_2d(&base_header());
    let mut ds = data.to_dataset(Some("demo")).unwrap();
    ds.axes.truncate(1);
    let out = tmp.path().join("broken.dat");
    assert!(matches!(
        save_to_rs2d_file(&ds, &out),
        Err(rs2d::Rs2dError::Dataset(nmrdata_io::DatasetError::Inconsistent(_)))
    ));
    assert!(!out.exists());
}

use jcamp::{has_jcamp_extension, JcampData};
use nmrdata_core::{FtType, NmrData, NmrDataError};
use std::path::PathBuf;

const FID_1D: &str = "##TITLE= jcamp fid
##JCAMP-DX= 6.00
##DATA TYPE= NMR FID
##ORIGIN= Bruker BioSpin GmbH
##.OBSERVE FREQUENCY= 400.13
##.OBSERVE NUCLEUS= ^1H
##.SOLVENT NAME= CDCl3
##.PULSE SEQUENCE= zg30
##TEMPERATURE= 25
##$SW_h= 8000
##$TD= 8
##$AQ_mod= 3
##$PHC0= 30
##$PHC1= -12
##$GRPDLY= 67.98
##NTUPLES= NMR FID
##VAR_NAME= TIME, FID/REAL, FID/IMAG, PAGE NUMBER
##SYMBOL= X, R, I, PAGE
##VAR_DIM= 4, 4, 4, 2
##UNITS= HZ, ARBITRARY UNITS, ARBITRARY UNITS,
##FIRST= 800.26, 1, 5,
##FACTOR= 1, 1, 0.5, 1
##PAGE= N=1
##DATA TABLE= (X++(R..R)), XYDATA
0 A J J
2 C J
##PAGE= N=2
##DATA TABLE= (X++(I..I)), XYDATA
0 10 12 14 16
##END NTUPLES= NMR FID
##END=
";

const FID_2D: &str = "##TITLE= jcamp 2d
##JCAMP-DX= 6.00
##DATA TYPE= NMR FID
##NUM DIM= 2
##$BF1= 400.13
##$BF2= 100.6
##$SW_h= 8000, 20000
##$TD= 8, 4
##$FnMODE= 0, 6
##TEMPERATURE= 300
##NTUPLES= NMR FID
##SYMBOL= X, R, I, PAGE
##PAGE= N=1
##DATA TABLE= (X++(R..R)), XYDATA
0 1 2 3 4
##PAGE= N=1
##DATA TABLE= (X++(I..I)), XYDATA
0 5 6 7 8
##PAGE= N=2
##DATA TABLE= (X++(R..R)), XYDATA
0 9 10 11 12
##PAGE= N=2
##DATA TABLE= (X++(I..I)), XYDATA
0 13 14 15 16
##END NTUPLES= NMR FID
##END=
";

fn write_doc(name: &str, text: &str) -> (tempfile::TempDir, PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join(name);
    std::fs::write(&path, text).unwrap();
    (tmp, path)
}

#[test]
fn test_open_1d_parameters() {
    let (_tmp, path) = write_doc("fid.jdx", FID_1D);
    assert!(has_jcamp_extension(&path));
    let data = JcampData::open(&path).unwrap();
    assert_eq!(data.vendor(), "jcamp");
    assert_eq!(data.origin(), "Bruker BioSpin GmbH");
    assert_eq!(data.n_dim(), 1);
    assert_eq!(data.size(0), 4);
    assert_eq!(data.n_points(), 4);
    assert_eq!(data.n_vectors(), 1);
    assert!(data.is_fid());
    assert!(data.is_complex(0));
    assert_eq!(data.ft_type(0), FtType::Ft);
    assert!(data.coefs(0).is_empty());
    assert!(data.symbolic_coefs(0).is_none());
    assert!(!data.negate_imag(0));

    assert_eq!(data.sf(0).unwrap(), 400.13);
    assert_eq!(data.sw(0).unwrap(), 8000.0);
    assert!((data.ref_value(0).unwrap() - 2.0).abs() < 1e-12);
    assert_eq!(data.tn(0).unwrap(), "1H");
    assert!((data.temp_k() - 298.15).abs() < 1e-9);
    assert_eq!(data.solvent(), "CDCl3");
    assert_eq!(data.sequence(), "zg30");
    assert_eq!(data.ph0(0), 60.0);
    assert_eq!(data.ph1(0), 12.0);
    assert_eq!(data.group_delay(), 67.98);
    assert_eq!(data.ref_point(0), 2.0);
}

#[test]
fn test_read_vector_swaps_real_and_imaginary() {
    let (_tmp, path) = write_doc("fid.jdx", FID_1D);
    let mut data = JcampData::open(&path).unwrap();
    let v = data.read_vector(0, false).unwrap();
    let c = v.as_complex().unwrap();
    let expected = [(5.0, 1.0), (6.0, 2.0), (7.0, 3.0), (8.0, 4.0)];
    assert_eq!(c.len(), expected.len());
    for (z, (re, im)) in c.iter().zip(expected) {
        assert_eq!(z.re, re);
        assert_eq!(z.im, im);
    }
    assert!((v.dwell - 1.0 / 8000.0).abs() < 1e-15);
    assert_eq!(v.center_freq, 400.13);
    let half_bin = 8000.0 / 400.13 / 2.0;
    assert!((v.ref_value - (2.0 + half_bin)).abs() < 1e-9);
    assert_eq!(v.group_delay, 67.98);

    let flat = data.read_vector(0, true).unwrap();
    assert_eq!(
        flat.as_real().unwrap(),
        &[5.0, 1.0, 6.0, 2.0, 7.0, 3.0, 8.0, 4.0]
    );
}

#[test]
fn test_dimension_limits() {
    let (_tmp, path) = write_doc("fid.dx", FID_1D);
    let mut data = JcampData::open(&path).unwrap();
    assert!(matches!(
        data.sf(1),
        Err(NmrDataError::MissingParameter(_))
    ));
    assert!(matches!(
        data.sf(2),
        Err(NmrDataError::UnsupportedDimension { dim: 2, max: 2 })
    ));
    assert!(matches!(
        data.read_vector_dim(2, 0, false),
        Err(NmrDataError::UnsupportedDimension { dim: 2, .. })
    ));
    assert!(matches!(
        data.read_vector_dim(1, 0, false),
        Err(NmrDataError::Unsupported(_))
    ));
    assert!(matches!(
        data.read_vector(1, false),
        Err(NmrDataError::IndexOutOfBounds { index: 1, count: 1 })
    ));
    assert!(data.read_vector_dim(0, 0, false).is_ok());
    data.close();
    assert!(data.read_vector(0, false).is_ok());
}

#[test]
fn test_overrides_and_reset() {
    let (_tmp, path) = write_doc("fid.jdx", FID_1D);
    let mut data = JcampData::open(&path).unwrap();
    data.set_sf(0, 500.0);
    assert_eq!(data.sf(0).unwrap(), 500.0);
    data.reset_sf(0);
    assert_eq!(data.sf(0).unwrap(), 400.13);

    data.set_sw(0, 1000.0);
    assert_eq!(data.sw(0).unwrap(), 1000.0);
    data.reset_sw(0);
    assert_eq!(data.sw(0).unwrap(), 8000.0);

    data.set_ref(0, 4.7);
    assert_eq!(data.ref_value(0).unwrap(), 4.7);
    data.reset_ref(0);
    assert!((data.ref_value(0).unwrap() - 2.0).abs() < 1e-12);

    data.set_size(0, 2);
    assert_eq!(data.size(0), 2);
    data.set_complex(0, false);
    assert!(!data.is_complex(0));
}

#[test]
fn test_pars_block_first_and_deduplicated() {
    let (_tmp, path) = write_doc("fid.jdx", FID_1D);
    let data = JcampData::open(&path).unwrap();
    let pars = data.pars();
    assert_eq!(pars[0].name, "TITLE");
    assert_eq!(pars[0].value, "jcamp fid");
    assert!(pars.iter().any(|p| p.name == "$SW_h" && p.value == "8000"));
    let titles = pars.iter().filter(|p| p.name == "TITLE").count();
    assert_eq!(titles, 1);
}

#[test]
fn test_two_dimensional_scheme() {
    let (_tmp, path) = write_doc("hsqc.jdx", FID_2D);
    let mut data = JcampData::open(&path).unwrap();
    assert_eq!(data.n_dim(), 2);
    assert_eq!(data.size(1), 2);
    assert_eq!(data.n_vectors(), 2);
    assert!(data.is_complex(1));
    assert_eq!(data.ft_type(1), FtType::Ft);
    assert_eq!(data.symbolic_coefs(1).as_deref(), Some("echo-antiecho-r"));
    assert_eq!(data.coefs(1), vec![1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
    assert!(data.negate_imag(1));
    assert_eq!(data.sf(1).unwrap(), 100.6);
    assert_eq!(data.sw(1).unwrap(), 20000.0);
    assert_eq!(data.tn(0).unwrap(), "1H");
    assert_eq!(data.tn(1).unwrap(), "13C");
    assert_eq!(data.label_names(), vec!["1H", "13C"]);
    assert_eq!(data.temp_k(), 300.0);
    assert_eq!(data.ref_value(0).unwrap(), 0.0);

    let second = data.read_vector(1, false).unwrap();
    let c = second.as_complex().unwrap();
    assert_eq!(c[0].re, 13.0);
    assert_eq!(c[0].im, 9.0);

    data.set_acq_order(&["21".to_string()]);
    assert_eq!(data.acq_order(), vec!["p1", "d1"]);
    data.reset_acq_order();
    assert_eq!(data.acq_order_short(), "21");
}

#[test]
fn test_fn_mode_negate_and_real() {
    let text = FID_2D.replace("##$FnMODE= 0, 6", "##$FnMODE= 0, 5");
    let (_tmp, path) = write_doc("a.jdx", &text);
    let data = JcampData::open(&path).unwrap();
    assert_eq!(data.ft_type(1), FtType::Negate);
    assert!(data.negate_pairs(1));
    assert_eq!(data.symbolic_coefs(1).as_deref(), Some("hyper"));

    let text = FID_2D.replace("##$FnMODE= 0, 6", "##$FnMODE= 0, 3");
    let (_tmp, path) = write_doc("b.jdx", &text);
    let data = JcampData::open(&path).unwrap();
    assert!(!data.is_complex(1));
    assert_eq!(data.ft_type(1), FtType::Rft);
    assert!(data.coefs(1).is_empty());

    let text = FID_2D.replace("##$FnMODE= 0, 6", "##$FnMODE= 0, 1");
    let (_tmp, path) = write_doc("qf.jdx", &text);
    let data = JcampData::open(&path).unwrap();
    assert!(data.is_complex(1));

    let text = FID_2D.replace("##$FnMODE= 0, 6\n", "");
    let (_tmp, path) = write_doc("none.jdx", &text);
    let data = JcampData::open(&path).unwrap();
    assert!(data.is_complex(1));
}

#[test]
fn test_plain_xydata_spectrum() {
    let text = "##TITLE= spectrum
##JCAMP-DX= 5.01
##DATA TYPE= NMR SPECTRUM
##.OBSERVE FREQUENCY= 100.6
##$SW_h= 20000
##XUNITS= PPM
##FIRSTX= 210.5
##YFACTOR= 2
##XYDATA= (X++(Y..Y))
0 @A%JT
##END=
";
    let (_tmp, path) = write_doc("c.jdx", text);
    let mut data = JcampData::open(&path).unwrap();
    assert!(!data.is_fid());
    assert!(!data.is_complex(0));
    assert_eq!(data.size(0), 5);
    assert_eq!(data.ref_value(0).unwrap(), 210.5);
    assert_eq!(data.tn(0).unwrap(), "13C");
    let v = data.read_vector(0, false).unwrap();
    assert_eq!(v.as_real().unwrap(), &[0.0, 2.0, 2.0, 4.0, 6.0]);
}

#[test]
fn test_missing_file_and_bad_document() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(JcampData::open(&tmp.path().join("none.jdx")).is_err());
    let (_tmp, path) = write_doc("bad.jdx", "##TITLE= x\n##BROKEN\n");
    let err: NmrDataError = JcampData::open(&path).unwrap_err().into();
    assert!(matches!(err, NmrDataError::HeaderParse(_)));
}

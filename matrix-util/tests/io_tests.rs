use matrix_util::common_io::create_temp_dir_file;
use matrix_util::traits::{IoOps, SampleOps};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn dmatrix_io_test() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let xx = DMatrix::<f64>::rnorm_with(20, 20, &mut rng);

    let tsv_file = create_temp_dir_file("txt.gz")?;
    xx.to_tsv(tsv_file.to_str().unwrap())?;

    let yy = DMatrix::<f64>::read_tsv(tsv_file.to_str().unwrap())?;

    // `{}` formatting of f64 round-trips exactly
    assert_eq!(xx, yy);

    Ok(())
}

#[test]
fn empty_file_is_empty_matrix() -> anyhow::Result<()> {
    let tsv_file = create_temp_dir_file("txt")?;
    std::fs::write(&tsv_file, "")?;
    let yy = DMatrix::<f64>::read_tsv(tsv_file.to_str().unwrap())?;
    assert_eq!(yy.nrows(), 0);
    assert_eq!(yy.ncols(), 0);
    Ok(())
}

#[test]
fn ragged_rows_are_rejected() -> anyhow::Result<()> {
    let tsv_file = create_temp_dir_file("txt")?;
    std::fs::write(&tsv_file, "1\t0.5\n0.5\n")?;
    assert!(DMatrix::<f64>::read_tsv(tsv_file.to_str().unwrap()).is_err());
    Ok(())
}

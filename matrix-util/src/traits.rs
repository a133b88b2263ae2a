use crate::common_io::Delimiter;
use rand::Rng;

/// Read and write a dense matrix as delimited text
pub trait IoOps {
    type Mat;

    /// An empty file gives a `0 x 0` matrix
    fn read_file_delim(file_path: &str, delim: impl Into<Delimiter>) -> anyhow::Result<Self::Mat>;

    fn write_file_delim(&self, file_path: &str, delim: &str) -> anyhow::Result<()>;

    fn read_tsv(file_path: &str) -> anyhow::Result<Self::Mat> {
        Self::read_file_delim(file_path, "\t")
    }

    fn to_tsv(&self, file_path: &str) -> anyhow::Result<()> {
        self.write_file_delim(file_path, "\t")
    }
}

/// Draw random vectors/matrices from a caller-owned generator, so
/// that a seeded stream is consumed in a reproducible order.
pub trait SampleOps {
    type Mat;

    /// Sample from `N(0,1)`
    fn rnorm_with<R: Rng + ?Sized>(nrows: usize, ncols: usize, rng: &mut R) -> Self::Mat;
}

/// Column-wise standardization
pub trait MatOps {
    type Mat;

    /// Centre each column and scale it to unit variance
    fn scale_columns_inplace(&mut self);

    /// Correlation `X'X / n` of standardized columns
    fn column_correlation(&self) -> Self::Mat;
}

use crate::traits::{MatOps, SampleOps};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

impl SampleOps for DMatrix<f64> {
    type Mat = Self;

    fn rnorm_with<R: Rng + ?Sized>(nrows: usize, ncols: usize, rng: &mut R) -> Self::Mat {
        // column-major fill order
        DMatrix::<f64>::from_iterator(
            nrows,
            ncols,
            (0..(nrows * ncols)).map(|_| StandardNormal.sample(rng)),
        )
    }
}

impl SampleOps for DVector<f64> {
    type Mat = Self;

    fn rnorm_with<R: Rng + ?Sized>(nrows: usize, ncols: usize, rng: &mut R) -> Self::Mat {
        debug_assert_eq!(ncols, 1);
        DVector::<f64>::from_iterator(nrows, (0..nrows).map(|_| StandardNormal.sample(rng)))
    }
}

impl MatOps for DMatrix<f64> {
    type Mat = Self;

    fn scale_columns_inplace(&mut self) {
        let n = self.nrows() as f64;
        if n < 1.0 {
            return;
        }
        for mut x_j in self.column_iter_mut() {
            let mu = x_j.sum() / n;
            x_j.add_scalar_mut(-mu);
            let sd = (x_j.norm_squared() / n).sqrt();
            if sd > 0.0 {
                x_j /= sd;
            }
        }
    }

    fn column_correlation(&self) -> Self::Mat {
        let mut x = self.clone();
        x.scale_columns_inplace();
        let n = x.nrows().max(1) as f64;
        let mut rr = x.transpose() * &x / n;
        // exact symmetry for the Cholesky downstream
        for i in 0..rr.nrows() {
            for j in (i + 1)..rr.ncols() {
                let avg = 0.5 * (rr[(i, j)] + rr[(j, i)]);
                rr[(i, j)] = avg;
                rr[(j, i)] = avg;
            }
        }
        rr
    }
}

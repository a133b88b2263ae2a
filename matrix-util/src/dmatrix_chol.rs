use nalgebra::{Cholesky, DMatrix, DVector};

/// Lower-triangular Cholesky factor `L` of a symmetric positive
/// definite block, `D = L L'`.
#[derive(Debug, Clone)]
pub struct BlockCholesky {
    l: DMatrix<f64>,
}

impl BlockCholesky {
    /// Factorize `dd`. Returns `None` if `dd` is not numerically
    /// positive definite.
    pub fn factorize(dd: &DMatrix<f64>) -> Option<Self> {
        if !dd.is_square() {
            return None;
        }
        let chol = Cholesky::new(dd.clone())?;
        let l = chol.l();
        if l.iter().any(|x| !x.is_finite()) {
            return None;
        }
        Some(Self { l })
    }

    pub fn lower(&self) -> &DMatrix<f64> {
        &self.l
    }

    /// Solve `L y = b` (forward substitution)
    pub fn solve_lower(&self, b: &DVector<f64>) -> Option<DVector<f64>> {
        let mut y = b.clone();
        self.solve_lower_mut(&mut y).then_some(y)
    }

    pub fn solve_lower_mut(&self, b: &mut DVector<f64>) -> bool {
        self.l.solve_lower_triangular_mut(b)
    }

    /// Solve `L' x = y` (backward substitution)
    pub fn solve_upper(&self, y: &DVector<f64>) -> Option<DVector<f64>> {
        let mut x = y.clone();
        self.solve_upper_mut(&mut x).then_some(x)
    }

    pub fn solve_upper_mut(&self, y: &mut DVector<f64>) -> bool {
        self.l.tr_solve_lower_triangular_mut(y)
    }
}

/// `R + diag(d)`
pub fn add_diagonal(rr: &DMatrix<f64>, d: &DVector<f64>) -> DMatrix<f64> {
    debug_assert_eq!(rr.nrows(), d.len());
    let mut ret = rr.clone();
    for (i, &d_i) in d.iter().enumerate() {
        ret[(i, i)] += d_i;
    }
    ret
}

/// `x' D x`
pub fn quad_form(dd: &DMatrix<f64>, x: &DVector<f64>) -> f64 {
    x.dot(&(dd * x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[rustfmt::skip]
    fn spd3() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 3, &[
            4.0, 1.0, 0.5,
            1.0, 3.0, 0.2,
            0.5, 0.2, 2.0,
        ])
    }

    #[test]
    fn test_factor_reconstructs() {
        let dd = spd3();
        let chol = BlockCholesky::factorize(&dd).unwrap();
        let l = chol.lower();
        assert_abs_diff_eq!(l * l.transpose(), dd, epsilon = 1e-12);
        for i in 0..3 {
            for j in (i + 1)..3 {
                assert_eq!(l[(i, j)], 0.0);
            }
        }
    }

    #[test]
    fn test_two_triangular_solves_invert() {
        let dd = spd3();
        let b = DVector::from_vec(vec![1.0, -2.0, 0.5]);
        let chol = BlockCholesky::factorize(&dd).unwrap();
        let y = chol.solve_lower(&b).unwrap();
        let x = chol.solve_upper(&y).unwrap();
        assert_abs_diff_eq!(&dd * &x, b, epsilon = 1e-12);
    }

    #[test]
    fn test_not_positive_definite() {
        #[rustfmt::skip]
        let dd = DMatrix::from_row_slice(2, 2, &[
            2.0, 5.0,
            5.0, 2.0,
        ]);
        assert!(BlockCholesky::factorize(&dd).is_none());
    }

    #[test]
    fn test_add_diagonal_and_quad_form() {
        let rr = DMatrix::<f64>::identity(2, 2);
        let d = DVector::from_vec(vec![1.0, 3.0]);
        let dd = add_diagonal(&rr, &d);
        assert_eq!(dd[(0, 0)], 2.0);
        assert_eq!(dd[(1, 1)], 4.0);
        assert_eq!(dd[(0, 1)], 0.0);
        let x = DVector::from_vec(vec![1.0, 2.0]);
        assert_abs_diff_eq!(quad_form(&dd, &x), 2.0 + 16.0, epsilon = 1e-12);
    }
}

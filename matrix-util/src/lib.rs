pub mod common_io;
pub mod dmatrix_chol;
pub mod dmatrix_io;
pub mod dmatrix_util;
pub mod traits;

pub use nalgebra::{DMatrix, DVector};

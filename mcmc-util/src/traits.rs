use nalgebra::DVector;

/// A parameter that can be averaged element-wise across MCMC draws
pub trait McmcParam: Clone {
    fn as_slice(&self) -> &[f64];
    fn as_mut_slice(&mut self) -> &mut [f64];

    fn dim(&self) -> usize {
        self.as_slice().len()
    }
}

impl McmcParam for DVector<f64> {
    fn as_slice(&self) -> &[f64] {
        self.as_slice()
    }
    fn as_mut_slice(&mut self) -> &mut [f64] {
        self.as_mut_slice()
    }
}

impl McmcParam for f64 {
    fn as_slice(&self) -> &[f64] {
        std::slice::from_ref(self)
    }
    fn as_mut_slice(&mut self) -> &mut [f64] {
        std::slice::from_mut(self)
    }
}

use crate::traits::McmcParam;

/// Posterior mean accumulated on the fly: each kept draw adds
/// `x / n_retained`, so that the sum stays on the scale of `x`.
#[derive(Debug, Clone)]
pub struct RunningMean<P: McmcParam> {
    mean: P,
    n_retained: usize,
    n_added: usize,
}

impl<P: McmcParam> RunningMean<P> {
    /// `template` only fixes the shape; its values are zeroed.
    pub fn new(template: &P, n_retained: usize) -> Self {
        let mut mean = template.clone();
        mean.as_mut_slice().fill(0.0);
        Self {
            mean,
            n_retained,
            n_added: 0,
        }
    }

    pub fn add(&mut self, x: &P) {
        debug_assert_eq!(x.dim(), self.mean.dim());
        let denom = self.n_retained as f64;
        for (m, &v) in self.mean.as_mut_slice().iter_mut().zip(x.as_slice()) {
            *m += v / denom;
        }
        self.n_added += 1;
    }

    pub fn n_retained(&self) -> usize {
        self.n_retained
    }

    pub fn is_complete(&self) -> bool {
        self.n_added == self.n_retained
    }

    pub fn mean(&self) -> &P {
        &self.mean
    }

    pub fn into_mean(self) -> P {
        self.mean
    }
}

/// Kept MCMC draws of one parameter
#[derive(Debug, Clone)]
pub struct McmcTrace<P: McmcParam> {
    pub samples: Vec<P>,
}

impl<P: McmcParam> Default for McmcTrace<P> {
    fn default() -> Self {
        Self { samples: vec![] }
    }
}

impl<P: McmcParam> McmcTrace<P> {
    pub fn push(&mut self, x: &P) {
        self.samples.push(x.clone());
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Element-wise posterior mean across samples.
    pub fn posterior_mean(&self) -> Vec<f64> {
        let n = self.n_samples();
        if n == 0 {
            return vec![];
        }
        let d = self.samples[0].dim();
        let mut mean = vec![0.0; d];
        for sample in &self.samples {
            for (m, &v) in mean.iter_mut().zip(sample.as_slice()) {
                *m += v;
            }
        }
        let inv_n = 1.0 / n as f64;
        for m in &mut mean {
            *m *= inv_n;
        }
        mean
    }

    /// Element-wise posterior variance across samples.
    pub fn posterior_variance(&self) -> Vec<f64> {
        let n = self.n_samples();
        if n < 2 {
            return vec![];
        }
        let mean = self.posterior_mean();
        let mut var = vec![0.0; mean.len()];
        for sample in &self.samples {
            for ((v, &x), &mu) in var.iter_mut().zip(sample.as_slice()).zip(&mean) {
                *v += (x - mu) * (x - mu);
            }
        }
        let inv = 1.0 / (n - 1) as f64;
        for v in &mut var {
            *v *= inv;
        }
        var
    }
}

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("number of iterations ({n_iter}) must exceed burn-in ({n_burnin})")]
    TooFewIterations { n_iter: usize, n_burnin: usize },

    #[error("thinning interval must be at least 1")]
    ZeroThinning,

    #[error("post burn-in iterations ({kept}) must be a multiple of the thinning interval ({thin})")]
    UnevenThinning { kept: usize, thin: usize },
}

/// Burn-in and thinning of an MCMC run. Iterations are numbered
/// `1..=n_iter`; iteration `itr` is kept if it is past burn-in and a
/// multiple of `thin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSchedule {
    pub n_iter: usize,
    pub n_burnin: usize,
    pub thin: usize,
}

impl Default for SampleSchedule {
    fn default() -> Self {
        Self {
            n_iter: 1000,
            n_burnin: 500,
            thin: 5,
        }
    }
}

impl SampleSchedule {
    pub fn new(n_iter: usize, n_burnin: usize, thin: usize) -> Self {
        Self {
            n_iter,
            n_burnin,
            thin,
        }
    }

    /// With `n_iter - n_burnin` a multiple of `thin`, the number of
    /// kept iterations is exactly `(n_iter - n_burnin) / thin`.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.n_iter <= self.n_burnin {
            return Err(ScheduleError::TooFewIterations {
                n_iter: self.n_iter,
                n_burnin: self.n_burnin,
            });
        }
        if self.thin == 0 {
            return Err(ScheduleError::ZeroThinning);
        }
        let kept = self.n_iter - self.n_burnin;
        if !kept.is_multiple_of(self.thin) {
            return Err(ScheduleError::UnevenThinning {
                kept,
                thin: self.thin,
            });
        }
        Ok(())
    }

    pub fn n_retained(&self) -> usize {
        (self.n_iter - self.n_burnin) / self.thin
    }

    pub fn is_retained(&self, itr: usize) -> bool {
        itr > self.n_burnin && itr.is_multiple_of(self.thin)
    }

    pub fn iterations(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.n_iter
    }
}

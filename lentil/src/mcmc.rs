//! Gibbs sampler for PRS-CS: posterior effect sizes under a
//! continuous shrinkage prior given marginal GWAS effects and blockwise
//! LD.
//!
//! Model, for `p` variants and GWAS sample size `n`:
//!
//! * `beta_j | psi_j, sigma ~ N(0, sigma / n * psi_j)`
//! * `psi_j | delta_j ~ Gamma(a, delta_j)`, `delta_j ~ Gamma(b, phi)`
//! * `phi` fixed, or `phi | w ~ Gamma(1/2, w)`, `w ~ Gamma(1/2, 1)`
//!
//! Each iteration draws, in order: `beta` block by block, `sigma`,
//! `delta`, `psi` (GIG), and `phi` when it is not fixed.

use crate::error::McmcError;
use crate::ld_block::{block_ranges, total_size, LdBlock};
use crate::sumstats::SummaryStatistics;

use indicatif::{ProgressBar, ProgressDrawTarget};
use log::info;
use matrix_util::dmatrix_chol::{add_diagonal, quad_form, BlockCholesky};
use matrix_util::traits::SampleOps;
use mcmc_util::{Gig, RunningMean, SampleSchedule};
use nalgebra::DVector;
use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma};
use rayon::prelude::*;
use std::ops::Range;

/// How the per-block and per-variant loops run within an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One generator, draws consumed in a fixed order. Reproducible
    /// bit for bit given a seed.
    #[default]
    Sequential,
    /// Blocks and variants on the rayon pool. Every iteration takes
    /// base seeds from the main generator and derives an independent
    /// stream per block and per variant, so results are reproducible
    /// given a seed and thread count independent, but they are a
    /// different chain from `Sequential`.
    Parallel,
}

#[derive(Debug, Clone)]
pub struct McmcConfig {
    /// shape of the local shrinkage prior
    pub a: f64,
    /// shape of the local shrinkage mixing prior
    pub b: f64,
    /// global shrinkage; `None` to estimate it
    pub phi: Option<f64>,
    /// GWAS sample size
    pub n_gwas: usize,
    pub schedule: SampleSchedule,
    /// report standardized effects instead of per-allele effects
    pub beta_std: bool,
    pub verbose: bool,
    pub show_progress: bool,
    /// `None` seeds from OS entropy
    pub seed: Option<u64>,
    pub mode: ExecutionMode,
}

impl Default for McmcConfig {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.5,
            phi: None,
            n_gwas: 0,
            schedule: SampleSchedule::default(),
            beta_std: false,
            verbose: false,
            show_progress: false,
            seed: None,
            mode: ExecutionMode::Sequential,
        }
    }
}

impl McmcConfig {
    pub fn validate(&self) -> Result<(), McmcError> {
        if !(self.a.is_finite() && self.a > 0.0) {
            return Err(McmcError::config(format!("a must be positive, got {}", self.a)));
        }
        if !(self.b.is_finite() && self.b > 0.0) {
            return Err(McmcError::config(format!("b must be positive, got {}", self.b)));
        }
        if let Some(phi) = self.phi {
            if !(phi.is_finite() && phi > 0.0) {
                return Err(McmcError::config(format!("phi must be positive, got {}", phi)));
            }
        }
        if self.n_gwas == 0 {
            return Err(McmcError::config("GWAS sample size must be positive"));
        }
        self.schedule.validate()?;
        Ok(())
    }

    pub fn estimates_phi(&self) -> bool {
        self.phi.is_none()
    }
}

/// Current values of the chain
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerState {
    pub beta: DVector<f64>,
    pub psi: DVector<f64>,
    pub sigma: f64,
    pub phi: f64,
}

impl SamplerState {
    /// `beta = 0`, `psi = 1`, `sigma = 1`, `phi` as given or 1
    pub fn init(p: usize, phi: Option<f64>) -> Self {
        Self {
            beta: DVector::zeros(p),
            psi: DVector::from_element(p, 1.0),
            sigma: 1.0,
            phi: phi.unwrap_or(1.0),
        }
    }
}

/// Posterior means over the kept iterations
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorEstimates {
    /// effect sizes, standardized or per-allele per `beta_std`
    pub beta_est: DVector<f64>,
    /// local shrinkage
    pub psi_est: DVector<f64>,
    /// residual variance
    pub sigma_est: f64,
    /// global shrinkage; the fixed value if it was not estimated
    pub phi_est: f64,
    pub n_samples: usize,
    pub phi_estimated: bool,
}

/// A validated PRS-CS problem
pub struct PrsCs<'a> {
    config: McmcConfig,
    sumstats: &'a SummaryStatistics,
    blocks: &'a [LdBlock],
    ranges: Vec<(usize, Range<usize>)>,
}

/// Per-block / per-variant stream seed for the parallel mode
fn stream_seed(base: u64, idx: usize) -> u64 {
    base ^ (idx as u64).wrapping_mul(2654435761)
}

fn gamma_dist(shape: f64, rate: f64, iteration: usize, what: &'static str) -> Result<Gamma<f64>, McmcError> {
    Gamma::new(shape, 1.0 / rate).map_err(|e| McmcError::Numerical {
        iteration,
        what,
        message: format!("Gamma(shape={}, rate={}): {}", shape, rate, e),
    })
}

impl<'a> PrsCs<'a> {
    pub fn new(
        config: McmcConfig,
        sumstats: &'a SummaryStatistics,
        blocks: &'a [LdBlock],
    ) -> Result<Self, McmcError> {
        config.validate()?;

        let p = sumstats.num_variants();
        if p == 0 {
            return Err(McmcError::config("no variants in summary statistics"));
        }
        let m = total_size(blocks);
        if m != p {
            return Err(McmcError::config(format!(
                "LD blocks cover {} variants but summary statistics have {}",
                m, p
            )));
        }

        Ok(Self {
            config,
            sumstats,
            blocks,
            ranges: block_ranges(blocks),
        })
    }

    pub fn num_variants(&self) -> usize {
        self.sumstats.num_variants()
    }

    pub fn run(&self) -> Result<PosteriorEstimates, McmcError> {
        self.run_with(|_, _| {})
    }

    /// Run the chain, calling `observer(itr, &state)` after every
    /// iteration (1-based). The observer cannot change the chain.
    pub fn run_with<F>(&self, mut observer: F) -> Result<PosteriorEstimates, McmcError>
    where
        F: FnMut(usize, &SamplerState),
    {
        let config = &self.config;
        let schedule = config.schedule;
        let p = self.num_variants();
        let n_retained = schedule.n_retained();

        if config.verbose {
            info!(
                "Running MCMC: {} variants, {} blocks, {} iterations ({} burn-in, thin {})",
                p,
                self.ranges.len(),
                schedule.n_iter,
                schedule.n_burnin,
                schedule.thin
            );
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut state = SamplerState::init(p, config.phi);

        let mut beta_acc = RunningMean::new(&state.beta, n_retained);
        let mut psi_acc = RunningMean::new(&state.psi, n_retained);
        let mut sigma_acc = RunningMean::new(&state.sigma, n_retained);
        let mut phi_acc = RunningMean::new(&state.phi, n_retained);

        let pb = ProgressBar::new(schedule.n_iter as u64);
        if !config.show_progress || config.verbose {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        for itr in schedule.iterations() {
            if config.verbose && itr.is_multiple_of(100) {
                info!("Iteration {:>4} of {}", itr, schedule.n_iter);
            }

            let quad = match config.mode {
                ExecutionMode::Sequential => self.update_beta(&mut state, &mut rng, itr)?,
                ExecutionMode::Parallel => {
                    self.update_beta_parallel(&mut state, rng.random(), itr)?
                }
            };

            self.update_sigma(&mut state, quad, &mut rng, itr)?;

            let delta = match config.mode {
                ExecutionMode::Sequential => self.update_psi(&mut state, &mut rng, itr)?,
                ExecutionMode::Parallel => {
                    self.update_psi_parallel(&mut state, (rng.random(), rng.random()), itr)?
                }
            };

            if config.estimates_phi() {
                self.update_phi(&mut state, &delta, &mut rng, itr)?;
            }

            observer(itr, &state);

            if schedule.is_retained(itr) {
                beta_acc.add(&state.beta);
                psi_acc.add(&state.psi);
                sigma_acc.add(&state.sigma);
                phi_acc.add(&state.phi);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        debug_assert!(beta_acc.is_complete());

        let mut beta_est = beta_acc.into_mean();
        if !config.beta_std {
            beta_est.component_mul_assign(&self.sumstats.per_allele_scale());
        }

        let est = PosteriorEstimates {
            beta_est,
            psi_est: psi_acc.into_mean(),
            sigma_est: sigma_acc.into_mean(),
            phi_est: config.phi.unwrap_or_else(|| phi_acc.into_mean()),
            n_samples: n_retained,
            phi_estimated: config.estimates_phi(),
        };

        if config.verbose {
            if est.phi_estimated {
                info!("Estimated global shrinkage parameter: {:.6e}", est.phi_est);
            }
            info!("MCMC sampling completed ({} samples kept)", est.n_samples);
        }

        Ok(est)
    }

    /// New `beta` for one block and its contribution `beta' D beta` to
    /// the quadratic form, where `D = R + diag(1/psi)`.
    fn draw_block(
        &self,
        block_idx: usize,
        range: &Range<usize>,
        state: &SamplerState,
        noise: &DVector<f64>,
        itr: usize,
    ) -> Result<(DVector<f64>, f64), McmcError> {
        let m = range.len();
        let rr = self.blocks[block_idx].matrix();
        let psi_inv = state.psi.rows(range.start, m).map(|x| 1.0 / x);
        let dd = add_diagonal(rr, &psi_inv);

        let chol = BlockCholesky::factorize(&dd).ok_or(McmcError::Cholesky {
            iteration: itr,
            block: block_idx,
        })?;

        let solve_err = McmcError::TriangularSolve {
            iteration: itr,
            block: block_idx,
        };

        let mut beta_blk = self.sumstats.beta_mrg().rows(range.start, m).clone_owned();
        if !chol.solve_lower_mut(&mut beta_blk) {
            return Err(solve_err);
        }
        beta_blk.axpy((state.sigma / self.config.n_gwas as f64).sqrt(), noise, 1.0);
        if !chol.solve_upper_mut(&mut beta_blk) {
            return Err(solve_err);
        }

        let quad = quad_form(&dd, &beta_blk);
        Ok((beta_blk, quad))
    }

    fn update_beta<R: Rng + ?Sized>(
        &self,
        state: &mut SamplerState,
        rng: &mut R,
        itr: usize,
    ) -> Result<f64, McmcError> {
        let mut quad = 0.0;
        for (block_idx, range) in &self.ranges {
            let noise = DVector::<f64>::rnorm_with(range.len(), 1, rng);
            let (beta_blk, q) = self.draw_block(*block_idx, range, state, &noise, itr)?;
            state.beta.rows_mut(range.start, range.len()).copy_from(&beta_blk);
            quad += q;
        }
        Ok(quad)
    }

    fn update_beta_parallel(
        &self,
        state: &mut SamplerState,
        base_seed: u64,
        itr: usize,
    ) -> Result<f64, McmcError> {
        let frozen: &SamplerState = state;
        let draws = self
            .ranges
            .par_iter()
            .map(|(block_idx, range)| {
                let mut rng = SmallRng::seed_from_u64(stream_seed(base_seed, *block_idx));
                let noise = DVector::<f64>::rnorm_with(range.len(), 1, &mut rng);
                self.draw_block(*block_idx, range, frozen, &noise, itr)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut quad = 0.0;
        for ((_, range), (beta_blk, q)) in self.ranges.iter().zip(draws) {
            state.beta.rows_mut(range.start, range.len()).copy_from(&beta_blk);
            quad += q;
        }
        Ok(quad)
    }

    /// `sigma ~ 1 / Gamma((n + p) / 2, err)`
    fn update_sigma<R: Rng + ?Sized>(
        &self,
        state: &mut SamplerState,
        quad: f64,
        rng: &mut R,
        itr: usize,
    ) -> Result<(), McmcError> {
        let n = self.config.n_gwas as f64;
        let p = self.num_variants() as f64;

        let fit = 1.0 - 2.0 * state.beta.dot(self.sumstats.beta_mrg()) + quad;
        let prior = state.beta.zip_fold(&state.psi, 0.0, |acc, b, s| acc + b * b / s);
        // the prior term keeps the rate positive under cancellation
        let err = (n / 2.0 * fit).max(n / 2.0 * prior);

        let gamma = gamma_dist((n + p) / 2.0, err, itr, "residual variance")?;
        let sigma = 1.0 / gamma.sample(rng);
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(McmcError::Numerical {
                iteration: itr,
                what: "residual variance",
                message: format!("sigma = {} (rate {})", sigma, err),
            });
        }
        state.sigma = sigma;
        Ok(())
    }

    fn local_gig(&self, state: &SamplerState, j: usize, delta_j: f64) -> Result<Gig, mcmc_util::GigError> {
        let n = self.config.n_gwas as f64;
        let beta_j = state.beta[j];
        Gig::new(
            self.config.a - 0.5,
            2.0 * delta_j,
            n * beta_j * beta_j / state.sigma,
        )
    }

    /// `delta_j ~ Gamma(a + b, psi_j + phi)`, then
    /// `psi_j ~ GIG(a - 1/2, 2 delta_j, n beta_j^2 / sigma)` capped at 1.
    /// Returns `delta`.
    fn update_psi<R: Rng + ?Sized>(
        &self,
        state: &mut SamplerState,
        rng: &mut R,
        itr: usize,
    ) -> Result<DVector<f64>, McmcError> {
        let unit = gamma_dist(self.config.a + self.config.b, 1.0, itr, "delta")?;
        let phi = state.phi;
        let delta = state.psi.map(|psi_j| unit.sample(rng) / (psi_j + phi));

        for j in 0..self.num_variants() {
            let psi_j = self
                .local_gig(state, j, delta[j])
                .and_then(|gig| gig.try_sample(rng))
                .map_err(|source| McmcError::Gig {
                    iteration: itr,
                    variant: j,
                    source,
                })?;
            state.psi[j] = psi_j.min(1.0);
        }
        Ok(delta)
    }

    fn update_psi_parallel(
        &self,
        state: &mut SamplerState,
        (delta_seed, psi_seed): (u64, u64),
        itr: usize,
    ) -> Result<DVector<f64>, McmcError> {
        let unit = gamma_dist(self.config.a + self.config.b, 1.0, itr, "delta")?;
        let phi = state.phi;

        let delta_vec: Vec<f64> = state
            .psi
            .as_slice()
            .par_iter()
            .enumerate()
            .map(|(j, psi_j)| {
                let mut rng = SmallRng::seed_from_u64(stream_seed(delta_seed, j));
                unit.sample(&mut rng) / (psi_j + phi)
            })
            .collect();

        let frozen: &SamplerState = state;
        let psi_vec = delta_vec
            .par_iter()
            .enumerate()
            .map(|(j, &delta_j)| {
                let mut rng = SmallRng::seed_from_u64(stream_seed(psi_seed, j));
                self.local_gig(frozen, j, delta_j)
                    .and_then(|gig| gig.try_sample(&mut rng))
                    .map(|x| x.min(1.0))
                    .map_err(|source| McmcError::Gig {
                        iteration: itr,
                        variant: j,
                        source,
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        state.psi = DVector::from_vec(psi_vec);
        Ok(DVector::from_vec(delta_vec))
    }

    /// `w ~ Gamma(1, phi + 1)`, `phi ~ Gamma(p b + 1/2, sum(delta) + w)`
    fn update_phi<R: Rng + ?Sized>(
        &self,
        state: &mut SamplerState,
        delta: &DVector<f64>,
        rng: &mut R,
        itr: usize,
    ) -> Result<(), McmcError> {
        let p = self.num_variants() as f64;
        let w = gamma_dist(1.0, state.phi + 1.0, itr, "phi auxiliary")?.sample(rng);
        let phi = gamma_dist(p * self.config.b + 0.5, delta.sum() + w, itr, "phi")?.sample(rng);
        if !(phi.is_finite() && phi > 0.0) {
            return Err(McmcError::Numerical {
                iteration: itr,
                what: "phi",
                message: format!("phi = {}", phi),
            });
        }
        state.phi = phi;
        Ok(())
    }
}

/// Validate the inputs and run one chain
pub fn prs_cs_mcmc(
    config: McmcConfig,
    sumstats: &SummaryStatistics,
    blocks: &[LdBlock],
) -> Result<PosteriorEstimates, McmcError> {
    PrsCs::new(config, sumstats, blocks)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn single_variant() -> (SummaryStatistics, Vec<LdBlock>) {
        let ss = SummaryStatistics::unnamed(vec![0.1], vec![0.3]).unwrap();
        let blocks = vec![LdBlock::new(DMatrix::from_element(1, 1, 1.0)).unwrap()];
        (ss, blocks)
    }

    fn small_config() -> McmcConfig {
        McmcConfig {
            a: 1.0,
            b: 0.5,
            phi: Some(1.0),
            n_gwas: 1000,
            schedule: SampleSchedule::new(20, 10, 1),
            beta_std: true,
            seed: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_init_state() {
        let s = SamplerState::init(3, None);
        assert_eq!(s.beta, DVector::zeros(3));
        assert_eq!(s.psi, DVector::from_element(3, 1.0));
        assert_eq!(s.sigma, 1.0);
        assert_eq!(s.phi, 1.0);
        assert_eq!(SamplerState::init(1, Some(1e-4)).phi, 1e-4);
    }

    #[test]
    fn test_config_validation() {
        assert!(small_config().validate().is_ok());
        for bad in [
            McmcConfig { a: 0.0, ..small_config() },
            McmcConfig { b: -1.0, ..small_config() },
            McmcConfig { phi: Some(0.0), ..small_config() },
            McmcConfig { n_gwas: 0, ..small_config() },
            McmcConfig { schedule: SampleSchedule::new(10, 10, 1), ..small_config() },
            McmcConfig { schedule: SampleSchedule::new(20, 10, 0), ..small_config() },
        ] {
            let err = bad.validate().unwrap_err();
            assert!(err.is_config(), "{}", err);
        }
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let (ss, _) = single_variant();
        let blocks = vec![LdBlock::new(DMatrix::identity(2, 2)).unwrap()];
        let err = PrsCs::new(small_config(), &ss, &blocks).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_fixed_phi_is_kept() {
        let (ss, blocks) = single_variant();
        let config = McmcConfig { phi: Some(0.01), ..small_config() };
        let est = prs_cs_mcmc(config, &ss, &blocks).unwrap();
        assert!(!est.phi_estimated);
        assert_eq!(est.phi_est, 0.01);
    }

    #[test]
    fn test_fixed_phi_exact_over_many_samples() {
        let (ss, blocks) = single_variant();
        let config = McmcConfig {
            phi: Some(1e-4),
            schedule: SampleSchedule::new(1000, 500, 1),
            ..small_config()
        };
        let est = prs_cs_mcmc(config, &ss, &blocks).unwrap();
        assert_eq!(est.n_samples, 500);
        assert_eq!(est.phi_est.to_bits(), 1e-4f64.to_bits());
    }

    #[test]
    fn test_estimated_phi_positive() {
        let (ss, blocks) = single_variant();
        let config = McmcConfig { phi: None, ..small_config() };
        let est = prs_cs_mcmc(config, &ss, &blocks).unwrap();
        assert!(est.phi_estimated);
        assert!(est.phi_est > 0.0 && est.phi_est.is_finite());
    }

    #[test]
    fn test_stream_seed_distinct() {
        let s: Vec<u64> = (0..100).map(|j| stream_seed(12345, j)).collect();
        let mut dedup = s.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), s.len());
    }
}

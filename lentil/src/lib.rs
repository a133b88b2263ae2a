//! Polygenic prediction with continuous shrinkage priors (PRS-CS).
//!
//! Given standardized marginal effects from a GWAS and LD matrices of a
//! reference panel, split into independent blocks, a Gibbs sampler
//! estimates the joint effect sizes of all variants.

/// Failure taxonomy of a run
pub mod error;

/// LD matrices over contiguous variant blocks
pub mod ld_block;

/// The Gibbs sampler
pub mod mcmc;

/// GWAS summary statistics
pub mod sumstats;

/// Posterior estimates to text files
pub mod writer;

pub use error::McmcError;
pub use ld_block::LdBlock;
pub use mcmc::{prs_cs_mcmc, ExecutionMode, McmcConfig, PosteriorEstimates, PrsCs, SamplerState};
pub use sumstats::SummaryStatistics;

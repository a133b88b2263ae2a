use anyhow::Result;
use clap::Args;
use log::info;
use rayon::ThreadPoolBuilder;

use lentil::ld_block::read_ld_manifest;
use lentil::writer::{posterior_effect_file, write_global_estimates, write_posterior_effects};
use lentil::{ExecutionMode, McmcConfig, PrsCs, SummaryStatistics};
use mcmc_util::SampleSchedule;

#[derive(Args, Debug, Clone)]
pub struct FitArgs {
    // ── Input ────────────────────────────────────────────────────────────
    #[arg(
        long,
        help = "Summary statistics (SNP, BETA, MAF columns)",
        long_help = "Summary statistics with a header naming SNP, BETA and MAF columns.\n\
            BETA is the standardized marginal effect. Variants must be in the\n\
            same order as the rows of the concatenated LD blocks.\n\
            Gzipped files (.gz) are supported."
    )]
    pub sumstats: String,

    #[arg(
        long,
        help = "LD manifest: one LD matrix file per line",
        long_help = "LD manifest listing one tab-separated LD matrix file per line,\n\
            in variant order. Relative paths are resolved against the manifest's\n\
            directory. An empty matrix file stands for an empty block."
    )]
    pub ld_manifest: String,

    #[arg(long, help = "GWAS sample size")]
    pub n_gwas: usize,

    // ── Prior ────────────────────────────────────────────────────────────
    #[arg(long, default_value = "1.0", help = "Local shrinkage shape a")]
    pub a: f64,

    #[arg(long, default_value = "0.5", help = "Local shrinkage mixing shape b")]
    pub b: f64,

    #[arg(
        long,
        help = "Global shrinkage phi; estimated from the data if omitted"
    )]
    pub phi: Option<f64>,

    // ── MCMC ─────────────────────────────────────────────────────────────
    #[arg(long, default_value = "1000", help = "Total MCMC iterations")]
    pub n_iter: usize,

    #[arg(long, default_value = "500", help = "Burn-in iterations")]
    pub n_burnin: usize,

    #[arg(long, default_value = "5", help = "Thinning interval")]
    pub thin: usize,

    #[arg(long, help = "Random seed; OS entropy if omitted")]
    pub seed: Option<u64>,

    #[arg(
        long,
        default_value_t = false,
        help = "Parallel block and variant updates",
        long_help = "Run the per-block and per-variant updates on a thread pool.\n\
            Each block and variant gets its own random stream, so the chain\n\
            differs from the sequential one even with the same seed."
    )]
    pub parallel: bool,

    #[arg(long, default_value = "16", help = "Maximum number of threads")]
    pub max_threads: usize,

    // ── Output ───────────────────────────────────────────────────────────
    #[arg(long, short, help = "Output file prefix")]
    pub out: String,

    #[arg(long, default_value_t = false, help = "Report standardized effect sizes")]
    pub beta_std: bool,

    #[arg(long, default_value_t = false, help = "Also write posterior local shrinkage")]
    pub write_psi: bool,

    #[arg(long, default_value_t = false, help = "Show a progress bar")]
    pub progress: bool,
}

pub fn fit(args: &FitArgs, verbose: bool) -> Result<()> {
    let max_threads = num_cpus::get().min(args.max_threads).max(1);
    ThreadPoolBuilder::new()
        .num_threads(max_threads)
        .build_global()?;

    info!("will use {} threads", rayon::current_num_threads());

    let sumstats = SummaryStatistics::read_tsv(&args.sumstats)?;
    let blocks = read_ld_manifest(&args.ld_manifest)?;

    let config = McmcConfig {
        a: args.a,
        b: args.b,
        phi: args.phi,
        n_gwas: args.n_gwas,
        schedule: SampleSchedule::new(args.n_iter, args.n_burnin, args.thin),
        beta_std: args.beta_std,
        verbose,
        show_progress: args.progress,
        seed: args.seed,
        mode: if args.parallel {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        },
    };

    let prs_cs = PrsCs::new(config, &sumstats, &blocks)?;
    let est = prs_cs.run()?;

    let effect_file = posterior_effect_file(&args.out, args.a, args.b, args.phi);
    write_posterior_effects(&effect_file, &sumstats, &est, args.write_psi)?;

    let global_file = format!("{}.global.txt", effect_file.trim_end_matches(".txt"));
    write_global_estimates(&global_file, &est)?;

    info!("Done");
    Ok(())
}

mod fit_cmd;
mod gig_cmd;

use fit_cmd::*;
use gig_cmd::*;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lentil")]
#[command(about = "Polygenic risk scores with continuous shrinkage priors on blockwise LD")]
struct Cli {
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate posterior effect sizes from GWAS summary statistics and LD blocks
    Fit(FitArgs),
    /// Draw variates from a generalized inverse Gaussian distribution
    SampleGig(SampleGigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match &cli.commands {
        Commands::Fit(args) => {
            fit(args, cli.verbose)?;
        }
        Commands::SampleGig(args) => {
            sample_gig_cmd(args)?;
        }
    }

    Ok(())
}

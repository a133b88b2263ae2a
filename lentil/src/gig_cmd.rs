use anyhow::Result;
use clap::Args;
use matrix_util::common_io::open_buf_writer;
use mcmc_util::Gig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

#[derive(Args, Debug, Clone)]
pub struct SampleGigArgs {
    #[arg(long, allow_hyphen_values = true, help = "Shape p")]
    pub p: f64,

    #[arg(long, help = "Scale a > 0 (coefficient of x)")]
    pub a: f64,

    #[arg(long, help = "Scale b > 0 (coefficient of 1/x)")]
    pub b: f64,

    #[arg(long, short = 'n', default_value = "1000", help = "Number of draws")]
    pub num_draws: usize,

    #[arg(long, help = "Random seed; OS entropy if omitted")]
    pub seed: Option<u64>,

    #[arg(long, short, default_value = "stdout", help = "Output file")]
    pub out: String,
}

pub fn sample_gig_cmd(args: &SampleGigArgs) -> Result<()> {
    let gig = Gig::new(args.p, args.a, args.b)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut writer = open_buf_writer(&args.out)?;
    for _ in 0..args.num_draws {
        writeln!(writer, "{:.8e}", gig.try_sample(&mut rng)?)?;
    }
    writer.flush()?;
    Ok(())
}

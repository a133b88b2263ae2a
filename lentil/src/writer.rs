use crate::mcmc::PosteriorEstimates;
use crate::sumstats::SummaryStatistics;
use log::info;
use matrix_util::common_io::{mkdir, open_buf_writer};
use std::io::Write;

/// `{prefix}_pst_eff_a{a}_b{b}_phi{phi|auto}.txt`
pub fn posterior_effect_file(prefix: &str, a: f64, b: f64, phi: Option<f64>) -> String {
    let phi_str = match phi {
        Some(phi) => format!("{:e}", phi),
        None => "auto".to_string(),
    };
    format!("{}_pst_eff_a{}_b{}_phi{}.txt", prefix, a, b, phi_str)
}

/// Write `SNP`, `BETA` (and `PSI` if requested) per variant
pub fn write_posterior_effects(
    path: &str,
    sumstats: &SummaryStatistics,
    est: &PosteriorEstimates,
    write_psi: bool,
) -> anyhow::Result<()> {
    if est.beta_est.len() != sumstats.num_variants() {
        anyhow::bail!(
            "{} estimates for {} variants",
            est.beta_est.len(),
            sumstats.num_variants()
        );
    }

    mkdir(path)?;
    let mut writer = open_buf_writer(path)?;

    if write_psi {
        writeln!(writer, "SNP\tBETA\tPSI")?;
    } else {
        writeln!(writer, "SNP\tBETA")?;
    }

    for (j, snp) in sumstats.snp_ids().iter().enumerate() {
        if write_psi {
            writeln!(
                writer,
                "{}\t{:.6e}\t{:.6e}",
                snp, est.beta_est[j], est.psi_est[j]
            )?;
        } else {
            writeln!(writer, "{}\t{:.6e}", snp, est.beta_est[j])?;
        }
    }

    writer.flush()?;
    info!("Wrote posterior effects of {} variants to {}", sumstats.num_variants(), path);
    Ok(())
}

/// Write the scalar posterior means
pub fn write_global_estimates(path: &str, est: &PosteriorEstimates) -> anyhow::Result<()> {
    mkdir(path)?;
    let mut writer = open_buf_writer(path)?;
    writeln!(writer, "parameter\testimate")?;
    writeln!(writer, "sigma\t{:.6e}", est.sigma_est)?;
    writeln!(
        writer,
        "phi{}\t{:.6e}",
        if est.phi_estimated { "" } else { "_fixed" },
        est.phi_est
    )?;
    writeln!(writer, "n_samples\t{}", est.n_samples)?;
    writer.flush()?;
    Ok(())
}

use crate::error::McmcError;
use log::info;
use matrix_util::common_io::read_lines_of_words;
use nalgebra::DVector;

/// Per-variant marginal effects and minor allele frequencies, in the
/// same order as the concatenated LD blocks.
#[derive(Debug, Clone)]
pub struct SummaryStatistics {
    snp_ids: Vec<Box<str>>,
    beta_mrg: DVector<f64>,
    maf: DVector<f64>,
}

impl SummaryStatistics {
    pub fn new(
        snp_ids: Vec<Box<str>>,
        beta_mrg: Vec<f64>,
        maf: Vec<f64>,
    ) -> Result<Self, McmcError> {
        let p = beta_mrg.len();
        if snp_ids.len() != p || maf.len() != p {
            return Err(McmcError::config(format!(
                "summary statistics disagree in length: {} SNP ids, {} effects, {} allele frequencies",
                snp_ids.len(),
                p,
                maf.len()
            )));
        }
        if let Some(j) = beta_mrg.iter().position(|b| !b.is_finite()) {
            return Err(McmcError::config(format!(
                "marginal effect of variant {} ({}) is not finite",
                j, snp_ids[j]
            )));
        }
        if let Some(j) = maf.iter().position(|f| !(*f > 0.0 && *f < 1.0)) {
            return Err(McmcError::config(format!(
                "allele frequency of variant {} ({}) is {}, outside (0, 1)",
                j, snp_ids[j], maf[j]
            )));
        }
        Ok(Self {
            snp_ids,
            beta_mrg: DVector::from_vec(beta_mrg),
            maf: DVector::from_vec(maf),
        })
    }

    /// Variants named `rs0`, `rs1`, ...
    pub fn unnamed(beta_mrg: Vec<f64>, maf: Vec<f64>) -> Result<Self, McmcError> {
        let snp_ids = (0..beta_mrg.len())
            .map(|j| format!("rs{}", j).into_boxed_str())
            .collect();
        Self::new(snp_ids, beta_mrg, maf)
    }

    /// Read a whitespace-delimited table with a header naming `SNP`,
    /// `BETA` and `MAF` columns (any order, case-insensitive). `BETA`
    /// is the standardized marginal effect.
    pub fn read_tsv(path: &str) -> anyhow::Result<Self> {
        let data = read_lines_of_words(path, true)?;

        let column = |name: &str| -> anyhow::Result<usize> {
            data.header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow::anyhow!("{}: no {} column in header", path, name))
        };
        let (snp_col, beta_col, maf_col) = (column("SNP")?, column("BETA")?, column("MAF")?);
        let min_fields = snp_col.max(beta_col).max(maf_col) + 1;

        let mut snp_ids = Vec::with_capacity(data.lines.len());
        let mut beta_mrg = Vec::with_capacity(data.lines.len());
        let mut maf = Vec::with_capacity(data.lines.len());

        for (i, words) in data.lines.iter().enumerate() {
            if words.len() < min_fields {
                anyhow::bail!(
                    "{}: record {} has {} fields, expected at least {}",
                    path,
                    i + 1,
                    words.len(),
                    min_fields
                );
            }
            snp_ids.push(words[snp_col].clone());
            beta_mrg.push(words[beta_col].parse::<f64>().map_err(|e| {
                anyhow::anyhow!("{}: record {}: BETA '{}': {}", path, i + 1, words[beta_col], e)
            })?);
            maf.push(words[maf_col].parse::<f64>().map_err(|e| {
                anyhow::anyhow!("{}: record {}: MAF '{}': {}", path, i + 1, words[maf_col], e)
            })?);
        }

        info!("Read {} variants from {}", snp_ids.len(), path);
        Ok(Self::new(snp_ids, beta_mrg, maf)?)
    }

    pub fn num_variants(&self) -> usize {
        self.beta_mrg.len()
    }

    pub fn snp_ids(&self) -> &[Box<str>] {
        &self.snp_ids
    }

    pub fn beta_mrg(&self) -> &DVector<f64> {
        &self.beta_mrg
    }

    pub fn maf(&self) -> &DVector<f64> {
        &self.maf
    }

    /// `1 / sqrt(2 f (1 - f))`, converting standardized effects to
    /// per-allele effects
    pub fn per_allele_scale(&self) -> DVector<f64> {
        self.maf.map(|f| 1.0 / (2.0 * f * (1.0 - f)).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_util::common_io::{create_temp_dir_file, open_buf_writer};
    use std::io::Write;

    #[test]
    fn test_length_mismatch_is_config_error() {
        let err = SummaryStatistics::unnamed(vec![0.1, 0.2], vec![0.3]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_maf_out_of_range() {
        assert!(SummaryStatistics::unnamed(vec![0.1], vec![0.0]).is_err());
        assert!(SummaryStatistics::unnamed(vec![0.1], vec![1.0]).is_err());
        assert!(SummaryStatistics::unnamed(vec![f64::NAN], vec![0.2]).is_err());
    }

    #[test]
    fn test_read_tsv_any_column_order() -> anyhow::Result<()> {
        let path = create_temp_dir_file(".txt.gz")?;
        let path = path.to_str().unwrap();
        {
            let mut w = open_buf_writer(path)?;
            writeln!(w, "MAF\tSNP\tA1\tbeta")?;
            writeln!(w, "0.3\trs10\tA\t0.01")?;
            writeln!(w, "# skipped")?;
            writeln!(w, "0.5\trs11\tG\t-0.02")?;
            w.flush()?;
        }
        let ss = SummaryStatistics::read_tsv(path)?;
        assert_eq!(ss.num_variants(), 2);
        assert_eq!(ss.snp_ids()[1].as_ref(), "rs11");
        assert_eq!(ss.beta_mrg()[1], -0.02);
        assert_eq!(ss.maf()[0], 0.3);
        assert!((ss.per_allele_scale()[1] - 2f64.sqrt()).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_read_tsv_missing_column() -> anyhow::Result<()> {
        let path = create_temp_dir_file(".txt")?;
        std::fs::write(&path, "SNP\tBETA\nrs1\t0.1\n")?;
        let err = SummaryStatistics::read_tsv(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("MAF"));
        Ok(())
    }
}

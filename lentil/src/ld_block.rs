use crate::error::McmcError;
use log::info;
use matrix_util::common_io::read_lines;
use matrix_util::traits::IoOps;
use nalgebra::DMatrix;
use std::ops::Range;
use std::path::Path;

/// Relative tolerance for the symmetry check on LD matrices
const SYMMETRY_TOL: f64 = 1e-8;

/// LD (correlation) matrix over one contiguous run of variants. A
/// block may be empty; it then covers no variants.
#[derive(Debug, Clone)]
pub struct LdBlock {
    matrix: DMatrix<f64>,
}

impl LdBlock {
    pub fn new(matrix: DMatrix<f64>) -> Result<Self, McmcError> {
        if !matrix.is_square() {
            return Err(McmcError::config(format!(
                "LD matrix must be square, got {} x {}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        if matrix.iter().any(|x| !x.is_finite()) {
            return Err(McmcError::config("LD matrix has non-finite entries"));
        }
        let m = matrix.nrows();
        for i in 0..m {
            for j in (i + 1)..m {
                let (x, y) = (matrix[(i, j)], matrix[(j, i)]);
                if (x - y).abs() > SYMMETRY_TOL * x.abs().max(y.abs()).max(1.0) {
                    return Err(McmcError::config(format!(
                        "LD matrix is not symmetric at ({}, {}): {} vs {}",
                        i, j, x, y
                    )));
                }
            }
        }
        Ok(Self { matrix })
    }

    pub fn empty() -> Self {
        Self {
            matrix: DMatrix::zeros(0, 0),
        }
    }

    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

/// Total number of variants covered by `blocks`
pub fn total_size(blocks: &[LdBlock]) -> usize {
    blocks.iter().map(LdBlock::size).sum()
}

/// Global variant range of each non-empty block, paired with the
/// block's position in `blocks`. Empty blocks are skipped and do not
/// move the running offset, so the ranges tile `0..total_size`.
pub fn block_ranges(blocks: &[LdBlock]) -> Vec<(usize, Range<usize>)> {
    let mut offset = 0;
    let mut ret = Vec::with_capacity(blocks.len());
    for (k, blk) in blocks.iter().enumerate() {
        if blk.is_empty() {
            continue;
        }
        ret.push((k, offset..(offset + blk.size())));
        offset += blk.size();
    }
    ret
}

/// Load LD blocks listed in a manifest, one matrix file per line (TSV,
/// gzipped or not). Relative paths are taken from the manifest's
/// directory. An empty matrix file gives an empty block.
pub fn read_ld_manifest(manifest: &str) -> anyhow::Result<Vec<LdBlock>> {
    let base_dir = Path::new(manifest).parent().unwrap_or(Path::new(""));

    let mut blocks = vec![];
    for line in read_lines(manifest)? {
        let entry = Path::new(line.trim());
        let file = if entry.is_absolute() {
            entry.to_path_buf()
        } else {
            base_dir.join(entry)
        };
        let file = file
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("invalid LD file path: {}", line))?;

        let matrix = DMatrix::<f64>::read_tsv(file)?;
        let blk = LdBlock::new(matrix).map_err(|e| anyhow::anyhow!("{}: {}", file, e))?;
        blocks.push(blk);
    }

    info!(
        "Loaded {} LD blocks ({} non-empty) covering {} variants from {}",
        blocks.len(),
        blocks.iter().filter(|b| !b.is_empty()).count(),
        total_size(&blocks),
        manifest
    );
    Ok(blocks)
}

use crate::common_io::{open_buf_writer, read_lines_of_types, Delimiter};
use crate::traits::IoOps;
use nalgebra::DMatrix;
use std::io::Write;

impl IoOps for DMatrix<f64> {
    type Mat = Self;

    fn read_file_delim(file_path: &str, delim: impl Into<Delimiter>) -> anyhow::Result<Self::Mat> {
        let data = read_lines_of_types::<f64>(file_path, delim, false)?.lines;

        if data.is_empty() {
            return Ok(DMatrix::<f64>::zeros(0, 0));
        }

        let ncols = data[0].len();
        let nrows = data.len();

        if let Some((i, row)) = data.iter().enumerate().find(|(_, x)| x.len() != ncols) {
            return Err(anyhow::anyhow!(
                "{}: row {} has {} columns, expected {}",
                file_path,
                i + 1,
                row.len(),
                ncols
            ));
        }

        Ok(DMatrix::<f64>::from_row_iterator(
            nrows,
            ncols,
            data.into_iter().flatten(),
        ))
    }

    fn write_file_delim(&self, file_path: &str, delim: &str) -> anyhow::Result<()> {
        let mut buf = open_buf_writer(file_path)?;
        for row in self.row_iter() {
            let line = row
                .iter()
                .map(|x| format!("{}", x))
                .collect::<Vec<_>>()
                .join(delim);
            writeln!(buf, "{}", line)?;
        }
        buf.flush()?;
        Ok(())
    }
}

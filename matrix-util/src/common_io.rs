use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::tempdir;

/// Field separator for delimited text files
pub enum Delimiter {
    Whitespace,
    Str(String),
    Chars(Vec<char>),
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Delimiter::Str(s.to_string())
    }
}

impl From<Vec<char>> for Delimiter {
    fn from(chars: Vec<char>) -> Self {
        Delimiter::Chars(chars)
    }
}

impl<const N: usize> From<&[char; N]> for Delimiter {
    fn from(chars: &[char; N]) -> Self {
        Delimiter::Chars(chars.to_vec())
    }
}

impl Delimiter {
    fn split<'a>(&'a self, line: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self {
            Delimiter::Whitespace => Box::new(line.split_whitespace()),
            Delimiter::Str(s) => Box::new(line.split(s.as_str())),
            Delimiter::Chars(chars) => Box::new(line.split(chars.as_slice())),
        }
    }
}

#[derive(Debug)]
pub struct ReadLinesOut<T: Send> {
    pub lines: Vec<Vec<T>>,
    pub header: Vec<Box<str>>,
}

fn is_data_line(line: &str) -> bool {
    !(line.trim().is_empty() || line.starts_with('#') || line.starts_with('%'))
}

///
/// Read every non-comment line of the input file into memory
///
/// * `input_file` - file name--either gzipped or not
///
pub fn read_lines(input_file: &str) -> anyhow::Result<Vec<Box<str>>> {
    let buf = open_buf_reader(input_file)?;
    let mut lines = vec![];
    for x in buf.lines() {
        let x = x?;
        if is_data_line(&x) {
            lines.push(x.into_boxed_str());
        }
    }
    Ok(lines)
}

///
/// Read lines and parse each field. Parsing failures are reported
/// with the offending line number instead of aborting.
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - field separator
/// * `has_header` - whether the first data line is a header
/// * `parse_fn` - parse a single field
///
pub fn read_lines_of_fields<T, F>(
    input_file: &str,
    delim: impl Into<Delimiter>,
    has_header: bool,
    parse_fn: F,
) -> anyhow::Result<ReadLinesOut<T>>
where
    T: Send,
    F: Fn(&str) -> anyhow::Result<T> + Sync,
{
    let delim = delim.into();
    let lines_raw = read_lines(input_file)?;

    let (header, body) = match (has_header, lines_raw.split_first()) {
        (true, Some((hdr, rest))) => (
            delim
                .split(hdr)
                .map(|x| x.trim().to_owned().into_boxed_str())
                .collect::<Vec<_>>(),
            rest,
        ),
        (true, None) => {
            return Err(anyhow::anyhow!("no header line in {}", input_file));
        }
        (false, _) => (vec![], lines_raw.as_slice()),
    };

    let lines = body
        .par_iter()
        .enumerate()
        .map(|(i, line)| {
            delim
                .split(line)
                .map(|w| parse_fn(w.trim()))
                .collect::<anyhow::Result<Vec<T>>>()
                .map_err(|e| anyhow::anyhow!("{}: line {}: {}", input_file, i + 1, e))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(ReadLinesOut { lines, header })
}

///
/// Read lines of numbers (or anything `FromStr`)
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - field separator
/// * `has_header` - whether the first data line is a header
///
pub fn read_lines_of_types<T>(
    input_file: &str,
    delim: impl Into<Delimiter>,
    has_header: bool,
) -> anyhow::Result<ReadLinesOut<T>>
where
    T: Send + std::str::FromStr,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    read_lines_of_fields(input_file, delim, has_header, |w| {
        w.parse::<T>()
            .map_err(|e| anyhow::anyhow!("cannot parse '{}': {}", w, e))
    })
}

///
/// Read whitespace-separated words
///
/// * `input_file` - file name--either gzipped or not
/// * `has_header` - whether the first data line is a header
///
pub fn read_lines_of_words(
    input_file: &str,
    has_header: bool,
) -> anyhow::Result<ReadLinesOut<Box<str>>> {
    read_lines_of_fields(input_file, Delimiter::Whitespace, has_header, |w| {
        Ok(w.to_owned().into_boxed_str())
    })
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;
    match Path::new(input_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not, or `stdout`
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    let file = File::create(output_file)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {}", output_file, e))?;
    match Path::new(output_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

///
/// Create the parent directory of a file if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    match Path::new(file).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

///
/// Create a temporary directory and suggest a file name
/// * `suffix` - suffix of the file name
///
pub fn create_temp_dir_file(suffix: &str) -> anyhow::Result<std::path::PathBuf> {
    let temp_dir = tempdir()?.path().to_path_buf();
    std::fs::create_dir_all(&temp_dir)?;
    let temp_file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile_in(temp_dir)?
        .path()
        .to_owned();
    Ok(temp_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_lines_skips_comments() -> anyhow::Result<()> {
        let path = create_temp_dir_file(".txt")?;
        let path = path.to_str().unwrap();
        {
            let mut w = open_buf_writer(path)?;
            writeln!(w, "# comment")?;
            writeln!(w, "a b")?;
            writeln!(w)?;
            writeln!(w, "c d")?;
            w.flush()?;
        }
        let lines = read_lines(path)?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].as_ref(), "c d");
        Ok(())
    }

    #[test]
    fn test_read_types_gz_with_header() -> anyhow::Result<()> {
        let path = create_temp_dir_file(".tsv.gz")?;
        let path = path.to_str().unwrap();
        {
            let mut w = open_buf_writer(path)?;
            writeln!(w, "x\ty")?;
            writeln!(w, "1.5\t-2")?;
            writeln!(w, "0\t3e-2")?;
            w.flush()?;
        }
        let out = read_lines_of_types::<f64>(path, "\t", true)?;
        assert_eq!(out.header.len(), 2);
        assert_eq!(out.lines, vec![vec![1.5, -2.0], vec![0.0, 0.03]]);
        Ok(())
    }

    #[test]
    fn test_parse_error_reports_line() -> anyhow::Result<()> {
        let path = create_temp_dir_file(".tsv")?;
        let path = path.to_str().unwrap();
        {
            let mut w = open_buf_writer(path)?;
            writeln!(w, "1\t2")?;
            writeln!(w, "3\tfoo")?;
            w.flush()?;
        }
        let err = read_lines_of_types::<f64>(path, "\t", false).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        Ok(())
    }
}

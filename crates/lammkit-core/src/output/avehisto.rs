use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::warn;

use super::{
    bad_header, fields_after_hash, header_line, parse_count_field, parse_float_field,
    parse_int_field, read_block, NumberedLines, OutputError, Table,
};

const KIND: &str = "ave/histo";

/// One histogram block from a `fix ave/histo` file.
#[derive(Debug, Clone, PartialEq)]
pub struct AveHistoFrame {
    pub timestep: i64,
    /// Samples that landed inside the histogram bounds.
    pub total_count: i64,
    /// Samples that fell outside the bounds. Non-zero is logged, not raised.
    pub missing_count: i64,
    pub min_value: f64,
    pub max_value: f64,
    pub table: Table,
}

/// Reader for the output of `fix ave/histo`.
///
/// Yields one [`AveHistoFrame`] per histogram, one table row per bin with the
/// fixed `Bin Coord Count Count/Total` columns.
#[derive(Debug)]
pub struct AveHisto<R> {
    lines: NumberedLines<R>,
    description: String,
    fields: Vec<String>,
}

impl<R: BufRead> AveHisto<R> {
    /// Consumes the fixed header and positions the reader on the first frame.
    pub fn new(reader: R) -> Result<Self, OutputError> {
        let mut lines = NumberedLines::new(reader);

        let line = header_line(&mut lines, KIND)?;
        if !line.starts_with("# Histogrammed data for fix") {
            return Err(bad_header(KIND, &line));
        }
        let description = line[1..].trim().to_string();

        let line = header_line(&mut lines, KIND)?;
        if line.trim()
            != "# TimeStep Number-of-bins Total-counts Missing-counts Min-value Max-value"
        {
            return Err(bad_header(KIND, &line));
        }

        let line = header_line(&mut lines, KIND)?;
        if line.trim() != "# Bin Coord Count Count/Total" {
            return Err(bad_header(KIND, &line));
        }
        let fields = fields_after_hash(&line);

        Ok(Self {
            lines,
            description,
            fields,
        })
    }

    /// The fix identification line, without its leading `#`.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Column names of every frame's table.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn read_frame(&mut self) -> Result<Option<AveHistoFrame>, OutputError> {
        let line = match self.lines.next_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        let lineno = self.lines.current();
        let mut tokens = line.split_whitespace();
        let timestep = parse_int_field(tokens.next(), "TimeStep", lineno)?;
        let declared = parse_count_field(tokens.next(), "Number-of-bins", lineno)?;
        // The total is an integer but LAMMPS writes it in scientific notation.
        let total_count = parse_float_field(tokens.next(), "Total-counts", lineno)? as i64;
        let missing_count = parse_int_field(tokens.next(), "Missing-counts", lineno)?;
        let min_value = parse_float_field(tokens.next(), "Min-value", lineno)?;
        let max_value = parse_float_field(tokens.next(), "Max-value", lineno)?;

        if missing_count != 0 {
            warn!(
                "histogram at timestep {} is missing {} counts",
                timestep, missing_count
            );
        }

        let table = read_block(&mut self.lines, &self.fields, declared, "bins")?;

        Ok(Some(AveHistoFrame {
            timestep,
            total_count,
            missing_count,
            min_value,
            max_value,
            table,
        }))
    }
}

impl AveHisto<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: BufRead> Iterator for AveHisto<R> {
    type Item = Result<AveHistoFrame, OutputError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

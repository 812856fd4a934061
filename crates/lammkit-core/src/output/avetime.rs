use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{
    bad_header, fields_after_hash, header_line, parse_count_field, parse_int_field, parse_numeric,
    read_block, AveFrame, NumberedLines, OutputError, Table,
};

const KIND: &str = "ave/time";

/// Layout of a `fix ave/time` file, set by the fix's `mode` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AveMode {
    /// One line per frame: the timestep followed by every averaged value.
    Scalar,
    /// One block per frame: the timestep and a row count, then one line per
    /// row.
    #[default]
    Vector,
}

/// Reader for the output of `fix ave/time`.
///
/// Yields one [`AveFrame`] per averaged block. Under [`AveMode::Scalar`] the
/// frame's table has a single row.
#[derive(Debug)]
pub struct AveTime<R> {
    lines: NumberedLines<R>,
    mode: AveMode,
    description: String,
    fields: Vec<String>,
}

impl<R: BufRead> AveTime<R> {
    /// Consumes the fixed header and positions the reader on the first frame.
    pub fn new(reader: R, mode: AveMode) -> Result<Self, OutputError> {
        let mut lines = NumberedLines::new(reader);

        let line = header_line(&mut lines, KIND)?;
        if !line.starts_with("# Time-averaged data for fix") {
            return Err(bad_header(KIND, &line));
        }
        let description = line[1..].trim().to_string();

        let fields = match mode {
            AveMode::Vector => {
                let line = header_line(&mut lines, KIND)?;
                if line.trim() != "# TimeStep Number-of-rows" {
                    return Err(bad_header(KIND, &line));
                }
                let line = header_line(&mut lines, KIND)?;
                if !line.starts_with("# Row") {
                    return Err(bad_header(KIND, &line));
                }
                fields_after_hash(&line)
            }
            AveMode::Scalar => {
                let line = header_line(&mut lines, KIND)?;
                match line.strip_prefix("# TimeStep") {
                    Some(rest) => rest.split_whitespace().map(str::to_string).collect(),
                    None => return Err(bad_header(KIND, &line)),
                }
            }
        };

        Ok(Self {
            lines,
            mode,
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

    fn read_frame(&mut self) -> Result<Option<AveFrame>, OutputError> {
        let line = match self.lines.next_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        let lineno = self.lines.current();
        let mut tokens = line.split_whitespace();
        let timestep = parse_int_field(tokens.next(), "TimeStep", lineno)?;

        let table = match self.mode {
            AveMode::Vector => {
                let declared = parse_count_field(tokens.next(), "Number-of-rows", lineno)?;
                read_block(&mut self.lines, &self.fields, declared, "rows")?
            }
            AveMode::Scalar => {
                let row = self
                    .fields
                    .iter()
                    .zip(tokens)
                    .map(|(field, token)| parse_numeric(field, token, lineno))
                    .collect::<Result<Vec<_>, _>>()?;
                Table {
                    fields: self.fields.clone(),
                    rows: vec![row],
                }
            }
        };

        Ok(Some(AveFrame { timestep, table }))
    }
}

impl AveTime<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>, mode: AveMode) -> Result<Self, OutputError> {
        Self::new(BufReader::new(File::open(path)?), mode)
    }
}

impl<R: BufRead> Iterator for AveTime<R> {
    type Item = Result<AveFrame, OutputError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

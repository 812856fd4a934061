//! Reading of the files LAMMPS writes while it runs.
//!
//! Each reader in this family is a lazy, single-pass iterator over one output
//! format: [`log::ThermoLog`] for the thermodynamic tables inside a log file,
//! the `fix ave/*` averages ([`avetime::AveTime`], [`avechunk::AveChunk`],
//! [`avehisto::AveHisto`], [`avecorrelate::AveCorrelate`]), and the trajectory
//! readers ([`dump::Dump`] and [`dumplocal::DumpLocal`]).
//!
//! Construction consumes the fixed file header where the format has one and
//! leaves the reader positioned on the first frame; every `next` call then
//! parses exactly one frame, so files larger than memory stream fine. Readers
//! are generic over [`BufRead`] and offer `from_path` conveniences for plain
//! files.

pub mod avechunk;
pub mod avecorrelate;
pub mod avehisto;
pub mod avetime;
pub mod dump;
pub mod dumplocal;
pub mod log;

use std::fmt;
use std::io::{self, BufRead};

use thiserror::Error;

/// Errors that can occur while reading a LAMMPS output file.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("not a LAMMPS {expected} file: unexpected header {found:?}")]
    UnrecognizedHeader {
        expected: &'static str,
        found: String,
    },
    #[error("parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: OutputParseErrorKind,
    },
    #[error("file ends inside a frame: {declared} {unit} declared, {found} read")]
    Truncated {
        unit: &'static str,
        declared: usize,
        found: usize,
    },
    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof { expected: &'static str },
}

/// Specific kinds of per-line parsing failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutputParseErrorKind {
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },
    #[error("invalid integer '{value}' for field '{field}'")]
    InvalidInt { field: String, value: String },
    #[error("invalid number '{value}' for field '{field}'")]
    InvalidFloat { field: String, value: String },
}

/// A single cell of an output table.
///
/// LAMMPS writes every cell as text; a cell that parses as an integer stays
/// one, anything else numeric becomes a float. Trajectory dumps may carry
/// genuinely textual columns (`element`), which stay as [`Value::Text`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Parses a cell, preferring the narrowest representation.
    pub fn parse(token: &str) -> Self {
        if let Ok(value) = token.parse::<i64>() {
            return Self::Int(value);
        }
        match token.parse::<f64>() {
            Ok(value) => Self::Float(value),
            Err(_) => Self::Text(token.to_string()),
        }
    }

    /// Numeric view of the cell, promoting integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => fmt::Display::fmt(value, f),
            Self::Float(value) => fmt::Display::fmt(value, f),
            Self::Text(value) => f.pad(value),
        }
    }
}

/// Rows sharing one set of column names.
///
/// `fields` keeps the file's column order. Rows hold at most one cell per
/// field; a row the file wrote short stays short.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Position of a named column.
    pub fn column(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|name| name == field)
    }

    /// Cell at `(row, field)`.
    pub fn get(&self, row: usize, field: &str) -> Option<&Value> {
        let column = self.column(field)?;
        self.rows.get(row)?.get(column)
    }

    /// Sorts rows in ascending order of an integer column.
    ///
    /// Returns `false` and leaves the order alone when the column does not
    /// exist. Rows whose cell is not an integer sort last.
    pub fn sort_by_int(&mut self, field: &str) -> bool {
        let column = match self.column(field) {
            Some(column) => column,
            None => return false,
        };
        self.rows.sort_by_key(|row| match row.get(column) {
            Some(Value::Int(value)) => *value,
            _ => i64::MAX,
        });
        true
    }
}

/// One averaged block from a `fix ave/*` output file.
#[derive(Debug, Clone, PartialEq)]
pub struct AveFrame {
    pub timestep: i64,
    pub table: Table,
}

/// Line source that tracks the 1-based position for error reporting.
#[derive(Debug)]
pub(crate) struct NumberedLines<R> {
    lines: io::Lines<R>,
    current: usize,
}

impl<R: BufRead> NumberedLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            current: 0,
        }
    }

    /// Next line, or `None` at end of file.
    pub(crate) fn next_line(&mut self) -> Result<Option<String>, io::Error> {
        match self.lines.next() {
            Some(line) => {
                self.current += 1;
                Ok(Some(line?))
            }
            None => Ok(None),
        }
    }

    /// Number of the line most recently returned.
    pub(crate) fn current(&self) -> usize {
        self.current
    }
}

/// Reads one mandatory header line; end of file means the stream cannot be
/// the expected format.
pub(crate) fn header_line<R: BufRead>(
    lines: &mut NumberedLines<R>,
    kind: &'static str,
) -> Result<String, OutputError> {
    match lines.next_line()? {
        Some(line) => Ok(line),
        None => Err(bad_header(kind, "")),
    }
}

pub(crate) fn bad_header(kind: &'static str, found: &str) -> OutputError {
    OutputError::UnrecognizedHeader {
        expected: kind,
        found: found.trim().to_string(),
    }
}

/// Column names between the first `#` and the end of a header line.
pub(crate) fn fields_after_hash(line: &str) -> Vec<String> {
    let body = line.splitn(3, '#').nth(1).unwrap_or("");
    body.split_whitespace().map(str::to_string).collect()
}

pub(crate) fn parse_int_field(
    token: Option<&str>,
    field: &'static str,
    line: usize,
) -> Result<i64, OutputError> {
    let token = require_field(token, field, line)?;
    token.parse().map_err(|_| OutputError::Parse {
        line,
        kind: OutputParseErrorKind::InvalidInt {
            field: field.to_string(),
            value: token.to_string(),
        },
    })
}

pub(crate) fn parse_count_field(
    token: Option<&str>,
    field: &'static str,
    line: usize,
) -> Result<usize, OutputError> {
    let token = require_field(token, field, line)?;
    token.parse().map_err(|_| OutputError::Parse {
        line,
        kind: OutputParseErrorKind::InvalidInt {
            field: field.to_string(),
            value: token.to_string(),
        },
    })
}

pub(crate) fn parse_float_field(
    token: Option<&str>,
    field: &'static str,
    line: usize,
) -> Result<f64, OutputError> {
    let token = require_field(token, field, line)?;
    token.parse().map_err(|_| OutputError::Parse {
        line,
        kind: OutputParseErrorKind::InvalidFloat {
            field: field.to_string(),
            value: token.to_string(),
        },
    })
}

fn require_field<'a>(
    token: Option<&'a str>,
    field: &'static str,
    line: usize,
) -> Result<&'a str, OutputError> {
    token.ok_or(OutputError::Parse {
        line,
        kind: OutputParseErrorKind::MissingField { field },
    })
}

/// Numeric cell of an averaged block; text is not allowed there.
pub(crate) fn parse_numeric(
    field: &str,
    token: &str,
    line: usize,
) -> Result<Value, OutputError> {
    if let Ok(value) = token.parse::<i64>() {
        return Ok(Value::Int(value));
    }
    match token.parse::<f64>() {
        Ok(value) => Ok(Value::Float(value)),
        Err(_) => Err(OutputError::Parse {
            line,
            kind: OutputParseErrorKind::InvalidFloat {
                field: field.to_string(),
                value: token.to_string(),
            },
        }),
    }
}

/// Reads the `declared` value rows of one averaged block.
pub(crate) fn read_block<R: BufRead>(
    lines: &mut NumberedLines<R>,
    fields: &[String],
    declared: usize,
    unit: &'static str,
) -> Result<Table, OutputError> {
    let mut rows = Vec::with_capacity(declared);
    for _ in 0..declared {
        let line = match lines.next_line()? {
            Some(line) => line,
            None => {
                return Err(OutputError::Truncated {
                    unit,
                    declared,
                    found: rows.len(),
                });
            }
        };
        let lineno = lines.current();
        let row = fields
            .iter()
            .zip(line.split_whitespace())
            .map(|(field, token)| parse_numeric(field, token, lineno))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(Table {
        fields: fields.to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    mod values {
        use super::*;

        #[test]
        fn parse_prefers_int_then_float_then_text() {
            assert_eq!(Value::parse("42"), Value::Int(42));
            assert_eq!(Value::parse("-7"), Value::Int(-7));
            assert_eq!(Value::parse("1.5"), Value::Float(1.5));
            assert_eq!(Value::parse("1.5e+03"), Value::Float(1500.0));
            assert_eq!(Value::parse("OW"), Value::Text("OW".to_string()));
        }

        #[test]
        fn as_f64_promotes_ints_and_rejects_text() {
            assert_eq!(Value::Int(3).as_f64(), Some(3.0));
            assert_eq!(Value::Float(0.25).as_f64(), Some(0.25));
            assert_eq!(Value::Text("HW".to_string()).as_f64(), None);
        }

        #[test]
        fn as_i64_never_truncates_floats() {
            assert_eq!(Value::Int(3).as_i64(), Some(3));
            assert_eq!(Value::Float(3.9).as_i64(), None);
        }

        #[test]
        fn display_honors_the_outer_format_spec() {
            assert_eq!(format!("{:>8}", Value::Int(42)), "      42");
            assert_eq!(format!("{:>8}", Value::Float(1.5)), "     1.5");
            assert_eq!(format!("{:<8}", Value::Text("OW".to_string())), "OW      ");
        }
    }

    mod tables {
        use super::*;

        fn create_table() -> Table {
            Table {
                fields: vec!["id".to_string(), "x".to_string()],
                rows: vec![
                    vec![Value::Int(2), Value::Float(1.0)],
                    vec![Value::Int(1), Value::Float(4.0)],
                ],
            }
        }

        #[test]
        fn get_addresses_cells_by_row_and_field() {
            let table = create_table();
            assert_eq!(table.get(0, "x"), Some(&Value::Float(1.0)));
            assert_eq!(table.get(1, "id"), Some(&Value::Int(1)));
            assert_eq!(table.get(0, "vx"), None);
            assert_eq!(table.get(2, "x"), None);
        }

        #[test]
        fn sort_by_int_reorders_rows() {
            let mut table = create_table();
            assert!(table.sort_by_int("id"));
            assert_eq!(table.get(0, "id"), Some(&Value::Int(1)));
            assert_eq!(table.get(0, "x"), Some(&Value::Float(4.0)));
        }

        #[test]
        fn sort_by_int_without_the_column_is_a_no_op() {
            let mut table = create_table();
            assert!(!table.sort_by_int("mol"));
            assert_eq!(table.get(0, "id"), Some(&Value::Int(2)));
        }
    }

    mod helpers {
        use super::*;

        #[test]
        fn fields_follow_the_first_hash() {
            let fields = fields_after_hash("# Row c_rdf[1] c_rdf[2]");
            assert_eq!(fields, ["Row", "c_rdf[1]", "c_rdf[2]"]);
        }

        #[test]
        fn a_second_hash_ends_the_field_list() {
            let fields = fields_after_hash("# Chunk Coord1 # appended note");
            assert_eq!(fields, ["Chunk", "Coord1"]);
        }
    }
}

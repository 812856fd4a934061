use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{
    bad_header, fields_after_hash, header_line, parse_count_field, parse_int_field, read_block,
    AveFrame, NumberedLines, OutputError,
};

const KIND: &str = "ave/correlate";

/// Reader for the output of `fix ave/correlate` and `fix ave/correlate/long`.
///
/// Yields one [`AveFrame`] per correlation block, one table row per time
/// window.
#[derive(Debug)]
pub struct AveCorrelate<R> {
    lines: NumberedLines<R>,
    description: String,
    fields: Vec<String>,
}

impl<R: BufRead> AveCorrelate<R> {
    /// Consumes the fixed header and positions the reader on the first frame.
    pub fn new(reader: R) -> Result<Self, OutputError> {
        let mut lines = NumberedLines::new(reader);

        let line = header_line(&mut lines, KIND)?;
        if !line.starts_with("# Time-correlated data for fix") {
            return Err(bad_header(KIND, &line));
        }
        let description = line[1..].trim().to_string();

        let line = header_line(&mut lines, KIND)?;
        if line.trim() != "# Timestep Number-of-time-windows" {
            return Err(bad_header(KIND, &line));
        }

        let line = header_line(&mut lines, KIND)?;
        if !line.starts_with("# Index") {
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

    fn read_frame(&mut self) -> Result<Option<AveFrame>, OutputError> {
        let line = match self.lines.next_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        let lineno = self.lines.current();
        let mut tokens = line.split_whitespace();
        let timestep = parse_int_field(tokens.next(), "Timestep", lineno)?;
        let declared = parse_count_field(tokens.next(), "Number-of-time-windows", lineno)?;
        let table = read_block(&mut self.lines, &self.fields, declared, "time windows")?;

        Ok(Some(AveFrame { timestep, table }))
    }
}

impl AveCorrelate<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: BufRead> Iterator for AveCorrelate<R> {
    type Item = Result<AveFrame, OutputError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::super::Value;
    use super::*;

    const CORRELATE_FILE: &str = "\
# Time-correlated data for fix P0Pt
# Timestep Number-of-time-windows
# Index TimeDelta Ncount c_P0*c_Pt
2000 3
1 0 200 1.0
2 10 199 0.8
3 20 198 0.6
";

    #[test]
    fn the_header_names_the_fix_and_the_columns() {
        let reader = AveCorrelate::new(Cursor::new(CORRELATE_FILE)).unwrap();
        assert_eq!(reader.description(), "Time-correlated data for fix P0Pt");
        assert_eq!(
            reader.fields(),
            ["Index", "TimeDelta", "Ncount", "c_P0*c_Pt"]
        );
    }

    #[test]
    fn each_block_holds_one_row_per_time_window() {
        let reader = AveCorrelate::new(Cursor::new(CORRELATE_FILE)).unwrap();
        let frames: Vec<_> = reader.map(Result::unwrap).collect();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestep, 2000);
        assert_eq!(frames[0].table.rows.len(), 3);
        assert_eq!(frames[0].table.get(2, "TimeDelta"), Some(&Value::Int(20)));
        assert_eq!(frames[0].table.get(2, "c_P0*c_Pt"), Some(&Value::Float(0.6)));
    }

    #[test]
    fn an_ave_time_header_is_rejected() {
        let text = "# Time-averaged data for fix myRDF\n";
        let error = AveCorrelate::new(Cursor::new(text)).unwrap_err();
        assert!(matches!(
            error,
            OutputError::UnrecognizedHeader {
                expected: "ave/correlate",
                ..
            }
        ));
    }
}

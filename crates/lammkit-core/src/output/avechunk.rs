use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{
    bad_header, fields_after_hash, header_line, parse_count_field, parse_int_field, read_block,
    AveFrame, NumberedLines, OutputError,
};

const KIND: &str = "ave/chunk";

/// Reader for the output of `fix ave/chunk`.
///
/// Yields one [`AveFrame`] per chunk-averaged block. The total sample count
/// on each block's index line is not part of the frame.
#[derive(Debug)]
pub struct AveChunk<R> {
    lines: NumberedLines<R>,
    description: String,
    fields: Vec<String>,
}

impl<R: BufRead> AveChunk<R> {
    /// Consumes the fixed header and positions the reader on the first frame.
    pub fn new(reader: R) -> Result<Self, OutputError> {
        let mut lines = NumberedLines::new(reader);

        let line = header_line(&mut lines, KIND)?;
        if !line.starts_with("# Chunk-averaged data for fix") {
            return Err(bad_header(KIND, &line));
        }
        let description = line[1..].trim().to_string();

        // LAMMPS itself writes "Timestep" here, not "TimeStep".
        let line = header_line(&mut lines, KIND)?;
        if line.trim() != "# Timestep Number-of-chunks Total-count" {
            return Err(bad_header(KIND, &line));
        }

        let line = header_line(&mut lines, KIND)?;
        if !line.starts_with("# Chunk") {
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
        let declared = parse_count_field(tokens.next(), "Number-of-chunks", lineno)?;
        let table = read_block(&mut self.lines, &self.fields, declared, "chunks")?;

        Ok(Some(AveFrame { timestep, table }))
    }
}

impl AveChunk<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: BufRead> Iterator for AveChunk<R> {
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

    const CHUNK_FILE: &str = "\
# Chunk-averaged data for fix profile
# Timestep Number-of-chunks Total-count
# Chunk Coord1 Ncount vx
100 2 900.0
  1 0.5 450.0 0.01
  2 1.5 450.0 -0.01
200 2 900.0
  1 0.5 440.0 0.02
  2 1.5 460.0 -0.02
";

    #[test]
    fn the_header_names_the_fix_and_the_columns() {
        let reader = AveChunk::new(Cursor::new(CHUNK_FILE)).unwrap();
        assert_eq!(reader.description(), "Chunk-averaged data for fix profile");
        assert_eq!(reader.fields(), ["Chunk", "Coord1", "Ncount", "vx"]);
    }

    #[test]
    fn each_block_becomes_one_frame() {
        let reader = AveChunk::new(Cursor::new(CHUNK_FILE)).unwrap();
        let frames: Vec<_> = reader.map(Result::unwrap).collect();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestep, 100);
        assert_eq!(frames[0].table.rows.len(), 2);
        assert_eq!(frames[0].table.get(1, "vx"), Some(&Value::Float(-0.01)));
        assert_eq!(frames[1].table.get(0, "Ncount"), Some(&Value::Float(440.0)));
    }

    #[test]
    fn the_second_header_line_uses_the_timestep_typography() {
        let text = "\
# Chunk-averaged data for fix profile
# TimeStep Number-of-chunks Total-count
# Chunk Coord1 Ncount vx
";
        let error = AveChunk::new(Cursor::new(text)).unwrap_err();
        assert!(matches!(error, OutputError::UnrecognizedHeader { .. }));
    }
}

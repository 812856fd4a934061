use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nalgebra::Vector3;

use crate::core::models::simbox::SimBox;

use super::{
    bad_header, parse_count_field, parse_float_field, parse_int_field, NumberedLines, OutputError,
    Table, Value,
};

/// One trajectory snapshot from a dump file.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpFrame {
    pub timestep: i64,
    /// Boundary style flags, one token per dimension (`pp pp fs` and such).
    pub boundaries: Vec<String>,
    pub simbox: SimBox,
    /// The per-atom (`Dump`) or per-entry (`DumpLocal`) table.
    pub table: Table,
}

/// Keywords distinguishing a per-atom dump from a per-entry one.
pub(crate) struct DumpFormat {
    pub(crate) kind: &'static str,
    pub(crate) count_item: &'static str,
    pub(crate) table_item: &'static str,
    pub(crate) row_unit: &'static str,
}

const FORMAT: DumpFormat = DumpFormat {
    kind: "dump",
    count_item: "ITEM: NUMBER OF ATOMS",
    table_item: "ITEM: ATOMS",
    row_unit: "atoms",
};

/// Reader for a LAMMPS trajectory dump (`dump atom` / `dump custom`).
///
/// Yields one [`DumpFrame`] per snapshot. Column names come from each
/// snapshot's own `ITEM: ATOMS` line; cells that are not numeric stay text.
/// Construction never touches the stream, so the first frame carries any
/// format validation error.
pub struct Dump<R> {
    lines: NumberedLines<R>,
}

impl<R: BufRead> Dump<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: NumberedLines::new(reader),
        }
    }
}

impl Dump<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Iterator for Dump<R> {
    type Item = Result<DumpFrame, OutputError>;

    fn next(&mut self) -> Option<Self::Item> {
        read_frame(&mut self.lines, &FORMAT).transpose()
    }
}

/// Parses one `ITEM:`-sectioned snapshot. A blank line or end of file at a
/// snapshot boundary ends iteration.
pub(crate) fn read_frame<R: BufRead>(
    lines: &mut NumberedLines<R>,
    format: &DumpFormat,
) -> Result<Option<DumpFrame>, OutputError> {
    let line = match lines.next_line()? {
        Some(line) => line,
        None => return Ok(None),
    };
    if line.trim().is_empty() {
        return Ok(None);
    }
    if line.trim() != "ITEM: TIMESTEP" {
        return Err(bad_header(format.kind, &line));
    }
    let line = value_line(lines, "the timestep")?;
    let timestep = parse_int_field(Some(line.trim()), "TIMESTEP", lines.current())?;

    let line = value_line(lines, "the entity count item")?;
    if line.trim() != format.count_item {
        return Err(bad_header(format.kind, &line));
    }
    let line = value_line(lines, "the entity count")?;
    let declared = parse_count_field(Some(line.trim()), format.row_unit, lines.current())?;

    let line = value_line(lines, "the box bounds item")?;
    if !line.starts_with("ITEM: BOX BOUNDS") {
        return Err(bad_header(format.kind, &line));
    }
    let triclinic = line.contains("xy xz yz");
    let flags_from = if triclinic { 6 } else { 3 };
    let boundaries = line
        .split_whitespace()
        .skip(flags_from)
        .map(str::to_string)
        .collect();

    let mut bounds = [(0.0, 0.0); 3];
    let mut tilt = Vector3::zeros();
    for (i, bound) in bounds.iter_mut().enumerate() {
        let line = value_line(lines, "a box bounds row")?;
        let lineno = lines.current();
        let mut tokens = line.split_whitespace();
        bound.0 = parse_float_field(tokens.next(), "lo", lineno)?;
        bound.1 = parse_float_field(tokens.next(), "hi", lineno)?;
        if triclinic {
            tilt[i] = parse_float_field(tokens.next(), "tilt", lineno)?;
        }
    }
    let simbox = SimBox {
        x: bounds[0],
        y: bounds[1],
        z: bounds[2],
        tilt,
    };

    let line = value_line(lines, "the table item")?;
    let fields: Vec<String> = match line.trim().strip_prefix(format.table_item) {
        Some(rest) => rest.split_whitespace().map(str::to_string).collect(),
        None => return Err(bad_header(format.kind, &line)),
    };

    let mut rows = Vec::with_capacity(declared);
    for _ in 0..declared {
        let line = match lines.next_line()? {
            Some(line) => line,
            None => {
                return Err(OutputError::Truncated {
                    unit: format.row_unit,
                    declared,
                    found: rows.len(),
                });
            }
        };
        let row = fields
            .iter()
            .zip(line.split_whitespace())
            .map(|(_, token)| Value::parse(token))
            .collect();
        rows.push(row);
    }

    Ok(Some(DumpFrame {
        timestep,
        boundaries,
        simbox,
        table: Table { fields, rows },
    }))
}

fn value_line<R: BufRead>(
    lines: &mut NumberedLines<R>,
    expected: &'static str,
) -> Result<String, OutputError> {
    lines
        .next_line()?
        .ok_or(OutputError::UnexpectedEof { expected })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const TRAJECTORY: &str = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
2
ITEM: BOX BOUNDS pp pp pp
0.0 10.0
0.0 10.0
-5.0 5.0
ITEM: ATOMS id type element x y z
2 1 OW 1.0 2.0 3.0
1 2 HW 4.0 5.0 6.0
ITEM: TIMESTEP
100
ITEM: NUMBER OF ATOMS
2
ITEM: BOX BOUNDS pp pp pp
0.0 10.0
0.0 10.0
-5.0 5.0
ITEM: ATOMS id type element x y z
1 2 HW 4.1 5.1 6.1
2 1 OW 1.1 2.1 3.1
";

    #[test]
    fn each_snapshot_becomes_one_frame() {
        let frames: Vec<_> = Dump::new(Cursor::new(TRAJECTORY))
            .map(Result::unwrap)
            .collect();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestep, 0);
        assert_eq!(frames[1].timestep, 100);
        assert_eq!(frames[0].boundaries, ["pp", "pp", "pp"]);
        assert_eq!(frames[0].simbox.x, (0.0, 10.0));
        assert_eq!(frames[0].simbox.z, (-5.0, 5.0));
        assert!(!frames[0].simbox.is_triclinic());
        assert_eq!(frames[0].table.rows.len(), 2);
    }

    #[test]
    fn textual_columns_stay_text() {
        let mut dump = Dump::new(Cursor::new(TRAJECTORY));
        let frame = dump.next().unwrap().unwrap();

        assert_eq!(
            frame.table.get(0, "element"),
            Some(&Value::Text("OW".to_string()))
        );
        assert_eq!(frame.table.get(0, "x"), Some(&Value::Float(1.0)));
        assert_eq!(frame.table.get(0, "id"), Some(&Value::Int(2)));
    }

    #[test]
    fn rows_can_be_put_back_in_id_order() {
        let mut dump = Dump::new(Cursor::new(TRAJECTORY));
        let mut frame = dump.next().unwrap().unwrap();

        assert!(frame.table.sort_by_int("id"));
        assert_eq!(frame.table.get(0, "id"), Some(&Value::Int(1)));
        assert_eq!(frame.table.get(0, "element"), Some(&Value::Text("HW".to_string())));
    }

    #[test]
    fn a_triclinic_box_carries_its_tilt_column() {
        let text = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
1
ITEM: BOX BOUNDS xy xz yz pp pp fs
0.0 10.0 0.5
0.0 10.0 0.0
-5.0 5.0 -0.25
ITEM: ATOMS id x y z
1 1.0 2.0 3.0
";
        let mut dump = Dump::new(Cursor::new(text));
        let frame = dump.next().unwrap().unwrap();

        assert_eq!(frame.boundaries, ["pp", "pp", "fs"]);
        assert!(frame.simbox.is_triclinic());
        assert_eq!(frame.simbox.tilt, Vector3::new(0.5, 0.0, -0.25));
    }

    #[test]
    fn a_blank_line_at_a_snapshot_boundary_ends_iteration() {
        let text = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
1
ITEM: BOX BOUNDS pp pp pp
0.0 10.0
0.0 10.0
0.0 10.0
ITEM: ATOMS id x y z
1 1.0 2.0 3.0

leftover text
";
        let mut dump = Dump::new(Cursor::new(text));
        assert!(dump.next().unwrap().is_ok());
        assert!(dump.next().is_none());
    }

    #[test]
    fn a_stream_that_is_not_a_dump_fails_on_the_first_frame() {
        let mut dump = Dump::new(Cursor::new("# Time-averaged data for fix myRDF\n"));
        let error = dump.next().unwrap().unwrap_err();
        assert!(matches!(
            error,
            OutputError::UnrecognizedHeader { expected: "dump", .. }
        ));
    }

    #[test]
    fn a_snapshot_cut_short_by_the_end_of_file_is_an_error() {
        let text = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
3
ITEM: BOX BOUNDS pp pp pp
0.0 10.0
0.0 10.0
0.0 10.0
ITEM: ATOMS id x y z
1 1.0 2.0 3.0
";
        let mut dump = Dump::new(Cursor::new(text));
        let error = dump.next().unwrap().unwrap_err();
        assert!(matches!(
            error,
            OutputError::Truncated {
                unit: "atoms",
                declared: 3,
                found: 1,
            }
        ));
    }
}

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::dump::{read_frame, DumpFormat, DumpFrame};
use super::{NumberedLines, OutputError};

const FORMAT: DumpFormat = DumpFormat {
    kind: "dump local",
    count_item: "ITEM: NUMBER OF ENTRIES",
    table_item: "ITEM: ENTRIES",
    row_unit: "entries",
};

/// Reader for the output of `dump local` (per-bond, per-angle, or other
/// per-entry quantities).
///
/// Same framing as [`super::dump::Dump`], with `ENTRIES` items in place of
/// `ATOMS`.
pub struct DumpLocal<R> {
    lines: NumberedLines<R>,
}

impl<R: BufRead> DumpLocal<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: NumberedLines::new(reader),
        }
    }
}

impl DumpLocal<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Iterator for DumpLocal<R> {
    type Item = Result<DumpFrame, OutputError>;

    fn next(&mut self) -> Option<Self::Item> {
        read_frame(&mut self.lines, &FORMAT).transpose()
    }
}

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::NonZeroUsize;
use std::path::Path;

use tracing::{error, warn};

use super::{NumberedLines, OutputError, OutputParseErrorKind};

/// One row of thermodynamic output, keyed by the run's header fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThermoRecord {
    pub entries: Vec<(String, f64)>,
}

impl ThermoRecord {
    /// Value of a named thermo column.
    pub fn get(&self, field: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| *value)
    }
}

/// Reader for the thermodynamic tables inside a LAMMPS log file.
///
/// A log interleaves command echoes, informational chatter, and one
/// thermodynamic table per `run` command. The reader skips to each table by
/// its memory-usage banner, takes the line after the banner as the column
/// header, and yields one [`ThermoRecord`] per row until the closing `Loop`
/// line. `WARNING` lines anywhere are logged and skipped; an `ERROR` line
/// inside a table is logged and ends iteration.
pub struct ThermoLog<R> {
    lines: NumberedLines<R>,
    single: bool,
    current_run: usize,
    fields: Vec<String>,
    done: bool,
}

impl<R: BufRead> ThermoLog<R> {
    /// Positions the reader on the first run; iteration covers every run in
    /// the file.
    pub fn new(reader: R) -> Result<Self, OutputError> {
        let mut log = Self::start(reader, false);
        let found = log.seek_next_run()?;
        log.done = !found;
        Ok(log)
    }

    /// Positions the reader on the given 1-based run; iteration stops at the
    /// end of that run. A run number past the end of the file yields nothing.
    pub fn single_run(reader: R, run: NonZeroUsize) -> Result<Self, OutputError> {
        let mut log = Self::start(reader, true);
        for _ in 0..run.get() {
            if !log.seek_next_run()? {
                log.done = true;
                break;
            }
        }
        Ok(log)
    }

    fn start(reader: R, single: bool) -> Self {
        Self {
            lines: NumberedLines::new(reader),
            single,
            current_run: 0,
            fields: Vec::new(),
            done: false,
        }
    }

    /// Column names of the run currently being read.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// 1-based index of the run currently being read, 0 before any run was
    /// found.
    pub fn current_run(&self) -> usize {
        self.current_run
    }

    /// Advances to the next memory-usage banner and loads the column header
    /// that follows it. Returns whether another run was found.
    fn seek_next_run(&mut self) -> Result<bool, OutputError> {
        while let Some(line) = self.lines.next_line()? {
            if line.starts_with("WARNING") {
                warn!("{}", line.trim());
                continue;
            }
            if line.starts_with("ERROR") {
                error!("{}", line.trim());
                continue;
            }
            if line.starts_with("Per MPI rank memory allocation")
                || line.starts_with("Memory usage per processor")
            {
                let header = self.lines.next_line()?.unwrap_or_default();
                self.fields = header.split_whitespace().map(str::to_string).collect();
                self.current_run += 1;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn read_record(&mut self) -> Result<Option<ThermoRecord>, OutputError> {
        loop {
            if self.done {
                return Ok(None);
            }
            let line = match self.lines.next_line()? {
                Some(line) => line,
                None => return Ok(None),
            };
            if line.starts_with("WARNING") {
                warn!("{}", line.trim());
                continue;
            }
            if line.starts_with("ERROR") {
                error!("{}", line.trim());
                self.done = true;
                return Ok(None);
            }
            if line.starts_with("Loop") {
                if self.single || !self.seek_next_run()? {
                    self.done = true;
                    return Ok(None);
                }
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            let lineno = self.lines.current();
            let mut entries = Vec::with_capacity(self.fields.len());
            for (field, token) in self.fields.iter().zip(line.split_whitespace()) {
                let value = token.parse().map_err(|_| OutputError::Parse {
                    line: lineno,
                    kind: OutputParseErrorKind::InvalidFloat {
                        field: field.clone(),
                        value: token.to_string(),
                    },
                })?;
                entries.push((field.clone(), value));
            }
            return Ok(Some(ThermoRecord { entries }));
        }
    }
}

impl ThermoLog<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Self::new(BufReader::new(File::open(path)?))
    }

    pub fn single_run_from_path(
        path: impl AsRef<Path>,
        run: NonZeroUsize,
    ) -> Result<Self, OutputError> {
        Self::single_run(BufReader::new(File::open(path)?), run)
    }
}

impl<R: BufRead> Iterator for ThermoLog<R> {
    type Item = Result<ThermoRecord, OutputError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

use std::io::{BufRead, Write};

use lammkit::output::log::{ThermoLog, ThermoRecord};

use crate::cli::ThermoArgs;
use crate::config::FileConfig;
use crate::error::Result;

pub fn run(args: ThermoArgs, config: &FileConfig) -> Result<()> {
    let log = match config.thermo_run(args.run)? {
        Some(run) => ThermoLog::single_run_from_path(&args.input, run)?,
        None => ThermoLog::from_path(&args.input)?,
    };

    let stdout = std::io::stdout();
    print_records(log, &mut stdout.lock())?;
    Ok(())
}

/// Writes records as aligned columns, repeating the header row whenever the
/// field set changes between runs.
fn print_records<R: BufRead>(log: ThermoLog<R>, out: &mut impl Write) -> Result<()> {
    let mut current_fields: Vec<String> = Vec::new();
    for record in log {
        let record = record?;
        let fields: Vec<String> = record
            .entries
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        if fields != current_fields {
            current_fields = fields;
            writeln!(out, "{}", format_row(&record, true))?;
        }
        writeln!(out, "{}", format_row(&record, false))?;
    }
    Ok(())
}

fn format_row(record: &ThermoRecord, header: bool) -> String {
    record
        .entries
        .iter()
        .map(|(name, value)| {
            if header {
                format!("{:>14}", name)
            } else {
                format!("{:>14}", value)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const LOG_TEXT: &str = "\
Per MPI rank memory allocation (min/avg/max) = 2.9 | 2.9 | 2.9 Mbytes
Step Temp
0 1.44
1000 1.96
Loop time of 1.0 on 1 procs for 1000 steps with 900 atoms
Memory usage per processor = 2.9 Mbytes
Step Press
1000 0.017
Loop time of 1.0 on 1 procs for 1000 steps with 900 atoms
";

    #[test]
    fn the_header_row_is_repeated_when_the_fields_change() {
        let log = ThermoLog::new(Cursor::new(LOG_TEXT)).unwrap();
        let mut out = Vec::new();
        print_records(log, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        // Two 14-wide columns joined by one space.
        assert!(lines.iter().all(|line| line.len() == 29));
        let tokens = |n: usize| lines[n].split_whitespace().collect::<Vec<_>>();
        assert_eq!(tokens(0), ["Step", "Temp"]);
        assert_eq!(tokens(1), ["0", "1.44"]);
        assert_eq!(tokens(2), ["1000", "1.96"]);
        assert_eq!(tokens(3), ["Step", "Press"]);
        assert_eq!(tokens(4), ["1000", "0.017"]);
    }
}

use std::io::Write;

use tracing::info;

use lammkit::core::models::system::LammpsData;

use crate::cli::InfoArgs;
use crate::config::FileConfig;
use crate::error::Result;

pub fn run(args: InfoArgs, config: &FileConfig) -> Result<()> {
    let atom_style = config.atom_style(args.atom_style.as_deref())?;
    info!("reading {} as atom style {}", args.input.display(), atom_style);
    let data = LammpsData::read_from_path(&args.input, atom_style)?;

    let stdout = std::io::stdout();
    print_summary(&data, &mut stdout.lock())?;
    Ok(())
}

fn print_summary(data: &LammpsData, out: &mut impl Write) -> Result<()> {
    if let Some(header) = data.header.as_deref() {
        if !header.is_empty() {
            writeln!(out, "{}", header)?;
        }
    }
    writeln!(out, "{:<12} {}", "atom style", data.atom_style)?;
    writeln!(
        out,
        "{:<12} {} ({} types)",
        "atoms",
        data.atoms.len(),
        data.atom_types.len()
    )?;
    writeln!(
        out,
        "{:<12} {} ({} types)",
        "bonds",
        data.bonds.len(),
        data.bond_types.len()
    )?;
    writeln!(
        out,
        "{:<12} {} ({} types)",
        "angles",
        data.angles.len(),
        data.angle_types.len()
    )?;
    writeln!(
        out,
        "{:<12} {} ({} types)",
        "dihedrals",
        data.dihedrals.len(),
        data.dihedral_types.len()
    )?;
    writeln!(
        out,
        "{:<12} {} ({} types)",
        "impropers",
        data.impropers.len(),
        data.improper_types.len()
    )?;
    writeln!(out, "{:<12} {}", "pair coeffs", data.pair_types.len())?;

    let bounds = &data.bounds;
    writeln!(
        out,
        "{:<12} {} <= x <= {}, {} <= y <= {}, {} <= z <= {}",
        "box", bounds.x.0, bounds.x.1, bounds.y.0, bounds.y.1, bounds.z.0, bounds.z.1
    )?;
    if bounds.is_triclinic() {
        writeln!(
            out,
            "{:<12} xy {} xz {} yz {}",
            "tilt", bounds.tilt.x, bounds.tilt.y, bounds.tilt.z
        )?;
    }

    let with_velocities =
        !data.atoms.is_empty() && data.atoms.iter().flatten().all(|atom| atom.velocity.is_some());
    writeln!(
        out,
        "{:<12} {}",
        "velocities",
        if with_velocities { "yes" } else { "no" }
    )?;

    Ok(())
}

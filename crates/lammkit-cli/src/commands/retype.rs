use tracing::info;

use lammkit::core::models::system::LammpsData;

use crate::cli::RetypeArgs;
use crate::config::FileConfig;
use crate::error::Result;

pub fn run(args: RetypeArgs, config: &FileConfig) -> Result<()> {
    let atom_style = config.atom_style(args.atom_style.as_deref())?;
    let with_coeffs = config.coeffs(args.coeffs);

    info!("reading {} as atom style {}", args.input.display(), atom_style);
    let mut data = LammpsData::read_from_path(&args.input, atom_style)?;

    let before = type_counts(&data);
    data.reset_all_types(!args.ignore_atom_types)?;
    let after = type_counts(&data);
    info!(
        "types: atom {} -> {}, bond {} -> {}, angle {} -> {}, dihedral {} -> {}, improper {} -> {}",
        before[0], after[0], before[1], after[1], before[2], after[2], before[3], after[3],
        before[4], after[4]
    );

    if args.molecules {
        data.reset_molecule_ids()?;
        info!("renumbered molecule ids from bond connectivity");
    }

    data.write_to_path(&args.output, with_coeffs)?;
    info!("wrote {}", args.output.display());
    Ok(())
}

fn type_counts(data: &LammpsData) -> [usize; 5] {
    [
        data.atom_types.len(),
        data.bond_types.len(),
        data.angle_types.len(),
        data.dihedral_types.len(),
        data.improper_types.len(),
    ]
}

use std::fs;
use std::path::Path;

use tracing::info;

use lammkit::core::models::system::LammpsData;

use crate::cli::RewriteArgs;
use crate::config::FileConfig;
use crate::error::Result;

pub fn run(args: RewriteArgs, config: &FileConfig) -> Result<()> {
    let atom_style = config.atom_style(args.atom_style.as_deref())?;
    let with_coeffs = config.coeffs(args.coeffs);

    info!("reading {} as atom style {}", args.input.display(), atom_style);
    let mut data = LammpsData::read_from_path(&args.input, atom_style)?;

    if let Some(fragment) = &args.merge_coeffs {
        info!("merging coefficients from {}", fragment.display());
        merge_coeffs(&mut data, fragment)?;
    }

    data.write_to_path(&args.output, with_coeffs)?;
    info!("wrote {}", args.output.display());
    Ok(())
}

/// Applies every directive kind the fragment actually contains. Kinds that
/// are absent leave the corresponding type list untouched.
fn merge_coeffs(data: &mut LammpsData, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)?;
    let has = |keyword: &str| text.lines().any(|line| line.starts_with(keyword));

    if has("pair_coeff") {
        data.read_pair_coeffs_from(&mut text.as_bytes())?;
    }
    if has("bond_coeff") {
        data.read_bond_coeffs_from(&mut text.as_bytes())?;
    }
    if has("angle_coeff") {
        data.read_angle_coeffs_from(&mut text.as_bytes())?;
    }
    if has("dihedral_coeff") {
        data.read_dihedral_coeffs_from(&mut text.as_bytes())?;
    }
    if has("improper_coeff") {
        data.read_improper_coeffs_from(&mut text.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use lammkit::core::models::atom::{Atom, AtomStyle};
    use lammkit::core::models::types::{AtomType, BondType};
    use lammkit::core::models::topology::Bond;

    use super::*;

    fn create_store() -> LammpsData {
        let mut data = LammpsData::new(AtomStyle::Full);
        for _ in 0..2 {
            data.add_atom_type(AtomType {
                mass: Some(1.008),
                ..AtomType::default()
            });
        }
        for type_id in [1, 2] {
            data.add_atom(Atom {
                molecule_id: Some(1),
                type_id,
                charge: Some(0.0),
                ..Atom::default()
            })
            .unwrap();
        }
        data.add_bond_type(BondType {
            coeffs: Some(vec![450.0, 0.9572]),
            ..BondType::default()
        });
        data.add_bond(Bond {
            type_id: 1,
            atoms: [1, 2],
            ..Bond::default()
        })
        .unwrap();
        data
    }

    #[test]
    fn only_the_directive_kinds_present_in_the_fragment_are_applied() {
        let mut data = create_store();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "pair_coeff 1 1 0.155 3.166\n").unwrap();

        merge_coeffs(&mut data, file.path()).unwrap();

        assert_eq!(data.pair_types.len(), 1);
        // The bond type list survives because no bond_coeff line was seen.
        assert_eq!(data.bond_types.len(), 1);
        assert_eq!(
            data.bond_type(1).unwrap().coeffs,
            Some(vec![450.0, 0.9572])
        );
    }

    #[test]
    fn a_fragment_can_replace_several_kinds_at_once() {
        let mut data = create_store();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "pair_coeff * * 0.1 3.0\nbond_coeff 1 300.0 1.0\n"
        )
        .unwrap();

        merge_coeffs(&mut data, file.path()).unwrap();

        assert_eq!(data.pair_types.len(), 3);
        assert_eq!(data.bond_type(1).unwrap().coeffs, Some(vec![300.0, 1.0]));
    }
}

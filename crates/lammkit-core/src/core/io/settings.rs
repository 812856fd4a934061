use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use itertools::iproduct;
use thiserror::Error;
use tracing::info;

use super::data::{parse_float_coeffs, parse_mixed_coeffs, split_comment};
use crate::core::models::system::{dense, LammpsData, LookupError};
use crate::core::models::types::{
    AngleType, BondType, Coeff, DihedralType, ImproperType, PairType,
};

/// Errors that can occur while reading or writing coefficient fragments.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: SettingsParseErrorKind,
    },
    #[error("invalid reference on line {line}: {source}")]
    Reference {
        line: usize,
        #[source]
        source: LookupError,
    },
    #[error(transparent)]
    Store(#[from] LookupError),
    #[error("{0}")]
    Inconsistency(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsParseErrorKind {
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },
    #[error("invalid index range '{value}'")]
    InvalidRange { value: String },
}

/// Expands a LAMMPS type-id selector. A bare integer is itself; `a*b` is the
/// inclusive range from `a` to `b`, where a missing endpoint defaults to 1
/// on the left and `idmax` on the right.
pub(crate) fn expand_ids(text: &str, idmax: usize) -> Option<Vec<usize>> {
    match text.split_once('*') {
        Some((start, end)) => {
            let start = if start.is_empty() { 1 } else { start.parse().ok()? };
            let end = if end.is_empty() {
                idmax
            } else {
                end.parse().ok()?
            };
            Some((start..=end).collect())
        }
        None => Some(vec![text.parse().ok()?]),
    }
}

fn expand_field(
    fields: &[&str],
    index: usize,
    idmax: usize,
    line: usize,
) -> Result<Vec<usize>, SettingsError> {
    let value = fields.get(index).copied().ok_or(SettingsError::Parse {
        line,
        kind: SettingsParseErrorKind::MissingField {
            field: "type id range",
        },
    })?;
    expand_ids(value, idmax).ok_or_else(|| SettingsError::Parse {
        line,
        kind: SettingsParseErrorKind::InvalidRange {
            value: value.to_string(),
        },
    })
}

impl LammpsData {
    /// Reads `pair_coeff` directives, replacing the whole pair-type list.
    ///
    /// Index fields may use the range syntax handled by [`expand_ids`], with
    /// the current atom-type count as the open upper bound; a directive with
    /// two ranges produces their Cartesian product. Pairs are stored with
    /// their atom-type ids ordered `(lo, hi)`; exact duplicate entries keep
    /// only their last occurrence and the final list is sorted.
    pub fn read_pair_coeffs_from(&mut self, reader: &mut impl BufRead) -> Result<(), SettingsError> {
        let nb_atom_types = self.atom_types.len();
        self.pair_types = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = index + 1;
            if !line.starts_with("pair_coeff") {
                continue;
            }
            let (body, comment) = split_comment(&line);
            let fields: Vec<&str> = body.split_whitespace().collect();
            let ids_i = expand_field(&fields, 1, nb_atom_types, lineno)?;
            let ids_j = expand_field(&fields, 2, nb_atom_types, lineno)?;
            let (coeffs, style) = parse_float_coeffs(&fields[3..]);
            let comment = comment.map(str::to_string);

            for (i, j) in iproduct!(ids_i.iter().copied(), ids_j.iter().copied()) {
                let atom_types = if i <= j { (i, j) } else { (j, i) };
                self.add_pair_type(PairType {
                    atom_types,
                    coeffs: Some(coeffs.clone()),
                    style: style.clone(),
                    comment: comment.clone(),
                })
                .map_err(|source| SettingsError::Reference {
                    line: lineno,
                    source,
                })?;
            }
        }

        self.dedup_pair_types();
        self.sort_pair_types();
        Ok(())
    }

    pub fn read_pair_coeffs_from_path(&mut self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.read_pair_coeffs_from(&mut reader)
    }

    /// Reads `bond_coeff` directives, replacing the whole bond-type list.
    ///
    /// Every existing bond must still resolve to a type in the replacement
    /// list through its original type id; the list is then compacted.
    pub fn read_bond_coeffs_from(&mut self, reader: &mut impl BufRead) -> Result<(), SettingsError> {
        let nb_bond_types = self.bond_types.len();
        self.bond_types = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = index + 1;
            if !line.starts_with("bond_coeff") {
                continue;
            }
            let (body, comment) = split_comment(&line);
            let fields: Vec<&str> = body.split_whitespace().collect();
            let ids = expand_field(&fields, 1, nb_bond_types, lineno)?;
            let (coeffs, style) = parse_float_coeffs(&fields[2..]);
            let comment = comment.map(str::to_string);

            for id in ids {
                self.add_bond_type(BondType {
                    id,
                    coeffs: Some(coeffs.clone()),
                    style: style.clone(),
                    comment: comment.clone(),
                });
            }
        }

        for bond in self.bonds.iter().flatten() {
            if self.bond_type(bond.type_id).is_none() {
                return Err(LookupError::BondType(bond.type_id).into());
            }
        }
        self.bond_types.retain(Option::is_some);
        Ok(())
    }

    pub fn read_bond_coeffs_from_path(&mut self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.read_bond_coeffs_from(&mut reader)
    }

    /// Reads `angle_coeff` directives; same contract as the bond loader.
    pub fn read_angle_coeffs_from(&mut self, reader: &mut impl BufRead) -> Result<(), SettingsError> {
        let nb_angle_types = self.angle_types.len();
        self.angle_types = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = index + 1;
            if !line.starts_with("angle_coeff") {
                continue;
            }
            let (body, comment) = split_comment(&line);
            let fields: Vec<&str> = body.split_whitespace().collect();
            let ids = expand_field(&fields, 1, nb_angle_types, lineno)?;
            let (coeffs, style) = parse_float_coeffs(&fields[2..]);
            let comment = comment.map(str::to_string);

            for id in ids {
                self.add_angle_type(AngleType {
                    id,
                    coeffs: Some(coeffs.clone()),
                    style: style.clone(),
                    comment: comment.clone(),
                });
            }
        }

        for angle in self.angles.iter().flatten() {
            if self.angle_type(angle.type_id).is_none() {
                return Err(LookupError::AngleType(angle.type_id).into());
            }
        }
        self.angle_types.retain(Option::is_some);
        Ok(())
    }

    pub fn read_angle_coeffs_from_path(&mut self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.read_angle_coeffs_from(&mut reader)
    }

    /// Reads `dihedral_coeff` directives; same contract as the bond loader,
    /// with integer coefficient tokens kept as integers.
    pub fn read_dihedral_coeffs_from(
        &mut self,
        reader: &mut impl BufRead,
    ) -> Result<(), SettingsError> {
        let nb_dihedral_types = self.dihedral_types.len();
        self.dihedral_types = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = index + 1;
            if !line.starts_with("dihedral_coeff") {
                continue;
            }
            let (body, comment) = split_comment(&line);
            let fields: Vec<&str> = body.split_whitespace().collect();
            let ids = expand_field(&fields, 1, nb_dihedral_types, lineno)?;
            let (coeffs, style) = parse_mixed_coeffs(&fields[2..]);
            let comment = comment.map(str::to_string);

            for id in ids {
                self.add_dihedral_type(DihedralType {
                    id,
                    coeffs: Some(coeffs.clone()),
                    style: style.clone(),
                    comment: comment.clone(),
                });
            }
        }

        for dihedral in self.dihedrals.iter().flatten() {
            if self.dihedral_type(dihedral.type_id).is_none() {
                return Err(LookupError::DihedralType(dihedral.type_id).into());
            }
        }
        self.dihedral_types.retain(Option::is_some);
        Ok(())
    }

    pub fn read_dihedral_coeffs_from_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<(), SettingsError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.read_dihedral_coeffs_from(&mut reader)
    }

    /// Reads `improper_coeff` directives; same contract as the bond loader.
    pub fn read_improper_coeffs_from(
        &mut self,
        reader: &mut impl BufRead,
    ) -> Result<(), SettingsError> {
        let nb_improper_types = self.improper_types.len();
        self.improper_types = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = index + 1;
            if !line.starts_with("improper_coeff") {
                continue;
            }
            let (body, comment) = split_comment(&line);
            let fields: Vec<&str> = body.split_whitespace().collect();
            let ids = expand_field(&fields, 1, nb_improper_types, lineno)?;
            let (coeffs, style) = parse_float_coeffs(&fields[2..]);
            let comment = comment.map(str::to_string);

            for id in ids {
                self.add_improper_type(ImproperType {
                    id,
                    coeffs: Some(coeffs.clone()),
                    style: style.clone(),
                    comment: comment.clone(),
                });
            }
        }

        for improper in self.impropers.iter().flatten() {
            if self.improper_type(improper.type_id).is_none() {
                return Err(LookupError::ImproperType(improper.type_id).into());
            }
        }
        self.improper_types.retain(Option::is_some);
        Ok(())
    }

    pub fn read_improper_coeffs_from_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<(), SettingsError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.read_improper_coeffs_from(&mut reader)
    }

    /// Writes the pair types as `pair_coeff` directives.
    ///
    /// When the list mixes several styles, each row carries its style token;
    /// a type without a coefficient vector writes a `?` placeholder.
    pub fn write_pair_coeffs_to(&self, writer: &mut impl Write) -> Result<(), SettingsError> {
        if self.pair_types.is_empty() {
            info!("no pair types, nothing to write");
            return Ok(());
        }
        let styles: HashSet<Option<&str>> =
            self.pair_types.iter().map(|p| p.style.as_deref()).collect();
        for pair_type in &self.pair_types {
            let (i, j) = pair_type.atom_types;
            write!(writer, "pair_coeff {:4} {:4}", i, j)?;
            let coeffs = pair_type.coeffs.as_deref().map(to_mixed);
            write_row_tail(
                writer,
                "pair_coeff",
                (i, Some(j)),
                styles.len(),
                pair_type.style.as_deref(),
                coeffs.as_deref(),
                pair_type.comment.as_deref(),
            )?;
        }
        Ok(())
    }

    pub fn write_pair_coeffs_to_path(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        if self.pair_types.is_empty() {
            info!("no pair types, skipping {}", path.as_ref().display());
            return Ok(());
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_pair_coeffs_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the bond types as `bond_coeff` directives.
    pub fn write_bond_coeffs_to(&self, writer: &mut impl Write) -> Result<(), SettingsError> {
        let bond_types = dense(&self.bond_types, "bond types")?;
        if bond_types.is_empty() {
            info!("no bond types, nothing to write");
            return Ok(());
        }
        let styles: HashSet<Option<&str>> =
            bond_types.iter().map(|t| t.style.as_deref()).collect();
        for bond_type in &bond_types {
            write!(writer, "bond_coeff {:4}", bond_type.id)?;
            let coeffs = bond_type.coeffs.as_deref().map(to_mixed);
            write_row_tail(
                writer,
                "bond_coeff",
                (bond_type.id, None),
                styles.len(),
                bond_type.style.as_deref(),
                coeffs.as_deref(),
                bond_type.comment.as_deref(),
            )?;
        }
        Ok(())
    }

    pub fn write_bond_coeffs_to_path(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        if self.bond_types.is_empty() {
            info!("no bond types, skipping {}", path.as_ref().display());
            return Ok(());
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_bond_coeffs_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the angle types as `angle_coeff` directives.
    pub fn write_angle_coeffs_to(&self, writer: &mut impl Write) -> Result<(), SettingsError> {
        let angle_types = dense(&self.angle_types, "angle types")?;
        if angle_types.is_empty() {
            info!("no angle types, nothing to write");
            return Ok(());
        }
        let styles: HashSet<Option<&str>> =
            angle_types.iter().map(|t| t.style.as_deref()).collect();
        for angle_type in &angle_types {
            write!(writer, "angle_coeff {:4}", angle_type.id)?;
            let coeffs = angle_type.coeffs.as_deref().map(to_mixed);
            write_row_tail(
                writer,
                "angle_coeff",
                (angle_type.id, None),
                styles.len(),
                angle_type.style.as_deref(),
                coeffs.as_deref(),
                angle_type.comment.as_deref(),
            )?;
        }
        Ok(())
    }

    pub fn write_angle_coeffs_to_path(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        if self.angle_types.is_empty() {
            info!("no angle types, skipping {}", path.as_ref().display());
            return Ok(());
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_angle_coeffs_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the dihedral types as `dihedral_coeff` directives, keeping
    /// integer coefficients in their integer form.
    pub fn write_dihedral_coeffs_to(&self, writer: &mut impl Write) -> Result<(), SettingsError> {
        let dihedral_types = dense(&self.dihedral_types, "dihedral types")?;
        if dihedral_types.is_empty() {
            info!("no dihedral types, nothing to write");
            return Ok(());
        }
        let styles: HashSet<Option<&str>> =
            dihedral_types.iter().map(|t| t.style.as_deref()).collect();
        for dihedral_type in &dihedral_types {
            write!(writer, "dihedral_coeff {:4}", dihedral_type.id)?;
            write_row_tail(
                writer,
                "dihedral_coeff",
                (dihedral_type.id, None),
                styles.len(),
                dihedral_type.style.as_deref(),
                dihedral_type.coeffs.as_deref(),
                dihedral_type.comment.as_deref(),
            )?;
        }
        Ok(())
    }

    pub fn write_dihedral_coeffs_to_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<(), SettingsError> {
        if self.dihedral_types.is_empty() {
            info!("no dihedral types, skipping {}", path.as_ref().display());
            return Ok(());
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_dihedral_coeffs_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the improper types as `improper_coeff` directives.
    pub fn write_improper_coeffs_to(&self, writer: &mut impl Write) -> Result<(), SettingsError> {
        let improper_types = dense(&self.improper_types, "improper types")?;
        if improper_types.is_empty() {
            info!("no improper types, nothing to write");
            return Ok(());
        }
        let styles: HashSet<Option<&str>> =
            improper_types.iter().map(|t| t.style.as_deref()).collect();
        for improper_type in &improper_types {
            write!(writer, "improper_coeff {:4}", improper_type.id)?;
            let coeffs = improper_type.coeffs.as_deref().map(to_mixed);
            write_row_tail(
                writer,
                "improper_coeff",
                (improper_type.id, None),
                styles.len(),
                improper_type.style.as_deref(),
                coeffs.as_deref(),
                improper_type.comment.as_deref(),
            )?;
        }
        Ok(())
    }

    pub fn write_improper_coeffs_to_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<(), SettingsError> {
        if self.improper_types.is_empty() {
            info!("no improper types, skipping {}", path.as_ref().display());
            return Ok(());
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_improper_coeffs_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn to_mixed(values: &[f64]) -> Vec<Coeff> {
    values.iter().map(|v| Coeff::Float(*v)).collect()
}

fn write_row_tail(
    writer: &mut impl Write,
    keyword: &'static str,
    ids: (usize, Option<usize>),
    style_count: usize,
    style: Option<&str>,
    coeffs: Option<&[Coeff]>,
    comment: Option<&str>,
) -> Result<(), SettingsError> {
    if style_count > 1 {
        let style = style.ok_or_else(|| {
            let label = match ids.1 {
                Some(j) => format!("{} {} {}", keyword, ids.0, j),
                None => format!("{} {}", keyword, ids.0),
            };
            SettingsError::Inconsistency(format!(
                "{} has no style in a mixed-style listing",
                label
            ))
        })?;
        write!(writer, " {:<7}", style)?;
    }
    match coeffs {
        Some(coeffs) => {
            for coeff in coeffs {
                match coeff {
                    Coeff::Int(value) => write!(writer, " {:9}", value)?,
                    Coeff::Float(value) => write!(writer, " {:9.4}", value)?,
                }
            }
        }
        None => write!(writer, " ?")?,
    }
    match comment {
        Some(comment) => writeln!(writer, " # {}", comment)?,
        None => writeln!(writer)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{Atom, AtomStyle};
    use crate::core::models::topology::Bond;
    use crate::core::models::types::AtomType;

    fn create_bonded_store() -> LammpsData {
        let mut data = LammpsData::new(AtomStyle::Full);
        data.add_atom_type(AtomType {
            mass: Some(12.011),
            ..Default::default()
        });
        data.add_atom_type(AtomType {
            mass: Some(1.008),
            ..Default::default()
        });
        for type_id in [1, 2, 2] {
            data.add_atom(Atom {
                molecule_id: Some(1),
                type_id,
                charge: Some(0.0),
                ..Default::default()
            })
            .unwrap();
        }
        data.add_bond_type(BondType {
            coeffs: Some(vec![100.0]),
            ..Default::default()
        });
        data.add_bond_type(BondType {
            coeffs: Some(vec![200.0]),
            ..Default::default()
        });
        data.add_bond(Bond {
            type_id: 1,
            atoms: [1, 2],
            ..Default::default()
        })
        .unwrap();
        data.add_bond(Bond {
            type_id: 2,
            atoms: [1, 3],
            ..Default::default()
        })
        .unwrap();
        data
    }

    mod range_expansion {
        use super::*;

        #[test]
        fn covers_the_selector_grammar() {
            assert_eq!(expand_ids("3", 5), Some(vec![3]));
            assert_eq!(expand_ids("2*4", 5), Some(vec![2, 3, 4]));
            assert_eq!(expand_ids("*3", 5), Some(vec![1, 2, 3]));
            assert_eq!(expand_ids("4*", 5), Some(vec![4, 5]));
            assert_eq!(expand_ids("*", 3), Some(vec![1, 2, 3]));
            assert_eq!(expand_ids("x", 5), None);
        }

        #[test]
        fn inverted_range_is_empty() {
            assert_eq!(expand_ids("4*2", 5), Some(vec![]));
        }
    }

    mod reading {
        use super::*;

        #[test]
        fn pair_directives_replace_order_and_sort() {
            let mut data = create_bonded_store();
            let text = "\
pair_style lj/cut/coul/long 10.0
pair_coeff 2 2 0.0000 0.0000 # HW HW
pair_coeff 1 1 0.1553 3.1660 # OW OW
pair_coeff 2 1 0.0500 1.7753
";
            data.read_pair_coeffs_from(&mut text.as_bytes()).unwrap();

            let pairs: Vec<(usize, usize)> =
                data.pair_types.iter().map(|p| p.atom_types).collect();
            assert_eq!(pairs, vec![(1, 1), (1, 2), (2, 2)]);
            assert_eq!(data.pair_types[0].coeffs, Some(vec![0.1553, 3.166]));
            assert_eq!(data.pair_types[0].comment.as_deref(), Some("OW OW"));
            assert_eq!(data.pair_types[1].coeffs, Some(vec![0.05, 1.7753]));
            assert_eq!(data.pair_types[1].comment, None);
        }

        #[test]
        fn wildcards_expand_over_the_atom_types() {
            let mut data = create_bonded_store();
            let text = "pair_coeff * * lj/cut 0.0000 0.0000\n";
            data.read_pair_coeffs_from(&mut text.as_bytes()).unwrap();

            let pairs: Vec<(usize, usize)> =
                data.pair_types.iter().map(|p| p.atom_types).collect();
            assert_eq!(pairs, vec![(1, 1), (1, 2), (2, 2)]);
            for pair_type in &data.pair_types {
                assert_eq!(pair_type.style.as_deref(), Some("lj/cut"));
                assert_eq!(pair_type.coeffs, Some(vec![0.0, 0.0]));
            }
        }

        #[test]
        fn identical_duplicate_directives_collapse() {
            let mut data = create_bonded_store();
            let text = "\
pair_coeff 1 2 0.0500 1.7753
pair_coeff 1 2 0.0500 1.7753
";
            data.read_pair_coeffs_from(&mut text.as_bytes()).unwrap();

            assert_eq!(data.pair_types.len(), 1);
            assert_eq!(data.pair_types[0].atom_types, (1, 2));
        }

        #[test]
        fn pair_directive_outside_the_type_list_is_rejected() {
            let mut data = create_bonded_store();
            let text = "pair_coeff 7 7 0.0 0.0\n";
            let err = data.read_pair_coeffs_from(&mut text.as_bytes()).unwrap_err();

            assert!(matches!(
                err,
                SettingsError::Reference {
                    line: 1,
                    source: LookupError::AtomType(7),
                }
            ));
        }

        #[test]
        fn bond_directives_replace_the_type_list() {
            let mut data = create_bonded_store();
            let text = "\
bond_coeff 1 harmonic 300.0000 1.1000
bond_coeff 2 harmonic 350.0000 1.5000 # CT HT
";
            data.read_bond_coeffs_from(&mut text.as_bytes()).unwrap();

            assert_eq!(data.bond_types.len(), 2);
            let first = data.bond_type(1).unwrap();
            assert_eq!(first.coeffs, Some(vec![300.0, 1.1]));
            assert_eq!(first.style.as_deref(), Some("harmonic"));
            let second = data.bond_type(2).unwrap();
            assert_eq!(second.comment.as_deref(), Some("CT HT"));
        }

        #[test]
        fn bond_wildcard_uses_the_previous_list_length() {
            let mut data = create_bonded_store();
            let text = "bond_coeff * harmonic 300.0000 1.1000\n";
            data.read_bond_coeffs_from(&mut text.as_bytes()).unwrap();

            assert_eq!(data.bond_types.len(), 2);
            assert_eq!(data.bond_type(2).unwrap().coeffs, Some(vec![300.0, 1.1]));
        }

        #[test]
        fn bond_still_referencing_a_missing_type_is_rejected() {
            let mut data = create_bonded_store();
            let text = "bond_coeff 1 harmonic 300.0000 1.1000\n";
            let err = data.read_bond_coeffs_from(&mut text.as_bytes()).unwrap_err();

            assert!(matches!(
                err,
                SettingsError::Store(LookupError::BondType(2))
            ));
        }

        #[test]
        fn holes_left_by_sparse_directives_are_compacted() {
            let mut data = create_bonded_store();
            if let Some(bond) = data.bonds[1].as_mut() {
                bond.type_id = 1;
            }
            let text = "\
bond_coeff 1 harmonic 300.0000 1.1000
bond_coeff 3 harmonic 350.0000 1.5000
";
            data.read_bond_coeffs_from(&mut text.as_bytes()).unwrap();

            let ids: Vec<usize> = data
                .bond_types
                .iter()
                .map(|t| t.as_ref().unwrap().id)
                .collect();
            assert_eq!(ids, vec![1, 3]);
        }

        #[test]
        fn dihedral_directives_keep_integer_coefficients() {
            let mut data = create_bonded_store();
            let text = "dihedral_coeff 1 80.0000 1 3\n";
            data.read_dihedral_coeffs_from(&mut text.as_bytes()).unwrap();

            let coeffs = data.dihedral_type(1).unwrap().coeffs.clone().unwrap();
            assert!(matches!(coeffs[0], Coeff::Float(v) if v == 80.0));
            assert!(matches!(coeffs[1], Coeff::Int(1)));
            assert!(matches!(coeffs[2], Coeff::Int(3)));
        }

        #[test]
        fn question_mark_placeholders_are_skipped() {
            let mut data = create_bonded_store();
            let text = "angle_coeff 1 ? 300.0000\n";
            data.read_angle_coeffs_from(&mut text.as_bytes()).unwrap();

            let angle_type = data.angle_type(1).unwrap();
            assert_eq!(angle_type.coeffs, Some(vec![300.0]));
            assert_eq!(angle_type.style, None);
        }
    }

    mod writing {
        use super::*;

        #[test]
        fn pair_rows_follow_the_directive_layout() {
            let mut data = create_bonded_store();
            data.add_pair_type(PairType {
                atom_types: (1, 1),
                coeffs: Some(vec![0.1553, 3.166]),
                comment: Some("OW OW".to_string()),
                ..Default::default()
            })
            .unwrap();
            data.add_pair_type(PairType {
                atom_types: (1, 2),
                ..Default::default()
            })
            .unwrap();

            let mut out = Vec::new();
            data.write_pair_coeffs_to(&mut out).unwrap();
            let text = String::from_utf8(out).unwrap();

            assert_eq!(
                text,
                "pair_coeff    1    1    0.1553    3.1660 # OW OW\npair_coeff    1    2 ?\n"
            );
        }

        #[test]
        fn mixed_styles_write_the_style_column() {
            let mut data = create_bonded_store();
            data.bond_types.clear();
            data.add_bond_type(BondType {
                coeffs: Some(vec![300.0]),
                style: Some("harmonic".to_string()),
                ..Default::default()
            });
            data.add_bond_type(BondType {
                coeffs: Some(vec![50.0, 2.0, 1.2]),
                style: Some("morse".to_string()),
                ..Default::default()
            });

            let mut out = Vec::new();
            data.write_bond_coeffs_to(&mut out).unwrap();
            let text = String::from_utf8(out).unwrap();

            assert_eq!(
                text,
                "bond_coeff    1 harmonic  300.0000\nbond_coeff    2 morse     50.0000    2.0000    1.2000\n"
            );
        }

        #[test]
        fn missing_style_in_a_mixed_listing_is_rejected() {
            let mut data = create_bonded_store();
            data.bond_types.clear();
            data.add_bond_type(BondType {
                coeffs: Some(vec![300.0]),
                style: Some("harmonic".to_string()),
                ..Default::default()
            });
            data.add_bond_type(BondType {
                coeffs: Some(vec![200.0]),
                ..Default::default()
            });

            let mut out = Vec::new();
            let err = data.write_bond_coeffs_to(&mut out).unwrap_err();
            assert!(matches!(err, SettingsError::Inconsistency(ref message)
                if message.contains("bond_coeff 2")));
        }

        #[test]
        fn empty_list_writes_nothing() {
            let data = create_bonded_store();
            let mut out = Vec::new();
            data.write_pair_coeffs_to(&mut out).unwrap();
            assert!(out.is_empty());
        }

        #[test]
        fn empty_list_creates_no_file() {
            let data = create_bonded_store();
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("pair.coeffs");

            data.write_pair_coeffs_to_path(&path).unwrap();
            assert!(!path.exists());
        }

        #[test]
        fn dihedral_settings_round_trip_keeps_integers() {
            let mut data = create_bonded_store();
            data.add_dihedral_type(DihedralType {
                coeffs: Some(vec![Coeff::Float(80.0), Coeff::Int(1), Coeff::Int(3)]),
                ..Default::default()
            });

            let mut out = Vec::new();
            data.write_dihedral_coeffs_to(&mut out).unwrap();
            let text = String::from_utf8(out).unwrap();
            assert_eq!(text, "dihedral_coeff    1   80.0000         1         3\n");

            let mut reread = create_bonded_store();
            reread
                .read_dihedral_coeffs_from(&mut text.as_bytes())
                .unwrap();
            assert_eq!(
                reread.dihedral_type(1).unwrap().coeffs,
                data.dihedral_type(1).unwrap().coeffs
            );
        }
    }
}

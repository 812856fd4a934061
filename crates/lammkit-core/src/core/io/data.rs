use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use phf::phf_map;
use thiserror::Error;

use crate::core::models::atom::{Atom, AtomStyle};
use crate::core::models::system::{dense, LammpsData, LookupError};
use crate::core::models::topology::{Angle, Bond, Dihedral, Improper};
use crate::core::models::types::{
    AngleType, AtomType, BondType, Coeff, DihedralType, ImproperType, PairType,
};

/// Errors that can occur while reading or writing a LAMMPS data file.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error on line {line}: {kind}")]
    Parse { line: usize, kind: DataParseErrorKind },
    #[error("invalid reference on line {line}: {source}")]
    Reference {
        line: usize,
        #[source]
        source: LookupError,
    },
    #[error("number of {kind} is not coherent (declared {declared}, found {found})")]
    CountMismatch {
        kind: &'static str,
        declared: usize,
        found: usize,
    },
    #[error(transparent)]
    Store(#[from] LookupError),
    #[error("{0}")]
    Inconsistency(String),
}

/// Specific kinds of per-line parsing failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataParseErrorKind {
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },
    #[error("invalid integer '{value}' for field '{field}'")]
    InvalidInt {
        field: &'static str,
        value: String,
    },
    #[error("invalid number '{value}' for field '{field}'")]
    InvalidFloat {
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Masses,
    PairCoeffs,
    PairIjCoeffs,
    BondCoeffs,
    AngleCoeffs,
    DihedralCoeffs,
    ImproperCoeffs,
    Atoms,
    Velocities,
    Bonds,
    Angles,
    Dihedrals,
    Impropers,
}

static SECTION_KEYWORDS: phf::Map<&'static str, Section> = phf_map! {
    "Masses" => Section::Masses,
    "Pair Coeffs" => Section::PairCoeffs,
    "PairIJ Coeffs" => Section::PairIjCoeffs,
    "Bond Coeffs" => Section::BondCoeffs,
    "Angle Coeffs" => Section::AngleCoeffs,
    "Dihedral Coeffs" => Section::DihedralCoeffs,
    "Improper Coeffs" => Section::ImproperCoeffs,
    "Atoms" => Section::Atoms,
    "Velocities" => Section::Velocities,
    "Bonds" => Section::Bonds,
    "Angles" => Section::Angles,
    "Dihedrals" => Section::Dihedrals,
    "Impropers" => Section::Impropers,
};

/// Counts declared in the header, checked against the parsed lists at the end.
#[derive(Debug, Default)]
struct DeclaredCounts {
    atoms: usize,
    bonds: usize,
    angles: usize,
    dihedrals: usize,
    impropers: usize,
    atom_types: usize,
    bond_types: usize,
    angle_types: usize,
    dihedral_types: usize,
    improper_types: usize,
}

impl LammpsData {
    /// Reads a data file, interpreting the `Atoms` section with the given
    /// atom style.
    ///
    /// Every entity and force-field type in the file is loaded, sparse index
    /// lists are compacted, pair types are sorted, and the resulting list
    /// lengths are checked against the counts declared in the header.
    pub fn read_from(
        reader: &mut impl BufRead,
        atom_style: AtomStyle,
    ) -> Result<Self, DataError> {
        let mut data = Self::new(atom_style);
        let mut declared = DeclaredCounts::default();
        let mut section = Section::Header;

        let mut lines = reader.lines();
        data.header = Some(match lines.next() {
            Some(line) => line?.trim().to_string(),
            None => String::new(),
        });

        for (index, line) in lines.enumerate() {
            let line = line?;
            // The title line was line 1.
            let lineno = index + 2;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (body, comment) = split_comment(trimmed);
            if let Some(next) = SECTION_KEYWORDS.get(body) {
                section = *next;
                continue;
            }
            let fields: Vec<&str> = body.split_whitespace().collect();
            let comment = comment.map(str::to_string);

            match section {
                Section::Header => {
                    parse_header_line(&mut data, &mut declared, body, &fields, lineno)?;
                }
                Section::Masses => {
                    let id = int_field(&fields, 0, "atom type id", lineno)?;
                    let mass = float_field(&fields, 1, "mass", lineno)?;
                    data.add_atom_type(AtomType {
                        id,
                        mass: Some(mass),
                        comment,
                    });
                }
                Section::PairCoeffs => {
                    let id = int_field(&fields, 0, "atom type id", lineno)?;
                    let (coeffs, style) = parse_float_coeffs(&fields[1..]);
                    data.add_pair_type(PairType {
                        atom_types: (id, id),
                        coeffs: Some(coeffs),
                        style,
                        comment,
                    })
                    .map_err(|source| DataError::Reference { line: lineno, source })?;
                }
                Section::PairIjCoeffs => {
                    let i = int_field(&fields, 0, "first atom type id", lineno)?;
                    let j = int_field(&fields, 1, "second atom type id", lineno)?;
                    let (coeffs, style) = parse_float_coeffs(&fields[2..]);
                    data.add_pair_type(PairType {
                        atom_types: (i, j),
                        coeffs: Some(coeffs),
                        style,
                        comment,
                    })
                    .map_err(|source| DataError::Reference { line: lineno, source })?;
                }
                Section::BondCoeffs => {
                    let id = int_field(&fields, 0, "bond type id", lineno)?;
                    let (coeffs, style) = parse_float_coeffs(&fields[1..]);
                    data.add_bond_type(BondType {
                        id,
                        coeffs: Some(coeffs),
                        style,
                        comment,
                    });
                }
                Section::AngleCoeffs => {
                    let id = int_field(&fields, 0, "angle type id", lineno)?;
                    let (coeffs, style) = parse_float_coeffs(&fields[1..]);
                    data.add_angle_type(AngleType {
                        id,
                        coeffs: Some(coeffs),
                        style,
                        comment,
                    });
                }
                Section::DihedralCoeffs => {
                    let id = int_field(&fields, 0, "dihedral type id", lineno)?;
                    let (coeffs, style) = parse_mixed_coeffs(&fields[1..]);
                    data.add_dihedral_type(DihedralType {
                        id,
                        coeffs: Some(coeffs),
                        style,
                        comment,
                    });
                }
                Section::ImproperCoeffs => {
                    let id = int_field(&fields, 0, "improper type id", lineno)?;
                    let (coeffs, style) = parse_float_coeffs(&fields[1..]);
                    data.add_improper_type(ImproperType {
                        id,
                        coeffs: Some(coeffs),
                        style,
                        comment,
                    });
                }
                Section::Atoms => {
                    let id = int_field(&fields, 0, "atom id", lineno)?;
                    let molecule_id = signed_field(&fields, 1, "molecule id", lineno)?;
                    let type_id = int_field(&fields, 2, "atom type id", lineno)?;
                    let mut column = 3;
                    let charge = if data.atom_style.has_charge() {
                        let value = float_field(&fields, column, "charge", lineno)?;
                        column += 1;
                        Some(value)
                    } else {
                        None
                    };
                    let x = float_field(&fields, column, "x", lineno)?;
                    let y = float_field(&fields, column + 1, "y", lineno)?;
                    let z = float_field(&fields, column + 2, "z", lineno)?;
                    let image = parse_image(&fields, column + 3);
                    if data.atom_type(type_id).is_none() {
                        data.add_atom_type(AtomType {
                            id: type_id,
                            ..Default::default()
                        });
                    }
                    data.add_atom(Atom {
                        id,
                        molecule_id: Some(molecule_id),
                        type_id,
                        charge,
                        position: Point3::new(x, y, z),
                        image,
                        velocity: None,
                        comment,
                    })
                    .map_err(|source| DataError::Reference { line: lineno, source })?;
                }
                Section::Velocities => {
                    let id = int_field(&fields, 0, "atom id", lineno)?;
                    let vx = float_field(&fields, 1, "vx", lineno)?;
                    let vy = float_field(&fields, 2, "vy", lineno)?;
                    let vz = float_field(&fields, 3, "vz", lineno)?;
                    match data.atom_mut(id) {
                        Some(atom) => atom.velocity = Some(Vector3::new(vx, vy, vz)),
                        None => {
                            return Err(DataError::Reference {
                                line: lineno,
                                source: LookupError::Atom(id),
                            });
                        }
                    }
                }
                Section::Bonds => {
                    let id = int_field(&fields, 0, "bond id", lineno)?;
                    let type_id = int_field(&fields, 1, "bond type id", lineno)?;
                    let a = int_field(&fields, 2, "first atom id", lineno)?;
                    let b = int_field(&fields, 3, "second atom id", lineno)?;
                    if data.bond_type(type_id).is_none() {
                        data.add_bond_type(BondType {
                            id: type_id,
                            ..Default::default()
                        });
                    }
                    data.add_bond(Bond {
                        id,
                        type_id,
                        atoms: [a, b],
                        comment,
                    })
                    .map_err(|source| DataError::Reference { line: lineno, source })?;
                }
                Section::Angles => {
                    let id = int_field(&fields, 0, "angle id", lineno)?;
                    let type_id = int_field(&fields, 1, "angle type id", lineno)?;
                    let a = int_field(&fields, 2, "first atom id", lineno)?;
                    let b = int_field(&fields, 3, "second atom id", lineno)?;
                    let c = int_field(&fields, 4, "third atom id", lineno)?;
                    if data.angle_type(type_id).is_none() {
                        data.add_angle_type(AngleType {
                            id: type_id,
                            ..Default::default()
                        });
                    }
                    data.add_angle(Angle {
                        id,
                        type_id,
                        atoms: [a, b, c],
                        comment,
                    })
                    .map_err(|source| DataError::Reference { line: lineno, source })?;
                }
                Section::Dihedrals => {
                    let id = int_field(&fields, 0, "dihedral id", lineno)?;
                    let type_id = int_field(&fields, 1, "dihedral type id", lineno)?;
                    let a = int_field(&fields, 2, "first atom id", lineno)?;
                    let b = int_field(&fields, 3, "second atom id", lineno)?;
                    let c = int_field(&fields, 4, "third atom id", lineno)?;
                    let d = int_field(&fields, 5, "fourth atom id", lineno)?;
                    if data.dihedral_type(type_id).is_none() {
                        data.add_dihedral_type(DihedralType {
                            id: type_id,
                            ..Default::default()
                        });
                    }
                    data.add_dihedral(Dihedral {
                        id,
                        type_id,
                        atoms: [a, b, c, d],
                        comment,
                    })
                    .map_err(|source| DataError::Reference { line: lineno, source })?;
                }
                Section::Impropers => {
                    let id = int_field(&fields, 0, "improper id", lineno)?;
                    let type_id = int_field(&fields, 1, "improper type id", lineno)?;
                    let a = int_field(&fields, 2, "first atom id", lineno)?;
                    let b = int_field(&fields, 3, "second atom id", lineno)?;
                    let c = int_field(&fields, 4, "third atom id", lineno)?;
                    let d = int_field(&fields, 5, "fourth atom id", lineno)?;
                    if data.improper_type(type_id).is_none() {
                        data.add_improper_type(ImproperType {
                            id: type_id,
                            ..Default::default()
                        });
                    }
                    data.add_improper(Improper {
                        id,
                        type_id,
                        atoms: [a, b, c, d],
                        comment,
                    })
                    .map_err(|source| DataError::Reference { line: lineno, source })?;
                }
            }
        }

        data.remove_holes();
        data.sort_pair_types();

        check_count("atoms", declared.atoms, data.atoms.len())?;
        check_count("atom types", declared.atom_types, data.atom_types.len())?;
        check_count("bonds", declared.bonds, data.bonds.len())?;
        check_count("bond types", declared.bond_types, data.bond_types.len())?;
        check_count("angles", declared.angles, data.angles.len())?;
        check_count("angle types", declared.angle_types, data.angle_types.len())?;
        check_count("dihedrals", declared.dihedrals, data.dihedrals.len())?;
        check_count(
            "dihedral types",
            declared.dihedral_types,
            data.dihedral_types.len(),
        )?;
        check_count("impropers", declared.impropers, data.impropers.len())?;
        check_count(
            "improper types",
            declared.improper_types,
            data.improper_types.len(),
        )?;

        Ok(data)
    }

    pub fn read_from_path(
        path: impl AsRef<Path>,
        atom_style: AtomStyle,
    ) -> Result<Self, DataError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, atom_style)
    }

    /// Writes the system back out in data-file format.
    ///
    /// With `with_coeffs` set, the force-field coefficient sections are
    /// emitted between `Masses` and `Atoms`; otherwise only masses, entities,
    /// and velocities are written. Every sparse list must be free of holes,
    /// every atom type needs a mass, and every atom needs a molecule id (plus
    /// a charge under a charged atom style).
    pub fn write_to(&self, writer: &mut impl Write, with_coeffs: bool) -> Result<(), DataError> {
        let atom_types = dense(&self.atom_types, "atom types")?;
        let bond_types = dense(&self.bond_types, "bond types")?;
        let angle_types = dense(&self.angle_types, "angle types")?;
        let dihedral_types = dense(&self.dihedral_types, "dihedral types")?;
        let improper_types = dense(&self.improper_types, "improper types")?;
        let atoms = dense(&self.atoms, "atoms")?;
        let bonds = dense(&self.bonds, "bonds")?;
        let angles = dense(&self.angles, "angles")?;
        let dihedrals = dense(&self.dihedrals, "dihedrals")?;
        let impropers = dense(&self.impropers, "impropers")?;

        writeln!(writer, "{}", self.header.as_deref().unwrap_or(""))?;
        writeln!(writer)?;

        writeln!(writer, "{} atoms", atoms.len())?;
        if !bonds.is_empty() {
            writeln!(writer, "{} bonds", bonds.len())?;
        }
        if !angles.is_empty() {
            writeln!(writer, "{} angles", angles.len())?;
        }
        if !dihedrals.is_empty() {
            writeln!(writer, "{} dihedrals", dihedrals.len())?;
        }
        if !impropers.is_empty() {
            writeln!(writer, "{} impropers", impropers.len())?;
        }
        writeln!(writer)?;

        writeln!(writer, "{} atom types", atom_types.len())?;
        if !bond_types.is_empty() {
            writeln!(writer, "{} bond types", bond_types.len())?;
        }
        if !angle_types.is_empty() {
            writeln!(writer, "{} angle types", angle_types.len())?;
        }
        if !dihedral_types.is_empty() {
            writeln!(writer, "{} dihedral types", dihedral_types.len())?;
        }
        if !improper_types.is_empty() {
            writeln!(writer, "{} improper types", improper_types.len())?;
        }
        writeln!(writer)?;

        writeln!(
            writer,
            "{:.6} {:.6} xlo xhi",
            self.bounds.x.0, self.bounds.x.1
        )?;
        writeln!(
            writer,
            "{:.6} {:.6} ylo yhi",
            self.bounds.y.0, self.bounds.y.1
        )?;
        writeln!(
            writer,
            "{:.6} {:.6} zlo zhi",
            self.bounds.z.0, self.bounds.z.1
        )?;
        if self.bounds.is_triclinic() {
            let tilt = &self.bounds.tilt;
            writeln!(
                writer,
                "{:.6} {:.6} {:.6} xy xz yz",
                tilt.x, tilt.y, tilt.z
            )?;
        }
        writeln!(writer)?;

        if !atom_types.is_empty() {
            writeln!(writer, "Masses")?;
            writeln!(writer)?;
            for atom_type in &atom_types {
                let mass = atom_type.mass.ok_or_else(|| {
                    DataError::Inconsistency(format!("atom type {} has no mass", atom_type.id))
                })?;
                write!(writer, "{:4} {:9.6}", atom_type.id, mass)?;
                finish_line(writer, atom_type.comment.as_deref())?;
            }
            writeln!(writer)?;
        }

        if with_coeffs {
            self.write_pair_tables(writer)?;
            write_coeff_table(writer, "Bond Coeffs", float_coeff_lines(&bond_types))?;
            write_coeff_table(writer, "Angle Coeffs", float_coeff_lines(&angle_types))?;
            write_coeff_table(
                writer,
                "Dihedral Coeffs",
                dihedral_types
                    .iter()
                    .map(|t| CoeffLine {
                        id: t.id,
                        style: t.style.as_deref(),
                        coeffs: t.coeffs.clone(),
                        comment: t.comment.as_deref(),
                    })
                    .collect(),
            )?;
            write_coeff_table(writer, "Improper Coeffs", float_coeff_lines(&improper_types))?;
        }

        if !atoms.is_empty() {
            writeln!(writer, "Atoms # {}", self.atom_style)?;
            writeln!(writer)?;
            for atom in &atoms {
                let molecule_id = atom.molecule_id.ok_or_else(|| {
                    DataError::Inconsistency(format!("atom {} has no molecule id", atom.id))
                })?;
                write!(writer, "{:7} {:7} {:7}", atom.id, molecule_id, atom.type_id)?;
                if self.atom_style.has_charge() {
                    let charge = atom.charge.ok_or_else(|| {
                        DataError::Inconsistency(format!("atom {} has no charge", atom.id))
                    })?;
                    write!(writer, " {:9.6}", charge)?;
                }
                write!(
                    writer,
                    " {} {} {}",
                    fmt_sci(atom.position.x),
                    fmt_sci(atom.position.y),
                    fmt_sci(atom.position.z)
                )?;
                if let Some(image) = &atom.image {
                    write!(writer, " {} {} {}", image.x, image.y, image.z)?;
                }
                finish_line(writer, atom.comment.as_deref())?;
            }
            writeln!(writer)?;
        }

        // The section is only written when every atom carries a velocity.
        let velocities: Option<Vec<_>> = atoms
            .iter()
            .map(|atom| {
                atom.velocity
                    .map(|v| (atom.id, v, atom.comment.as_deref()))
            })
            .collect();
        if let Some(rows) = velocities {
            if !rows.is_empty() {
                writeln!(writer, "Velocities")?;
                writeln!(writer)?;
                for (id, velocity, comment) in rows {
                    write!(
                        writer,
                        "{:7} {} {} {}",
                        id,
                        fmt_sci(velocity.x),
                        fmt_sci(velocity.y),
                        fmt_sci(velocity.z)
                    )?;
                    finish_line(writer, comment)?;
                }
                writeln!(writer)?;
            }
        }

        write_entity_section(
            writer,
            "Bonds",
            &bonds
                .iter()
                .map(|b| (b.id, b.type_id, &b.atoms[..], b.comment.as_deref()))
                .collect::<Vec<_>>(),
        )?;
        write_entity_section(
            writer,
            "Angles",
            &angles
                .iter()
                .map(|a| (a.id, a.type_id, &a.atoms[..], a.comment.as_deref()))
                .collect::<Vec<_>>(),
        )?;
        write_entity_section(
            writer,
            "Dihedrals",
            &dihedrals
                .iter()
                .map(|d| (d.id, d.type_id, &d.atoms[..], d.comment.as_deref()))
                .collect::<Vec<_>>(),
        )?;
        write_entity_section(
            writer,
            "Impropers",
            &impropers
                .iter()
                .map(|i| (i.id, i.type_id, &i.atoms[..], i.comment.as_deref()))
                .collect::<Vec<_>>(),
        )?;

        Ok(())
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>, with_coeffs: bool) -> Result<(), DataError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, with_coeffs)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the `Pair Coeffs` and `PairIJ Coeffs` sections.
    ///
    /// Like-pairs go to the first section and cross-pairs to the second; the
    /// style column rules are shared across both since they describe the same
    /// pair list.
    fn write_pair_tables(&self, writer: &mut impl Write) -> Result<(), DataError> {
        let styles: HashSet<Option<&str>> =
            self.pair_types.iter().map(|p| p.style.as_deref()).collect();

        if self
            .pair_types
            .iter()
            .any(|p| p.atom_types.0 == p.atom_types.1)
        {
            write!(writer, "Pair Coeffs")?;
            write_style_tag(writer, &styles, self.pair_types.first())?;
            writeln!(writer)?;
            writeln!(writer)?;
            for pair_type in &self.pair_types {
                let (i, j) = pair_type.atom_types;
                if i != j {
                    continue;
                }
                write!(writer, "{:4}", i)?;
                write_pair_row_tail(writer, pair_type, styles.len())?;
            }
            writeln!(writer)?;
        }

        if self
            .pair_types
            .iter()
            .any(|p| p.atom_types.0 != p.atom_types.1)
        {
            write!(writer, "PairIJ Coeffs")?;
            write_style_tag(writer, &styles, self.pair_types.first())?;
            writeln!(writer)?;
            writeln!(writer)?;
            for pair_type in &self.pair_types {
                let (i, j) = pair_type.atom_types;
                if i == j {
                    continue;
                }
                write!(writer, "{:4} {:4}", i, j)?;
                write_pair_row_tail(writer, pair_type, styles.len())?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}

pub(crate) fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.split_once('#') {
        Some((body, comment)) => (body.trim(), Some(comment.trim())),
        None => (line.trim(), None),
    }
}

fn field<'a>(
    fields: &[&'a str],
    index: usize,
    name: &'static str,
    line: usize,
) -> Result<&'a str, DataError> {
    fields.get(index).copied().ok_or(DataError::Parse {
        line,
        kind: DataParseErrorKind::MissingField { field: name },
    })
}

fn int_field(
    fields: &[&str],
    index: usize,
    name: &'static str,
    line: usize,
) -> Result<usize, DataError> {
    let value = field(fields, index, name, line)?;
    value.parse().map_err(|_| DataError::Parse {
        line,
        kind: DataParseErrorKind::InvalidInt {
            field: name,
            value: value.to_string(),
        },
    })
}

fn signed_field(
    fields: &[&str],
    index: usize,
    name: &'static str,
    line: usize,
) -> Result<i64, DataError> {
    let value = field(fields, index, name, line)?;
    value.parse().map_err(|_| DataError::Parse {
        line,
        kind: DataParseErrorKind::InvalidInt {
            field: name,
            value: value.to_string(),
        },
    })
}

fn float_field(
    fields: &[&str],
    index: usize,
    name: &'static str,
    line: usize,
) -> Result<f64, DataError> {
    let value = field(fields, index, name, line)?;
    value.parse().map_err(|_| DataError::Parse {
        line,
        kind: DataParseErrorKind::InvalidFloat {
            field: name,
            value: value.to_string(),
        },
    })
}

fn parse_header_line(
    data: &mut LammpsData,
    declared: &mut DeclaredCounts,
    body: &str,
    fields: &[&str],
    line: usize,
) -> Result<(), DataError> {
    if body.contains("atoms") {
        declared.atoms = int_field(fields, 0, "atom count", line)?;
        data.atoms = vec![None; declared.atoms];
    } else if body.contains("atom types") {
        declared.atom_types = int_field(fields, 0, "atom type count", line)?;
    } else if body.contains("bonds") {
        declared.bonds = int_field(fields, 0, "bond count", line)?;
        data.bonds = vec![None; declared.bonds];
    } else if body.contains("bond types") {
        declared.bond_types = int_field(fields, 0, "bond type count", line)?;
    } else if body.contains("angles") {
        declared.angles = int_field(fields, 0, "angle count", line)?;
        data.angles = vec![None; declared.angles];
    } else if body.contains("angle types") {
        declared.angle_types = int_field(fields, 0, "angle type count", line)?;
    } else if body.contains("dihedrals") {
        declared.dihedrals = int_field(fields, 0, "dihedral count", line)?;
        data.dihedrals = vec![None; declared.dihedrals];
    } else if body.contains("dihedral types") {
        declared.dihedral_types = int_field(fields, 0, "dihedral type count", line)?;
    } else if body.contains("impropers") {
        declared.impropers = int_field(fields, 0, "improper count", line)?;
        data.impropers = vec![None; declared.impropers];
    } else if body.contains("improper types") {
        declared.improper_types = int_field(fields, 0, "improper type count", line)?;
    } else if body.contains("xlo xhi") {
        data.bounds.x = (
            float_field(fields, 0, "xlo", line)?,
            float_field(fields, 1, "xhi", line)?,
        );
    } else if body.contains("ylo yhi") {
        data.bounds.y = (
            float_field(fields, 0, "ylo", line)?,
            float_field(fields, 1, "yhi", line)?,
        );
    } else if body.contains("zlo zhi") {
        data.bounds.z = (
            float_field(fields, 0, "zlo", line)?,
            float_field(fields, 1, "zhi", line)?,
        );
    } else if body.contains("xy xz yz") {
        data.bounds.tilt = Vector3::new(
            float_field(fields, 0, "xy", line)?,
            float_field(fields, 1, "xz", line)?,
            float_field(fields, 2, "yz", line)?,
        );
    }
    // Unrecognized header lines are skipped.
    Ok(())
}

/// Parses coefficient tokens as floats. `?` placeholders are skipped and a
/// token that fails the numeric parse is kept as the style tag.
pub(crate) fn parse_float_coeffs(fields: &[&str]) -> (Vec<f64>, Option<String>) {
    let mut coeffs = Vec::new();
    let mut style = None;
    for token in fields {
        if *token == "?" {
            continue;
        }
        match token.parse::<f64>() {
            Ok(value) => coeffs.push(value),
            Err(_) => style = Some((*token).to_string()),
        }
    }
    (coeffs, style)
}

/// Like [`parse_float_coeffs`], but keeps integer tokens as integers. Some
/// dihedral styles take exact integer arguments that must survive rewriting.
pub(crate) fn parse_mixed_coeffs(fields: &[&str]) -> (Vec<Coeff>, Option<String>) {
    let mut coeffs = Vec::new();
    let mut style = None;
    for token in fields {
        if *token == "?" {
            continue;
        }
        if let Ok(value) = token.parse::<i64>() {
            coeffs.push(Coeff::Int(value));
        } else if let Ok(value) = token.parse::<f64>() {
            coeffs.push(Coeff::Float(value));
        } else {
            style = Some((*token).to_string());
        }
    }
    (coeffs, style)
}

fn parse_image(fields: &[&str], start: usize) -> Option<Vector3<i32>> {
    let ix = fields.get(start)?.parse().ok()?;
    let iy = fields.get(start + 1)?.parse().ok()?;
    let iz = fields.get(start + 2)?.parse().ok()?;
    Some(Vector3::new(ix, iy, iz))
}

fn check_count(kind: &'static str, declared: usize, found: usize) -> Result<(), DataError> {
    if declared != found {
        return Err(DataError::CountMismatch {
            kind,
            declared,
            found,
        });
    }
    Ok(())
}

/// Python's `%13.6e`: six fractional digits, a signed exponent of at least
/// two digits, right-aligned to thirteen columns. The standard `{:e}` format
/// pads neither the exponent nor the field, so the pieces are assembled here.
fn fmt_sci(value: f64) -> String {
    let formatted = format!("{:.6e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            format!("{:>13}", format!("{}e{:+03}", mantissa, exponent))
        }
        None => format!("{:>13}", formatted),
    }
}

fn finish_line(writer: &mut impl Write, comment: Option<&str>) -> io::Result<()> {
    match comment {
        Some(comment) => writeln!(writer, " # {}", comment),
        None => writeln!(writer),
    }
}

/// A row of a coefficient table, unified over the float and mixed kinds.
struct CoeffLine<'a> {
    id: usize,
    style: Option<&'a str>,
    coeffs: Option<Vec<Coeff>>,
    comment: Option<&'a str>,
}

fn float_coeff_lines<'a, T>(records: &[&'a T]) -> Vec<CoeffLine<'a>>
where
    T: FloatCoeffRecord,
{
    records
        .iter()
        .map(|record| CoeffLine {
            id: record.id(),
            style: record.style(),
            coeffs: record
                .coeffs()
                .map(|c| c.iter().map(|v| Coeff::Float(*v)).collect()),
            comment: record.comment(),
        })
        .collect()
}

/// Field access shared by the float-coefficient type records.
trait FloatCoeffRecord {
    fn id(&self) -> usize;
    fn style(&self) -> Option<&str>;
    fn coeffs(&self) -> Option<&[f64]>;
    fn comment(&self) -> Option<&str>;
}

macro_rules! impl_float_coeff_record {
    ($($record:ty),*) => {
        $(impl FloatCoeffRecord for $record {
            fn id(&self) -> usize {
                self.id
            }
            fn style(&self) -> Option<&str> {
                self.style.as_deref()
            }
            fn coeffs(&self) -> Option<&[f64]> {
                self.coeffs.as_deref()
            }
            fn comment(&self) -> Option<&str> {
                self.comment.as_deref()
            }
        })*
    };
}

impl_float_coeff_record!(BondType, AngleType, ImproperType);

/// Appends the ` # style` tag to a section keyword when the whole table
/// shares one non-empty style.
fn write_style_tag(
    writer: &mut impl Write,
    styles: &HashSet<Option<&str>>,
    first: Option<&PairType>,
) -> io::Result<()> {
    if styles.len() == 1 {
        if let Some(style) = first.and_then(|p| p.style.as_deref()) {
            write!(writer, " # {}", style)?;
        }
    }
    Ok(())
}

fn write_pair_row_tail(
    writer: &mut impl Write,
    pair_type: &PairType,
    style_count: usize,
) -> Result<(), DataError> {
    if style_count > 1 {
        let (i, j) = pair_type.atom_types;
        let style = pair_type.style.as_deref().ok_or_else(|| {
            DataError::Inconsistency(format!(
                "pair type ({}, {}) has no style in a mixed-style table",
                i, j
            ))
        })?;
        write!(writer, " {:<7}", style)?;
    }
    if let Some(coeffs) = &pair_type.coeffs {
        for coeff in coeffs {
            write!(writer, " {:9.4}", coeff)?;
        }
    }
    finish_line(writer, pair_type.comment.as_deref())?;
    Ok(())
}

fn write_coeff_table(
    writer: &mut impl Write,
    keyword: &str,
    lines: Vec<CoeffLine<'_>>,
) -> Result<(), DataError> {
    if lines.is_empty() {
        return Ok(());
    }
    let styles: HashSet<Option<&str>> = lines.iter().map(|l| l.style).collect();
    write!(writer, "{}", keyword)?;
    if styles.len() == 1 {
        if let Some(style) = lines.first().and_then(|l| l.style) {
            write!(writer, " # {}", style)?;
        }
    }
    writeln!(writer)?;
    writeln!(writer)?;
    for line in &lines {
        write!(writer, "{:4}", line.id)?;
        if styles.len() > 1 {
            let style = line.style.ok_or_else(|| {
                DataError::Inconsistency(format!(
                    "{} entry {} has no style in a mixed-style table",
                    keyword, line.id
                ))
            })?;
            write!(writer, " {:<7}", style)?;
        }
        if let Some(coeffs) = &line.coeffs {
            for coeff in coeffs {
                match coeff {
                    Coeff::Int(value) => write!(writer, " {:9}", value)?,
                    Coeff::Float(value) => write!(writer, " {:9.4}", value)?,
                }
            }
        }
        finish_line(writer, line.comment)?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_entity_section(
    writer: &mut impl Write,
    keyword: &str,
    rows: &[(usize, usize, &[usize], Option<&str>)],
) -> Result<(), DataError> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(writer, "{}", keyword)?;
    writeln!(writer)?;
    for (id, type_id, members, comment) in rows {
        write!(writer, "{:7} {:7}", id, type_id)?;
        for member in *members {
            write!(writer, " {:7}", member)?;
        }
        finish_line(writer, *comment)?;
    }
    writeln!(writer)?;
    Ok(())
}

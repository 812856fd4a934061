use nalgebra::{Point3, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The atom-style layouts a data file's `Atoms` section can use.
///
/// The style decides which columns an atom row carries: `full` and `pqeq`
/// rows have a charge column between the type id and the coordinates,
/// `molecular` rows do not. Any other style is rejected up front rather than
/// misread column-by-column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AtomStyle {
    #[default]
    Full,
    Molecular,
    Pqeq,
}

impl AtomStyle {
    /// Whether atom rows of this style carry a charge column.
    pub fn has_charge(&self) -> bool {
        matches!(self, AtomStyle::Full | AtomStyle::Pqeq)
    }
}

impl fmt::Display for AtomStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AtomStyle::Full => "full",
            AtomStyle::Molecular => "molecular",
            AtomStyle::Pqeq => "pqeq",
        };
        write!(f, "{}", name)
    }
}

/// Error returned when a string names an atom style this library does not
/// implement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("atom style '{0}' is not supported")]
pub struct ParseAtomStyleError(pub String);

impl FromStr for AtomStyle {
    type Err = ParseAtomStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(AtomStyle::Full),
            "molecular" => Ok(AtomStyle::Molecular),
            "pqeq" => Ok(AtomStyle::Pqeq),
            other => Err(ParseAtomStyleError(other.to_string())),
        }
    }
}

/// One atom record.
///
/// Optional fields follow an all-or-nothing contract where LAMMPS does:
/// the periodic image triple and the velocity triple are each either fully
/// present or fully absent. The charge is required by the `full` and `pqeq`
/// layouts and checked at write time, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// 1-based index of this record in the data file.
    pub id: usize,
    /// Molecule the atom belongs to; renumbered by molecule assignment.
    pub molecule_id: Option<i64>,
    /// Referenced atom-type id.
    pub type_id: usize,
    pub charge: Option<f64>,
    pub position: Point3<f64>,
    /// Periodic image counts `(nx, ny, nz)`.
    pub image: Option<Vector3<i32>>,
    pub velocity: Option<Vector3<f64>>,
    pub comment: Option<String>,
}

impl Default for Atom {
    fn default() -> Self {
        Self {
            id: 0,
            molecule_id: None,
            type_id: 0,
            charge: None,
            position: Point3::origin(),
            image: None,
            velocity: None,
            comment: None,
        }
    }
}

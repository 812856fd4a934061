/// A single force-field coefficient cell.
///
/// LAMMPS writes most coefficients as reals, but some (dihedral multiplicities
/// and phase signs) are integers that the engine refuses in decimal form, so
/// the distinction has to survive a read/write cycle. Equality is numeric:
/// `Int(2)` equals `Float(2.0)`.
#[derive(Debug, Clone, Copy)]
pub enum Coeff {
    Int(i64),
    Float(f64),
}

impl Coeff {
    /// The numeric value, regardless of representation.
    pub fn value(&self) -> f64 {
        match self {
            Coeff::Int(v) => *v as f64,
            Coeff::Float(v) => *v,
        }
    }
}

impl PartialEq for Coeff {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

/// A force-field atom type: the shared mass and label referenced by atoms.
///
/// The mass stays unset when the type was created as a placeholder (an atom
/// row referenced it before any `Masses` entry defined it); writing a data
/// file requires every mass to be present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtomType {
    /// 1-based index of this record in the data file.
    pub id: usize,
    pub mass: Option<f64>,
    pub comment: Option<String>,
}

/// A nonbonded pair interaction between two atom types.
///
/// Unlike the other type records, a pair type has no index of its own: it is
/// identified by its ordered atom-type pair. The store keeps the list sorted
/// by `(atom_types.0, atom_types.1)` with at most one record per unordered
/// pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PairType {
    /// The two referenced atom-type ids, kept with `.0 <= .1`.
    pub atom_types: (usize, usize),
    pub coeffs: Option<Vec<f64>>,
    pub style: Option<String>,
    pub comment: Option<String>,
}

/// A bond type record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BondType {
    /// 1-based index of this record in the data file.
    pub id: usize,
    pub coeffs: Option<Vec<f64>>,
    pub style: Option<String>,
    pub comment: Option<String>,
}

/// An angle type record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AngleType {
    /// 1-based index of this record in the data file.
    pub id: usize,
    pub coeffs: Option<Vec<f64>>,
    pub style: Option<String>,
    pub comment: Option<String>,
}

/// A dihedral type record.
///
/// Coefficients are [`Coeff`] cells rather than plain floats; see there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DihedralType {
    /// 1-based index of this record in the data file.
    pub id: usize,
    pub coeffs: Option<Vec<Coeff>>,
    pub style: Option<String>,
    pub comment: Option<String>,
}

/// An improper type record.
///
/// By convention the first atom of an improper using one of the supported
/// styles is the center atom; the canonicalization pass relies on this.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImproperType {
    /// 1-based index of this record in the data file.
    pub id: usize,
    pub coeffs: Option<Vec<f64>>,
    pub style: Option<String>,
    pub comment: Option<String>,
}

//! Bonded topology entities.
//!
//! Each entity references one type record and an ordered tuple of atom ids.
//! Atom order is semantically significant (force-field terms are not
//! symmetric under atom exchange) and is preserved everywhere except where
//! improper canonicalization explicitly reorders it.

/// A two-atom bond.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bond {
    /// 1-based index of this record in the data file.
    pub id: usize,
    /// Referenced bond-type id.
    pub type_id: usize,
    pub atoms: [usize; 2],
    pub comment: Option<String>,
}

/// A three-atom angle; the second atom is the vertex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Angle {
    /// 1-based index of this record in the data file.
    pub id: usize,
    /// Referenced angle-type id.
    pub type_id: usize,
    pub atoms: [usize; 3],
    pub comment: Option<String>,
}

/// A four-atom proper dihedral along the 2-3 bond.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dihedral {
    /// 1-based index of this record in the data file.
    pub id: usize,
    /// Referenced dihedral-type id.
    pub type_id: usize,
    pub atoms: [usize; 4],
    pub comment: Option<String>,
}

/// A four-atom improper; for supported styles the first atom is the center.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Improper {
    /// 1-based index of this record in the data file.
    pub id: usize,
    /// Referenced improper-type id.
    pub type_id: usize,
    pub atoms: [usize; 4],
    pub comment: Option<String>,
}

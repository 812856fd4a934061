use std::collections::HashMap;

use super::atom::{Atom, AtomStyle};
use super::simbox::SimBox;
use super::topology::{Angle, Bond, Dihedral, Improper};
use super::types::{AngleType, AtomType, BondType, DihedralType, ImproperType, PairType};
use thiserror::Error;

/// Error returned when a 1-based id fails to resolve to a live record.
///
/// An id resolves through its list position (`list[id - 1]`); an id of zero,
/// an id beyond the list, or an id landing on an unfilled hole all fail the
/// same way. [`LookupError::Hole`] is the variant for operations that walk a
/// whole list and require it to be compacted first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("atom {0} is not defined")]
    Atom(usize),
    #[error("atom type {0} is not defined")]
    AtomType(usize),
    #[error("bond type {0} is not defined")]
    BondType(usize),
    #[error("angle type {0} is not defined")]
    AngleType(usize),
    #[error("dihedral type {0} is not defined")]
    DihedralType(usize),
    #[error("improper type {0} is not defined")]
    ImproperType(usize),
    #[error("{kind} slot {index} is an unfilled hole")]
    Hole { kind: &'static str, index: usize },
}

/// The complete in-memory description of a LAMMPS system.
///
/// Ten of the eleven lists are sparse: a slot is `None` while the record at
/// that index has been referenced but not yet defined. Sparseness only occurs
/// while input is being consumed (or under hand construction with explicit
/// ids); [`LammpsData::remove_holes`] compacts every list, after which stored
/// record ids are retained even where they no longer equal the list position.
/// Pair types are the exception: they have no index of their own and are kept
/// dense, sorted, and free of duplicate pairs by the operations that build
/// them.
///
/// All lists are public. The `add_*` mutators exist to get index assignment,
/// sparse growth, and reference validation right; code that already holds a
/// consistent record set may manipulate the lists directly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LammpsData {
    pub atom_style: AtomStyle,
    /// Free-text title line of the data file.
    pub header: Option<String>,
    pub bounds: SimBox,
    pub atom_types: Vec<Option<AtomType>>,
    pub pair_types: Vec<PairType>,
    pub bond_types: Vec<Option<BondType>>,
    pub angle_types: Vec<Option<AngleType>>,
    pub dihedral_types: Vec<Option<DihedralType>>,
    pub improper_types: Vec<Option<ImproperType>>,
    pub atoms: Vec<Option<Atom>>,
    pub bonds: Vec<Option<Bond>>,
    pub angles: Vec<Option<Angle>>,
    pub dihedrals: Vec<Option<Dihedral>>,
    pub impropers: Vec<Option<Improper>>,
}

/// Places a record at its 1-based id, growing the list with holes as needed.
fn place<T>(slots: &mut Vec<Option<T>>, id: usize, record: T) {
    if id > slots.len() {
        slots.resize_with(id, || None);
    }
    slots[id - 1] = Some(record);
}

/// Borrows every record of a sparse list, failing on the first hole.
pub(crate) fn dense<'a, T>(
    slots: &'a [Option<T>],
    kind: &'static str,
) -> Result<Vec<&'a T>, LookupError> {
    slots
        .iter()
        .enumerate()
        .map(|(n, slot)| slot.as_ref().ok_or(LookupError::Hole { kind, index: n + 1 }))
        .collect()
}

/// Maps each live record's stored id to its position in the backing list.
///
/// After compaction a stored id may no longer equal position + 1; operations
/// that must bind references to the records a file meant resolve them through
/// this map instead of by position.
pub(crate) fn index_by_id<T>(
    slots: &[Option<T>],
    id_of: impl Fn(&T) -> usize,
) -> HashMap<usize, usize> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(n, slot)| slot.as_ref().map(|record| (id_of(record), n)))
        .collect()
}

impl LammpsData {
    pub fn new(atom_style: AtomStyle) -> Self {
        Self {
            atom_style,
            ..Default::default()
        }
    }

    /// Resolves an atom id by position. Returns `None` for id zero, an id
    /// beyond the list, or a hole.
    pub fn atom(&self, id: usize) -> Option<&Atom> {
        id.checked_sub(1)
            .and_then(|p| self.atoms.get(p))
            .and_then(Option::as_ref)
    }

    pub fn atom_mut(&mut self, id: usize) -> Option<&mut Atom> {
        id.checked_sub(1)
            .and_then(|p| self.atoms.get_mut(p))
            .and_then(Option::as_mut)
    }

    pub fn atom_type(&self, id: usize) -> Option<&AtomType> {
        id.checked_sub(1)
            .and_then(|p| self.atom_types.get(p))
            .and_then(Option::as_ref)
    }

    pub fn bond_type(&self, id: usize) -> Option<&BondType> {
        id.checked_sub(1)
            .and_then(|p| self.bond_types.get(p))
            .and_then(Option::as_ref)
    }

    pub fn angle_type(&self, id: usize) -> Option<&AngleType> {
        id.checked_sub(1)
            .and_then(|p| self.angle_types.get(p))
            .and_then(Option::as_ref)
    }

    pub fn dihedral_type(&self, id: usize) -> Option<&DihedralType> {
        id.checked_sub(1)
            .and_then(|p| self.dihedral_types.get(p))
            .and_then(Option::as_ref)
    }

    pub fn improper_type(&self, id: usize) -> Option<&ImproperType> {
        id.checked_sub(1)
            .and_then(|p| self.improper_types.get(p))
            .and_then(Option::as_ref)
    }

    /// Adds an atom type; an id of zero assigns the next free index.
    /// Returns the id the record was stored under.
    pub fn add_atom_type(&mut self, mut atom_type: AtomType) -> usize {
        if atom_type.id == 0 {
            atom_type.id = self.atom_types.len() + 1;
        }
        let id = atom_type.id;
        place(&mut self.atom_types, id, atom_type);
        id
    }

    /// Appends a pair type after checking both referenced atom types resolve.
    ///
    /// The pair is stored exactly as given; callers are responsible for the
    /// `(lo, hi)` ordering and for keeping the list sorted and deduplicated.
    pub fn add_pair_type(&mut self, pair_type: PairType) -> Result<(), LookupError> {
        let (i, j) = pair_type.atom_types;
        if self.atom_type(i).is_none() {
            return Err(LookupError::AtomType(i));
        }
        if self.atom_type(j).is_none() {
            return Err(LookupError::AtomType(j));
        }
        self.pair_types.push(pair_type);
        Ok(())
    }

    pub fn add_bond_type(&mut self, mut bond_type: BondType) -> usize {
        if bond_type.id == 0 {
            bond_type.id = self.bond_types.len() + 1;
        }
        let id = bond_type.id;
        place(&mut self.bond_types, id, bond_type);
        id
    }

    pub fn add_angle_type(&mut self, mut angle_type: AngleType) -> usize {
        if angle_type.id == 0 {
            angle_type.id = self.angle_types.len() + 1;
        }
        let id = angle_type.id;
        place(&mut self.angle_types, id, angle_type);
        id
    }

    pub fn add_dihedral_type(&mut self, mut dihedral_type: DihedralType) -> usize {
        if dihedral_type.id == 0 {
            dihedral_type.id = self.dihedral_types.len() + 1;
        }
        let id = dihedral_type.id;
        place(&mut self.dihedral_types, id, dihedral_type);
        id
    }

    pub fn add_improper_type(&mut self, mut improper_type: ImproperType) -> usize {
        if improper_type.id == 0 {
            improper_type.id = self.improper_types.len() + 1;
        }
        let id = improper_type.id;
        place(&mut self.improper_types, id, improper_type);
        id
    }

    /// Adds an atom after checking its type reference resolves.
    /// An id of zero assigns the next free index.
    pub fn add_atom(&mut self, mut atom: Atom) -> Result<usize, LookupError> {
        if self.atom_type(atom.type_id).is_none() {
            return Err(LookupError::AtomType(atom.type_id));
        }
        if atom.id == 0 {
            atom.id = self.atoms.len() + 1;
        }
        let id = atom.id;
        place(&mut self.atoms, id, atom);
        Ok(id)
    }

    /// Adds a bond after checking its type and both atom references resolve.
    pub fn add_bond(&mut self, mut bond: Bond) -> Result<usize, LookupError> {
        if self.bond_type(bond.type_id).is_none() {
            return Err(LookupError::BondType(bond.type_id));
        }
        for &atom_id in &bond.atoms {
            if self.atom(atom_id).is_none() {
                return Err(LookupError::Atom(atom_id));
            }
        }
        if bond.id == 0 {
            bond.id = self.bonds.len() + 1;
        }
        let id = bond.id;
        place(&mut self.bonds, id, bond);
        Ok(id)
    }

    pub fn add_angle(&mut self, mut angle: Angle) -> Result<usize, LookupError> {
        if self.angle_type(angle.type_id).is_none() {
            return Err(LookupError::AngleType(angle.type_id));
        }
        for &atom_id in &angle.atoms {
            if self.atom(atom_id).is_none() {
                return Err(LookupError::Atom(atom_id));
            }
        }
        if angle.id == 0 {
            angle.id = self.angles.len() + 1;
        }
        let id = angle.id;
        place(&mut self.angles, id, angle);
        Ok(id)
    }

    pub fn add_dihedral(&mut self, mut dihedral: Dihedral) -> Result<usize, LookupError> {
        if self.dihedral_type(dihedral.type_id).is_none() {
            return Err(LookupError::DihedralType(dihedral.type_id));
        }
        for &atom_id in &dihedral.atoms {
            if self.atom(atom_id).is_none() {
                return Err(LookupError::Atom(atom_id));
            }
        }
        if dihedral.id == 0 {
            dihedral.id = self.dihedrals.len() + 1;
        }
        let id = dihedral.id;
        place(&mut self.dihedrals, id, dihedral);
        Ok(id)
    }

    pub fn add_improper(&mut self, mut improper: Improper) -> Result<usize, LookupError> {
        if self.improper_type(improper.type_id).is_none() {
            return Err(LookupError::ImproperType(improper.type_id));
        }
        for &atom_id in &improper.atoms {
            if self.atom(atom_id).is_none() {
                return Err(LookupError::Atom(atom_id));
            }
        }
        if improper.id == 0 {
            improper.id = self.impropers.len() + 1;
        }
        let id = improper.id;
        place(&mut self.impropers, id, improper);
        Ok(id)
    }

    /// Drops every hole from the ten sparse lists, preserving record order.
    ///
    /// Stored record ids are kept as they are: after compaction an id may no
    /// longer equal its list position. That is the documented state for data
    /// read from files whose declared indices were sparse.
    pub fn remove_holes(&mut self) {
        self.atom_types.retain(Option::is_some);
        self.bond_types.retain(Option::is_some);
        self.angle_types.retain(Option::is_some);
        self.dihedral_types.retain(Option::is_some);
        self.improper_types.retain(Option::is_some);
        self.atoms.retain(Option::is_some);
        self.bonds.retain(Option::is_some);
        self.angles.retain(Option::is_some);
        self.dihedrals.retain(Option::is_some);
        self.impropers.retain(Option::is_some);
    }

    /// Sorts pair types by their ordered atom-type id pair.
    pub fn sort_pair_types(&mut self) {
        self.pair_types.sort_by_key(|pair_type| pair_type.atom_types);
    }

    /// Drops every pair type that is field-for-field identical to a later
    /// one. Records that differ in any field both survive.
    pub fn dedup_pair_types(&mut self) {
        let mut deduped = Vec::with_capacity(self.pair_types.len());
        for (n, pair_type) in self.pair_types.iter().enumerate() {
            if !self.pair_types[n + 1..].contains(pair_type) {
                deduped.push(pair_type.clone());
            }
        }
        self.pair_types = deduped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_store_with_two_types() -> LammpsData {
        let mut data = LammpsData::new(AtomStyle::Full);
        data.add_atom_type(AtomType {
            mass: Some(15.9994),
            comment: Some("OW".to_string()),
            ..Default::default()
        });
        data.add_atom_type(AtomType {
            mass: Some(1.00794),
            comment: Some("HW".to_string()),
            ..Default::default()
        });
        data
    }

    fn create_atom(type_id: usize) -> Atom {
        Atom {
            type_id,
            ..Default::default()
        }
    }

    mod store_mutations {
        use super::*;

        #[test]
        fn zero_id_assigns_the_next_free_index() {
            let mut data = create_store_with_two_types();
            assert_eq!(data.atom_types[0].as_ref().unwrap().id, 1);
            assert_eq!(data.atom_types[1].as_ref().unwrap().id, 2);

            let id = data.add_atom(create_atom(1)).unwrap();
            assert_eq!(id, 1);
            let id = data.add_atom(create_atom(2)).unwrap();
            assert_eq!(id, 2);
        }

        #[test]
        fn explicit_id_beyond_length_grows_with_holes() {
            let mut data = create_store_with_two_types();
            let mut atom = create_atom(1);
            atom.id = 4;
            data.add_atom(atom).unwrap();

            assert_eq!(data.atoms.len(), 4);
            assert!(data.atoms[0].is_none());
            assert!(data.atoms[2].is_none());
            assert_eq!(data.atoms[3].as_ref().unwrap().id, 4);
        }

        #[test]
        fn add_bond_rejects_missing_atoms() {
            let mut data = create_store_with_two_types();
            data.add_atom(create_atom(1)).unwrap();
            data.add_bond_type(BondType::default());

            let bond = Bond {
                type_id: 1,
                atoms: [1, 2],
                ..Default::default()
            };
            assert_eq!(data.add_bond(bond), Err(LookupError::Atom(2)));
        }

        #[test]
        fn add_bond_rejects_hole_atoms() {
            let mut data = create_store_with_two_types();
            let mut atom = create_atom(1);
            atom.id = 3;
            data.add_atom(atom).unwrap();
            data.add_bond_type(BondType::default());

            let bond = Bond {
                type_id: 1,
                atoms: [1, 3],
                ..Default::default()
            };
            assert_eq!(data.add_bond(bond), Err(LookupError::Atom(1)));
        }

        #[test]
        fn add_atom_rejects_missing_type() {
            let mut data = LammpsData::new(AtomStyle::Full);
            assert_eq!(
                data.add_atom(create_atom(1)),
                Err(LookupError::AtomType(1))
            );
        }

        #[test]
        fn add_pair_type_rejects_missing_atom_types() {
            let mut data = create_store_with_two_types();
            let pair_type = PairType {
                atom_types: (2, 3),
                ..Default::default()
            };
            assert_eq!(data.add_pair_type(pair_type), Err(LookupError::AtomType(3)));
        }
    }

    mod hole_compaction {
        use super::*;

        #[test]
        fn remove_holes_keeps_order_and_stored_ids() {
            let mut data = create_store_with_two_types();
            for id in [2, 5, 3] {
                let mut atom = create_atom(1);
                atom.id = id;
                data.add_atom(atom).unwrap();
            }
            data.remove_holes();

            let ids: Vec<usize> = data.atoms.iter().map(|a| a.as_ref().unwrap().id).collect();
            assert_eq!(ids, vec![2, 3, 5]);
        }

        #[test]
        fn sort_pair_types_orders_by_id_pair() {
            let mut data = create_store_with_two_types();
            data.add_pair_type(PairType {
                atom_types: (2, 2),
                ..Default::default()
            })
            .unwrap();
            data.add_pair_type(PairType {
                atom_types: (1, 2),
                ..Default::default()
            })
            .unwrap();
            data.add_pair_type(PairType {
                atom_types: (1, 1),
                ..Default::default()
            })
            .unwrap();
            data.sort_pair_types();

            let pairs: Vec<(usize, usize)> =
                data.pair_types.iter().map(|p| p.atom_types).collect();
            assert_eq!(pairs, vec![(1, 1), (1, 2), (2, 2)]);
        }

        #[test]
        fn dedup_pair_types_keeps_the_last_exact_copy() {
            let mut data = create_store_with_two_types();
            for coeffs in [vec![1.0], vec![2.0], vec![1.0]] {
                data.add_pair_type(PairType {
                    atom_types: (1, 2),
                    coeffs: Some(coeffs),
                    ..Default::default()
                })
                .unwrap();
            }
            data.dedup_pair_types();

            let coeffs: Vec<_> = data.pair_types.iter().map(|p| p.coeffs.clone()).collect();
            assert_eq!(coeffs, vec![Some(vec![2.0]), Some(vec![1.0])]);
        }
    }

    mod index_resolution {
        use super::*;

        #[test]
        fn resolution_is_by_position_not_stored_id() {
            let mut data = create_store_with_two_types();
            for id in [2, 5] {
                let mut atom = create_atom(1);
                atom.id = id;
                data.add_atom(atom).unwrap();
            }
            data.remove_holes();

            // Positions 1 and 2 now hold the records with ids 2 and 5.
            assert_eq!(data.atom(1).unwrap().id, 2);
            assert_eq!(data.atom(2).unwrap().id, 5);
            assert!(data.atom(5).is_none());
        }

        #[test]
        fn id_zero_never_resolves() {
            let data = create_store_with_two_types();
            assert!(data.atom_type(0).is_none());
            assert!(data.atom(0).is_none());
        }

        #[test]
        fn dense_reports_the_first_hole() {
            let mut data = create_store_with_two_types();
            let mut atom = create_atom(1);
            atom.id = 2;
            data.add_atom(atom).unwrap();

            let err = dense(&data.atoms, "atoms").unwrap_err();
            assert_eq!(
                err,
                LookupError::Hole {
                    kind: "atoms",
                    index: 1
                }
            );
        }
    }
}

//! Bottom-up canonicalization of force-field type lists.
//!
//! A data file may carry more type records than the system needs: every
//! entity can name its own private type even when the parameters repeat.
//! The passes here rebuild each type list from the entities that use it,
//! merging records whose parameters cannot be told apart and rewriting the
//! entity type references onto the merged list.
//!
//! Candidate search is first-seen-wins: the rebuilt list follows entity
//! order, and which of two mergeable records survives depends on it.

use std::collections::{HashMap, HashSet};

use phf::phf_set;
use thiserror::Error;

use crate::core::models::system::{index_by_id, LammpsData, LookupError};
use crate::core::models::types::{
    AngleType, AtomType, BondType, DihedralType, ImproperType, PairType,
};

/// Errors that can occur during a canonicalization pass.
#[derive(Debug, Error)]
pub enum RetypeError {
    #[error("found {style} improper style, first atom is not the center atom")]
    UnsupportedImproperStyle { style: String },
    #[error("pair type references atom type {id}, which no atom uses")]
    UnusedAtomType { id: usize },
    #[error("atom type {id} has no comment to join")]
    MissingComment { id: usize },
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Improper styles whose center atom is not the first atom.
static UNSUPPORTED_IMPROPER_STYLES: phf::Set<&'static str> = phf_set! {
    "distharm",
    "ring",
    "class2",
};

/// Index shuffles of a four-atom tuple that keep the center atom first.
const NON_CENTER_PERMUTATIONS: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [0, 1, 3, 2],
    [0, 2, 1, 3],
    [0, 2, 3, 1],
    [0, 3, 1, 2],
    [0, 3, 2, 1],
];

/// A candidate comment matches when the source record has none, or when
/// both carry the same text.
fn comment_matches(candidate: Option<&str>, source: Option<&str>) -> bool {
    source.is_none() || candidate == source
}

macro_rules! impl_entity_type_reset {
    ($(#[$doc:meta])* $fn_name:ident, $entities:ident, $types:ident, $record:ident, $missing:path, $arity:expr) => {
        $(#[$doc])*
        pub fn $fn_name(&mut self, match_atom_types: bool) -> Result<(), RetypeError> {
            let atom_positions = index_by_id(&self.atoms, |a| a.id);
            let type_positions = index_by_id(&self.atom_types, |t| t.id);
            let old_positions = index_by_id(&self.$types, |t| t.id);

            // Resolve every entity's signature and current parameters before
            // touching the store.
            let mut sources = Vec::new();
            for entity in self.$entities.iter().flatten() {
                let mut signature = [0usize; $arity];
                for (k, &atom_id) in entity.atoms.iter().enumerate() {
                    let atom = atom_positions
                        .get(&atom_id)
                        .and_then(|&n| self.atoms[n].as_ref())
                        .ok_or(LookupError::Atom(atom_id))?;
                    signature[k] = *type_positions
                        .get(&atom.type_id)
                        .ok_or(LookupError::AtomType(atom.type_id))?;
                }
                let old_type = old_positions
                    .get(&entity.type_id)
                    .and_then(|&n| self.$types[n].as_ref())
                    .ok_or($missing(entity.type_id))?;
                sources.push((
                    signature,
                    old_type.coeffs.clone(),
                    old_type.style.clone(),
                    old_type.comment.clone(),
                ));
            }

            let mut rebuilt: Vec<$record> = Vec::new();
            let mut signatures: Vec<[usize; $arity]> = Vec::new();
            for (entity, (signature, coeffs, style, comment)) in
                self.$entities.iter_mut().flatten().zip(sources)
            {
                let mut reversed = signature;
                reversed.reverse();
                let found = rebuilt
                    .iter()
                    .zip(&signatures)
                    .find(|(candidate, candidate_signature)| {
                        (!match_atom_types
                            || **candidate_signature == signature
                            || **candidate_signature == reversed)
                            && candidate.coeffs == coeffs
                            && candidate.style == style
                            && comment_matches(candidate.comment.as_deref(), comment.as_deref())
                    })
                    .map(|(candidate, _)| candidate.id);
                entity.type_id = match found {
                    Some(id) => id,
                    None => {
                        let id = rebuilt.len() + 1;
                        rebuilt.push($record {
                            id,
                            coeffs,
                            style,
                            comment,
                        });
                        signatures.push(signature);
                        id
                    }
                };
            }
            self.$types = rebuilt.into_iter().map(Some).collect();
            Ok(())
        }
    };
}

impl LammpsData {
    /// Rebuilds the atom-type list bottom-up from the atoms that use it.
    ///
    /// Atoms are visited in list order. An atom reuses the first rebuilt
    /// type with an equal mass whose comment matches; otherwise its current
    /// mass and comment become a new type. Pair types are then remapped
    /// through the old atom types onto the new ids, deduplicated, and
    /// re-sorted. A pair type whose atom type no atom uses has no new id to
    /// map to and is an error.
    pub fn reset_atom_types(&mut self) -> Result<(), RetypeError> {
        let type_positions = index_by_id(&self.atom_types, |t| t.id);

        let mut sources = Vec::new();
        for atom in self.atoms.iter().flatten() {
            let old_type = type_positions
                .get(&atom.type_id)
                .and_then(|&n| self.atom_types[n].as_ref())
                .ok_or(LookupError::AtomType(atom.type_id))?;
            sources.push((atom.type_id, old_type.mass, old_type.comment.clone()));
        }

        // Only types some atom uses get a new id, so pair references are
        // checked in full before anything is rewritten.
        let used_types: HashSet<usize> =
            self.atoms.iter().flatten().map(|a| a.type_id).collect();
        for pair_type in &self.pair_types {
            for id in [pair_type.atom_types.0, pair_type.atom_types.1] {
                if !used_types.contains(&id) {
                    return Err(RetypeError::UnusedAtomType { id });
                }
            }
        }

        let mut rebuilt: Vec<AtomType> = Vec::new();
        let mut new_ids: HashMap<usize, usize> = HashMap::new();
        for (atom, (old_id, mass, comment)) in self.atoms.iter_mut().flatten().zip(sources) {
            let found = rebuilt
                .iter()
                .find(|candidate| {
                    candidate.mass == mass
                        && comment_matches(candidate.comment.as_deref(), comment.as_deref())
                })
                .map(|candidate| candidate.id);
            let new_id = match found {
                Some(id) => id,
                None => {
                    let id = rebuilt.len() + 1;
                    rebuilt.push(AtomType { id, mass, comment });
                    id
                }
            };
            atom.type_id = new_id;
            new_ids.insert(old_id, new_id);
        }
        self.atom_types = rebuilt.into_iter().map(Some).collect();

        let old_pair_types = std::mem::take(&mut self.pair_types);
        for pair_type in old_pair_types {
            let (old_i, old_j) = pair_type.atom_types;
            let i = *new_ids
                .get(&old_i)
                .ok_or(RetypeError::UnusedAtomType { id: old_i })?;
            let j = *new_ids
                .get(&old_j)
                .ok_or(RetypeError::UnusedAtomType { id: old_j })?;
            let atom_types = if i <= j { (i, j) } else { (j, i) };
            self.add_pair_type(PairType {
                atom_types,
                ..pair_type
            })?;
        }
        self.dedup_pair_types();
        self.sort_pair_types();
        Ok(())
    }

    impl_entity_type_reset!(
        /// Rebuilds the bond-type list from the bonds that use it.
        ///
        /// A bond reuses a rebuilt type when its coefficients, style, and
        /// comment match and, unless `match_atom_types` is off, the bond's
        /// atom-type signature equals the candidate's in either direction.
        reset_bond_types,
        bonds,
        bond_types,
        BondType,
        LookupError::BondType,
        2
    );

    impl_entity_type_reset!(
        /// Rebuilds the angle-type list; same matching as the bond pass.
        reset_angle_types,
        angles,
        angle_types,
        AngleType,
        LookupError::AngleType,
        3
    );

    impl_entity_type_reset!(
        /// Rebuilds the dihedral-type list; same matching as the bond pass.
        /// Coefficient comparison is numeric, so an integer cell equals the
        /// float of the same value.
        reset_dihedral_types,
        dihedrals,
        dihedral_types,
        DihedralType,
        LookupError::DihedralType,
        4
    );

    /// Rebuilds the improper-type list, matching any ordering of the three
    /// non-center atoms.
    ///
    /// The first atom of an improper is the center by force-field
    /// convention; styles that put it elsewhere are rejected before the
    /// store is touched. A candidate matches when some non-center ordering
    /// of the improper's atom types equals the candidate's signature and
    /// coefficients, style, and comment match as in the other passes. On a
    /// match through a non-identity ordering the improper's atoms are
    /// rewritten to that ordering, since the coefficients are not symmetric
    /// under atom exchange. The improper's comment is free text and is not
    /// permuted with the atoms.
    pub fn reset_improper_types(&mut self) -> Result<(), RetypeError> {
        for improper_type in self.improper_types.iter().flatten() {
            if let Some(style) = improper_type.style.as_deref() {
                if UNSUPPORTED_IMPROPER_STYLES.contains(style) {
                    return Err(RetypeError::UnsupportedImproperStyle {
                        style: style.to_string(),
                    });
                }
            }
        }

        let atom_positions = index_by_id(&self.atoms, |a| a.id);
        let type_positions = index_by_id(&self.atom_types, |t| t.id);
        let old_positions = index_by_id(&self.improper_types, |t| t.id);

        let mut sources = Vec::new();
        for improper in self.impropers.iter().flatten() {
            let mut signature = [0usize; 4];
            for (k, &atom_id) in improper.atoms.iter().enumerate() {
                let atom = atom_positions
                    .get(&atom_id)
                    .and_then(|&n| self.atoms[n].as_ref())
                    .ok_or(LookupError::Atom(atom_id))?;
                signature[k] = *type_positions
                    .get(&atom.type_id)
                    .ok_or(LookupError::AtomType(atom.type_id))?;
            }
            let old_type = old_positions
                .get(&improper.type_id)
                .and_then(|&n| self.improper_types[n].as_ref())
                .ok_or(LookupError::ImproperType(improper.type_id))?;
            sources.push((
                signature,
                old_type.coeffs.clone(),
                old_type.style.clone(),
                old_type.comment.clone(),
            ));
        }

        let mut rebuilt: Vec<ImproperType> = Vec::new();
        let mut signatures: Vec<[usize; 4]> = Vec::new();
        for (improper, (signature, coeffs, style, comment)) in
            self.impropers.iter_mut().flatten().zip(sources)
        {
            let mut found = None;
            'candidates: for (candidate, candidate_signature) in rebuilt.iter().zip(&signatures) {
                if candidate.coeffs != coeffs
                    || candidate.style != style
                    || !comment_matches(candidate.comment.as_deref(), comment.as_deref())
                {
                    continue;
                }
                for permutation in NON_CENTER_PERMUTATIONS {
                    if *candidate_signature == permutation.map(|k| signature[k]) {
                        found = Some((candidate.id, permutation));
                        break 'candidates;
                    }
                }
            }
            match found {
                Some((id, permutation)) => {
                    improper.atoms = permutation.map(|k| improper.atoms[k]);
                    improper.type_id = id;
                }
                None => {
                    let id = rebuilt.len() + 1;
                    rebuilt.push(ImproperType {
                        id,
                        coeffs,
                        style,
                        comment,
                    });
                    signatures.push(signature);
                    improper.type_id = id;
                }
            }
        }
        self.improper_types = rebuilt.into_iter().map(Some).collect();
        Ok(())
    }

    /// Runs every canonicalization pass in dependency order.
    ///
    /// Later passes key their signatures off the atom types the first pass
    /// just rebuilt, so the order is fixed: atom (with its pair rebuild),
    /// bond, angle, dihedral, improper.
    pub fn reset_all_types(&mut self, match_atom_types: bool) -> Result<(), RetypeError> {
        self.reset_atom_types()?;
        self.reset_bond_types(match_atom_types)?;
        self.reset_angle_types(match_atom_types)?;
        self.reset_dihedral_types(match_atom_types)?;
        self.reset_improper_types()?;
        Ok(())
    }

    /// Rewrites entity and dependent-type comments by joining the member
    /// atoms' type comments with `sep`.
    ///
    /// Pair-type comments join their two atom types; each atom takes its
    /// type's comment verbatim; bonds, angles, dihedrals, and impropers
    /// join their member atoms' types, and each entity's type takes the
    /// comment of the last entity using it. Every involved atom type must
    /// carry a comment.
    pub fn auto_comment_from_atom_types(&mut self, sep: &str) -> Result<(), RetypeError> {
        let mut type_comments: HashMap<usize, Option<String>> = HashMap::new();
        for atom_type in self.atom_types.iter().flatten() {
            type_comments.insert(atom_type.id, atom_type.comment.clone());
        }
        let atom_types_by_atom: HashMap<usize, usize> = self
            .atoms
            .iter()
            .flatten()
            .map(|atom| (atom.id, atom.type_id))
            .collect();

        for pair_type in &mut self.pair_types {
            let (i, j) = pair_type.atom_types;
            let comment = [
                atom_type_comment(&type_comments, i)?,
                atom_type_comment(&type_comments, j)?,
            ]
            .join(sep);
            pair_type.comment = Some(comment);
        }

        for atom in self.atoms.iter_mut().flatten() {
            atom.comment = Some(atom_type_comment(&type_comments, atom.type_id)?.to_string());
        }

        let bond_type_positions = index_by_id(&self.bond_types, |t| t.id);
        for bond in self.bonds.iter_mut().flatten() {
            let comment = join_member_comments(
                &type_comments,
                &atom_types_by_atom,
                &bond.atoms,
                sep,
            )?;
            let position = bond_type_positions
                .get(&bond.type_id)
                .copied()
                .ok_or(LookupError::BondType(bond.type_id))?;
            if let Some(bond_type) = self.bond_types[position].as_mut() {
                bond_type.comment = Some(comment.clone());
            }
            bond.comment = Some(comment);
        }

        let angle_type_positions = index_by_id(&self.angle_types, |t| t.id);
        for angle in self.angles.iter_mut().flatten() {
            let comment = join_member_comments(
                &type_comments,
                &atom_types_by_atom,
                &angle.atoms,
                sep,
            )?;
            let position = angle_type_positions
                .get(&angle.type_id)
                .copied()
                .ok_or(LookupError::AngleType(angle.type_id))?;
            if let Some(angle_type) = self.angle_types[position].as_mut() {
                angle_type.comment = Some(comment.clone());
            }
            angle.comment = Some(comment);
        }

        let dihedral_type_positions = index_by_id(&self.dihedral_types, |t| t.id);
        for dihedral in self.dihedrals.iter_mut().flatten() {
            let comment = join_member_comments(
                &type_comments,
                &atom_types_by_atom,
                &dihedral.atoms,
                sep,
            )?;
            let position = dihedral_type_positions
                .get(&dihedral.type_id)
                .copied()
                .ok_or(LookupError::DihedralType(dihedral.type_id))?;
            if let Some(dihedral_type) = self.dihedral_types[position].as_mut() {
                dihedral_type.comment = Some(comment.clone());
            }
            dihedral.comment = Some(comment);
        }

        let improper_type_positions = index_by_id(&self.improper_types, |t| t.id);
        for improper in self.impropers.iter_mut().flatten() {
            let comment = join_member_comments(
                &type_comments,
                &atom_types_by_atom,
                &improper.atoms,
                sep,
            )?;
            let position = improper_type_positions
                .get(&improper.type_id)
                .copied()
                .ok_or(LookupError::ImproperType(improper.type_id))?;
            if let Some(improper_type) = self.improper_types[position].as_mut() {
                improper_type.comment = Some(comment.clone());
            }
            improper.comment = Some(comment);
        }

        Ok(())
    }
}

fn atom_type_comment(
    type_comments: &HashMap<usize, Option<String>>,
    id: usize,
) -> Result<&str, RetypeError> {
    type_comments
        .get(&id)
        .ok_or(LookupError::AtomType(id))?
        .as_deref()
        .ok_or(RetypeError::MissingComment { id })
}

fn join_member_comments(
    type_comments: &HashMap<usize, Option<String>>,
    atom_types_by_atom: &HashMap<usize, usize>,
    atoms: &[usize],
    sep: &str,
) -> Result<String, RetypeError> {
    let mut parts = Vec::with_capacity(atoms.len());
    for &atom_id in atoms {
        let type_id = *atom_types_by_atom
            .get(&atom_id)
            .ok_or(LookupError::Atom(atom_id))?;
        parts.push(atom_type_comment(type_comments, type_id)?);
    }
    Ok(parts.join(sep))
}

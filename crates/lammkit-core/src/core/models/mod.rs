//! # Core Models Module
//!
//! Data structures describing a LAMMPS system: force-field type records,
//! atoms, bonded topology entities, the simulation box, and the store that
//! owns them all.
//!
//! ## Overview
//!
//! Every record kind carries the 1-based index it had (or will have) in the
//! data file; cross-references between records are those indices, never
//! embedded copies. The store ([`system::LammpsData`]) keeps each list sparse
//! while a file is being read - absent slots are holes - and compacts them
//! once input is complete.
//!
//! ## Key Components
//!
//! - [`types`] - Force-field parameter records (`AtomType`, `PairType`,
//!   bonded type records, and the int/float [`types::Coeff`] cell).
//! - [`atom`] - Per-atom record and the supported atom-style layouts.
//! - [`topology`] - Bonds, angles, dihedrals, and impropers.
//! - [`simbox`] - Orthogonal or triclinic simulation box bounds.
//! - [`system`] - The entity store, its mutators, and index resolution.

pub mod atom;
pub mod simbox;
pub mod system;
pub mod topology;
pub mod types;

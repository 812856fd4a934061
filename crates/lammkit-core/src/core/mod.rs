//! # Core Module
//!
//! The structured-topology model of a LAMMPS simulation and every operation
//! that builds, restructures, or serializes it.
//!
//! ## Overview
//!
//! A LAMMPS data file describes a molecular system as cross-referenced,
//! 1-indexed lists: atom types and their masses, pair/bond/angle/dihedral/
//! improper coefficient records, and the entities that reference them. This
//! module keeps that description in memory as [`models::system::LammpsData`]
//! and guarantees that what is written back is byte-for-byte what LAMMPS
//! would have accepted in the first place.
//!
//! ## Architecture
//!
//! - **Record Types** ([`models`]) - Plain data structs for types, atoms,
//!   topology entities, and the simulation box, plus the sparse entity store
//!   and its mutators.
//! - **File I/O** ([`io`]) - The data file parser/writer and the coefficient
//!   fragment loader/writers.
//! - **Type Canonicalization** ([`retype`]) - Bottom-up deduplication of
//!   force-field type records, including permutation-invariant improper
//!   matching.
//! - **Connectivity** ([`graph`]) - Bond-graph projection and connected
//!   component molecule numbering.

pub mod graph;
pub mod io;
pub mod models;
pub mod retype;

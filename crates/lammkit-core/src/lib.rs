//! # lammkit Core Library
//!
//! A library for reading, transforming, and writing the input and output files
//! of the LAMMPS molecular dynamics code.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers with no shared state between them:
//!
//! - **[`core`]: The Topology Model.** The in-memory description of a simulated
//!   system (`LammpsData`): atoms, bonds, angles, dihedrals, impropers, their
//!   force-field type records, and the simulation box. This layer owns the data
//!   file parser and writer, the auxiliary coefficient loader, and the
//!   restructuring algorithms (type canonicalization, molecule assignment).
//!
//! - **[`output`]: The Reader Family.** Thin, memory-efficient iterators over
//!   the files LAMMPS produces while running - thermodynamic logs, the
//!   `fix ave/*` averages, and trajectory dumps. Each reader yields one record
//!   per configuration and never loads a whole file.
//!
//! Topology construction flows through one pipeline: parse into sparse lists,
//! compact holes, optionally merge coefficient fragments, optionally
//! canonicalize types and renumber molecules, then serialize byte-for-byte in
//! the format LAMMPS expects.

pub mod core;
pub mod output;

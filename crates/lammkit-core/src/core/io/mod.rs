//! Reading and writing of LAMMPS input files.
//!
//! [`data`] handles the data file itself: the section-based format carrying
//! the header counts, box bounds, force-field types, and topology entities.
//! [`settings`] handles the coefficient fragments (`pair_coeff` and friends)
//! that force-field tooling keeps in separate include files, both reading
//! them into an existing system and writing them back out.

pub mod data;
pub mod settings;

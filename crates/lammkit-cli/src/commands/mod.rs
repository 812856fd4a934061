pub mod info;
pub mod retype;
pub mod rewrite;
pub mod thermo;

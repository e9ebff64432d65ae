//! Numerical helpers shared by the model and I/O layers: vector geometry
//! (bond lengths, angles, dihedrals, atom placement) and element data.

pub mod elements;
pub mod geometry;

//! # Core Models Module
//!
//! Data structures describing a molecule in the two coordinate systems the library
//! works with.
//!
//! - [`atom`] - A single indexed atom with its element label and Cartesian position
//! - [`geometry`] - An ordered, index-keyed collection of atoms with arithmetic,
//!   mass-weighted centring and principal-axes alignment
//! - [`trajectory`] - Ordered geometries with per-step annotations
//! - [`zmat`] - Construction tables and Z-matrices (bond/angle/dihedral coordinates),
//!   including their differences
//!
//! Every transformation returns a new value; nothing here mutates a geometry that
//! another component may hold.
//!
//! ```ignore
//! use vibzmat::core::models::{atom::Atom, geometry::Geometry, zmat::{ConstantTable, ZMatrix}};
//!
//! let geometry = Geometry::from_atoms(atoms)?;
//! let table = ConstantTable::from_geometry(&geometry)?;
//! let zmat = ZMatrix::from_geometry(&geometry, &table)?;
//! ```

pub mod atom;
pub mod geometry;
pub mod trajectory;
pub mod zmat;

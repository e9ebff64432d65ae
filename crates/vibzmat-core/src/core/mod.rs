//! # Core Module
//!
//! Stateless building blocks shared by the vibration pipeline.
//!
//! - **Molecular Representation** ([`models`]) - Indexed Cartesian geometries, trajectories,
//!   construction tables and Z-matrices
//! - **File I/O** ([`io`]) - Molden section splitting, Molden and XYZ trajectory codecs,
//!   and the external viewer launcher
//! - **Comparison** ([`compare`]) - Tolerance-based geometry equality with optional
//!   principal-axes alignment
//! - **Utilities** ([`utils`]) - Vector geometry helpers and element data

pub mod compare;
pub mod io;
pub mod models;
pub mod utils;

//! # vibzmat
//!
//! Molecular geometries and vibrational normal modes exchanged through the Molden
//! format, with the modes re-expressed in internal (bond/angle/dihedral) coordinates.
//!
//! ## Layers
//!
//! - **[`core`]: The Foundation.** Stateless geometry and Z-matrix models, the Molden
//!   and XYZ codecs, geometry comparison and the external viewer launcher.
//!
//! - **[`engine`]: The Vibration Pipeline.** Parses frequency and normal-coordinate
//!   sections into amplitude-parametrized Cartesian displacement fields, filters
//!   translations and rotations, and projects each mode into internal coordinates.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures (mode analysis,
//!   animation) built from the two layers below.
//!
//! ```ignore
//! use vibzmat::engine::cartesian::CartesianVibration;
//! use vibzmat::engine::config::VibrationConfig;
//! use vibzmat::engine::internal::ZmatVibration;
//! use vibzmat::engine::progress::ProgressReporter;
//!
//! let cart = CartesianVibration::read_molden("water.molden", &VibrationConfig::default())?;
//! let zmat = ZmatVibration::from_cart_vib(&cart, None, &ProgressReporter::new())?;
//! println!("{cart}\n{zmat}");
//! ```

pub mod core;
pub mod engine;
pub mod workflows;

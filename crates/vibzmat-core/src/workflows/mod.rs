//! # Workflows Module
//!
//! End-to-end entry points tying the [`core`](crate::core) and
//! [`engine`](crate::engine) layers together.
//!
//! - **Vibration Workflow** ([`vibration`]) - Reads a Molden file, builds the Cartesian
//!   mode set and optionally projects it into internal coordinates
//! - **Animation Workflow** ([`animate`]) - Samples one mode at evenly spaced amplitudes
//!   to produce a trajectory

pub mod animate;
pub mod vibration;

//! Provides input/output functionality for molecular trajectory formats.
//!
//! Text files are split into named sections by [`sections`], decoded into
//! trajectories by the format modules ([`molden`], [`xyz`]) through the shared
//! [`traits::MolecularFile`] interface, and handed to an external program by
//! [`viewer`].

pub mod molden;
pub mod sections;
pub mod traits;
pub mod viewer;
pub mod xyz;

use thiserror::Error;

use super::config::ConfigError;
use super::symbols::AmplitudeSymbol;
use crate::core::io::molden::MoldenError;
use crate::core::io::sections::SectionError;
use crate::core::io::xyz::XyzError;
use crate::core::models::geometry::GeometryError;
use crate::core::models::zmat::ZmatError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(transparent)]
    Molden(#[from] MoldenError),

    #[error("Atom record error: {0}")]
    Atoms(#[from] XyzError),

    #[error("Malformed section [{section}]: {reason}")]
    Format {
        section: &'static str,
        reason: String,
    },

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Internal coordinate error: {0}")]
    Zmat(#[from] ZmatError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot substitute {found}: the field is parametrized by {expected}")]
    UnknownSymbol {
        expected: AmplitudeSymbol,
        found: AmplitudeSymbol,
    },

    #[error("Mode {0} has no displacement field")]
    UnknownMode(usize),
}

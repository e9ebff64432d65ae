use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    /// Amplitude of a mode expressed in Cartesian coordinates, rendered `t{mode}`.
    Cartesian,
    /// Amplitude of a mode expressed in internal coordinates, rendered `s{mode}`.
    Internal,
}

impl SymbolKind {
    fn prefix(self) -> char {
        match self {
            SymbolKind::Cartesian => 't',
            SymbolKind::Internal => 's',
        }
    }
}

/// The free amplitude parameter of one vibrational mode.
///
/// Names are derived from the mode index, so the same mode always gets the same symbol
/// and two modes never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AmplitudeSymbol {
    pub kind: SymbolKind,
    pub mode: usize,
}

impl AmplitudeSymbol {
    pub fn cartesian(mode: usize) -> Self {
        Self {
            kind: SymbolKind::Cartesian,
            mode,
        }
    }

    pub fn internal(mode: usize) -> Self {
        Self {
            kind: SymbolKind::Internal,
            mode,
        }
    }
}

impl fmt::Display for AmplitudeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.mode)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid amplitude symbol '{0}' (expected t<mode> or s<mode>)")]
pub struct ParseSymbolError(String);

impl FromStr for AmplitudeSymbol {
    type Err = ParseSymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSymbolError(s.to_string());
        let mut chars = s.chars();
        let kind = match chars.next() {
            Some('t') => SymbolKind::Cartesian,
            Some('s') => SymbolKind::Internal,
            _ => return Err(err()),
        };
        let mode = chars.as_str().parse().map_err(|_| err())?;
        Ok(Self { kind, mode })
    }
}

use super::config::VibrationConfig;
use super::displacement::DisplacementField;
use super::error::EngineError;
use super::symbols::AmplitudeSymbol;
use crate::core::io::sections::{MoldenSections, SectionedTextReader};
use crate::core::io::xyz;
use crate::core::models::atom::Atom;
use crate::core::models::geometry::Geometry;
use nalgebra::Point3;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Bohr radius in Angstroms (CODATA 2018).
pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;

/// Tabulated data of one vibrational mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeInfo {
    pub index: usize,
    /// Wavenumber in cm⁻¹.
    pub frequency: f64,
    pub intensity: Option<f64>,
}

/// Vibrational modes in Cartesian coordinates: a reference geometry (Angstroms) and
/// one amplitude-parametrized displacement field per retained mode.
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianVibration {
    reference: Geometry,
    modes: Vec<ModeInfo>,
    displacements: BTreeMap<usize, DisplacementField>,
}

impl CartesianVibration {
    pub fn new(
        reference: Geometry,
        modes: Vec<ModeInfo>,
        displacements: BTreeMap<usize, DisplacementField>,
    ) -> Self {
        Self {
            reference,
            modes,
            displacements,
        }
    }

    /// Reads `[FREQ]`, `[FR-COORD]`, `[FR-NORM-COORD]` and, when present, `[INT]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a required section is missing, or a
    /// section is malformed.
    #[instrument(skip_all, name = "read_molden", fields(path = %path.as_ref().display()))]
    pub fn read_molden(
        path: impl AsRef<Path>,
        config: &VibrationConfig,
    ) -> Result<Self, EngineError> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        Self::read_from(&mut reader, config)
    }

    pub fn read_from(reader: &mut impl BufRead, config: &VibrationConfig) -> Result<Self, EngineError> {
        let sections = SectionedTextReader::read_from(reader)?;
        Self::from_sections(&sections, config)
    }

    pub fn from_sections(
        sections: &MoldenSections,
        config: &VibrationConfig,
    ) -> Result<Self, EngineError> {
        let frequencies = parse_values(sections.require("FREQ")?, "FREQ")?;
        let intensities = match sections.get("INT") {
            Some(text) => {
                let values = parse_values(text, "INT")?;
                if values.len() != frequencies.len() {
                    return Err(EngineError::Format {
                        section: "INT",
                        reason: format!(
                            "{} intensities for {} frequencies",
                            values.len(),
                            frequencies.len()
                        ),
                    });
                }
                Some(values)
            }
            None => None,
        };

        let reference = parse_reference(sections.require("FR-COORD")?)?;
        let chunks = normal_coordinate_chunks(sections.require("FR-NORM-COORD")?, reference.len());
        if chunks.len() < frequencies.len() {
            return Err(EngineError::Format {
                section: "FR-NORM-COORD",
                reason: format!(
                    "{} displacement blocks for {} frequencies",
                    chunks.len(),
                    frequencies.len()
                ),
            });
        }

        let mut modes = Vec::with_capacity(frequencies.len());
        let mut displacements = BTreeMap::new();
        for (position, (&frequency, chunk)) in frequencies.iter().zip(&chunks).enumerate() {
            let index = config.start_index + position;
            let info = ModeInfo {
                index,
                frequency,
                intensity: intensities.as_ref().map(|values| values[position]),
            };
            if config.exclude_trans_rot && frequency.abs() <= config.zero_threshold {
                debug!(mode = index, frequency, "Dropping zero-frequency mode.");
                continue;
            }
            let offsets = parse_offsets(&reference, chunk)?.scaled(BOHR_TO_ANGSTROM);
            displacements.insert(
                index,
                DisplacementField::new(AmplitudeSymbol::cartesian(index), offsets),
            );
            modes.push(info);
        }

        info!(
            parsed = frequencies.len(),
            retained = modes.len(),
            atoms = reference.len(),
            "Parsed vibrational modes."
        );
        Ok(Self {
            reference,
            modes,
            displacements,
        })
    }

    pub fn reference(&self) -> &Geometry {
        &self.reference
    }

    /// Retained modes in ascending index order.
    pub fn modes(&self) -> &[ModeInfo] {
        &self.modes
    }

    pub fn mode(&self, index: usize) -> Option<&ModeInfo> {
        self.modes.iter().find(|m| m.index == index)
    }

    pub fn displacement(&self, index: usize) -> Option<&DisplacementField> {
        self.displacements.get(&index)
    }

    pub fn displacements(&self) -> &BTreeMap<usize, DisplacementField> {
        &self.displacements
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// The reference displaced along `mode` by `amplitude`.
    pub fn displaced(&self, mode: usize, amplitude: f64) -> Result<Geometry, EngineError> {
        self.displacements
            .get(&mode)
            .ok_or(EngineError::UnknownMode(mode))?
            .displace(&self.reference, amplitude)
    }
}

impl fmt::Display for CartesianVibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vibrational modes in cartesian coordinates.", self.modes.len())
    }
}

fn parse_values(text: &str, section: &'static str) -> Result<Vec<f64>, EngineError> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            l.parse().map_err(|_| EngineError::Format {
                section,
                reason: format!("'{}' is not a number", l),
            })
        })
        .collect()
}

/// `[FR-COORD]` holds `label x y z` in Bohr; atoms are numbered from 0.
fn parse_reference(text: &str) -> Result<Geometry, EngineError> {
    let lines = text.lines().filter(|l| !l.trim().is_empty());
    Ok(xyz::parse_atoms(lines, 0, 1)?.scaled(BOHR_TO_ANGSTROM))
}

/// Splits `[FR-NORM-COORD]` into per-mode blocks of `atom_count` lines.
///
/// Each block is preceded by exactly one header line (`vibration n`).
fn normal_coordinate_chunks(text: &str, atom_count: usize) -> Vec<Vec<&str>> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut chunks = Vec::new();
    let mut n = 1;
    while n + atom_count <= lines.len() {
        chunks.push(lines[n..n + atom_count].to_vec());
        n += atom_count + 1;
    }
    chunks
}

fn parse_offsets(reference: &Geometry, chunk: &[&str]) -> Result<Geometry, EngineError> {
    let atoms = reference
        .atoms()
        .iter()
        .zip(chunk)
        .map(|(atom, line)| {
            let values = line
                .split_whitespace()
                .take(3)
                .map(|field| field.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .ok()
                .filter(|v| v.len() == 3)
                .ok_or_else(|| EngineError::Format {
                    section: "FR-NORM-COORD",
                    reason: format!("expected three displacement components, got '{}'", line),
                })?;
            Ok(Atom::new(
                atom.index,
                &atom.element,
                Point3::new(values[0], values[1], values[2]),
            ))
        })
        .collect::<Result<Vec<_>, EngineError>>()?;
    Ok(Geometry::from_atoms(atoms)?)
}

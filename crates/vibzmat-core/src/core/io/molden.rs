use super::sections::{MoldenSections, SectionError, SectionedTextReader};
use super::traits::{FileExistsError, MolecularFile, WriteOptions};
use super::xyz::{self, DEFAULT_COMMENT, XyzError};
use crate::core::models::geometry::Geometry;
use crate::core::models::trajectory::{ENERGY, GeoConv, MAX_FORCE, RMS_FORCE, Trajectory};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MoldenError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Section(#[from] SectionError),
    #[error(transparent)]
    FileExists(#[from] FileExistsError),
    #[error("Invalid count in section [{section}]: '{value}'")]
    InvalidCount { section: &'static str, value: String },
    #[error("Invalid value in section [{section}]: {reason}")]
    InvalidSection {
        section: &'static str,
        reason: String,
    },
    #[error("Section [{section}] ended after {found} lines, {expected} expected")]
    Truncated {
        section: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Atom record error: {0}")]
    Atoms(#[from] XyzError),
}

/// The Molden trajectory format (`[N_GEO]`, `[GEOCONV]`, `[GEOMETRIES] (XYZ)`).
pub struct MoldenFile;

impl MoldenFile {
    /// Decodes a trajectory from already split sections.
    ///
    /// The first non-blank line of `[GEOMETRIES]` gives the atom count of every
    /// geometry; exactly `atom_count + 2` lines are consumed per geometry and anything
    /// after the last geometry is ignored.
    pub fn from_sections(
        sections: &MoldenSections,
        start_index: usize,
    ) -> Result<Trajectory, MoldenError> {
        let n_geo_text = sections.require("N_GEO")?;
        let n_geo_line = first_content_line(n_geo_text).unwrap_or("");
        let n_geo: usize = n_geo_line.parse().map_err(|_| MoldenError::InvalidCount {
            section: "N_GEO",
            value: n_geo_line.to_string(),
        })?;

        let text = sections.require("GEOMETRIES")?;
        let lines: Vec<&str> = text.lines().collect();
        let mut geometries = Vec::new();

        if n_geo > 0 {
            let start = lines
                .iter()
                .position(|l| !l.trim().is_empty())
                .ok_or(MoldenError::Truncated {
                    section: "GEOMETRIES",
                    expected: 1,
                    found: 0,
                })?;
            let atom_count = xyz::parse_atom_count(lines[start], start + 1)?;
            let available = lines.len() - start;
            let stride = atom_count
                .checked_add(2)
                .ok_or_else(|| MoldenError::InvalidCount {
                    section: "GEOMETRIES",
                    value: lines[start].trim().to_string(),
                })?;
            let needed = stride
                .checked_mul(n_geo)
                .filter(|&needed| needed <= available)
                .ok_or(MoldenError::Truncated {
                    section: "GEOMETRIES",
                    expected: stride.saturating_mul(n_geo),
                    found: available,
                })?;

            for chunk in lines[start..start + needed].chunks(stride) {
                geometries.push(xyz::parse_atoms(
                    chunk[2..].iter().copied(),
                    start_index,
                    start + geometries.len() * stride + 3,
                )?);
            }
        }

        let geoconv = match sections.get("GEOCONV") {
            Some(text) => parse_geoconv(text)?,
            None => GeoConv::default(),
        };

        debug!(
            geometries = geometries.len(),
            annotated = !geoconv.is_empty(),
            "Decoded Molden trajectory."
        );
        Ok(Trajectory {
            geometries,
            geoconv,
        })
    }

    /// Writes the fixed header: geometry count and placeholder `[GEOCONV]` blocks.
    fn header(count: usize) -> String {
        let values = "1\n".repeat(count);
        format!(
            "[MOLDEN FORMAT]\n[N_GEO]\n{count}\n[GEOCONV]\n{ENERGY}\n{values}{MAX_FORCE}\n{values}{RMS_FORCE}\n{values}[GEOMETRIES] (XYZ)\n"
        )
    }
}

impl MolecularFile for MoldenFile {
    type Error = MoldenError;

    fn read_from(reader: &mut impl BufRead, start_index: usize) -> Result<Trajectory, MoldenError> {
        let sections = SectionedTextReader::read_from(reader)?;
        Self::from_sections(&sections, start_index)
    }

    fn write_to(
        geometries: &[Geometry],
        options: &WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), MoldenError> {
        let frames: Vec<String> = geometries
            .iter()
            .map(|g| {
                if options.sort_index {
                    xyz::format_frame(&g.sort_index(), DEFAULT_COMMENT, &options.float_format)
                } else {
                    xyz::format_frame(g, DEFAULT_COMMENT, &options.float_format)
                }
            })
            .collect();

        writer.write_all(Self::header(geometries.len()).as_bytes())?;
        writer.write_all(frames.join("\n").as_bytes())?;
        if !frames.is_empty() {
            writer.write_all(b"\n")?;
        }
        info!(geometries = geometries.len(), "Encoded Molden trajectory.");
        Ok(())
    }
}

fn first_content_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

/// Parses named blocks of per-step values, e.g. `energy` followed by one number per line.
fn parse_geoconv(text: &str) -> Result<GeoConv, MoldenError> {
    let mut geoconv = GeoConv::new();
    let mut current: Option<(&str, Vec<f64>)> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.parse::<f64>() {
            Ok(value) => match current.as_mut() {
                Some((_, values)) => values.push(value),
                None => {
                    return Err(MoldenError::InvalidSection {
                        section: "GEOCONV",
                        reason: format!("value '{}' precedes any block name", line),
                    });
                }
            },
            Err(_) => {
                if let Some((name, values)) = current.take() {
                    geoconv.insert(name, values);
                }
                current = Some((line, Vec::new()));
            }
        }
    }
    if let Some((name, values)) = current {
        geoconv.insert(name, values);
    }
    Ok(geoconv)
}

use super::traits::{FileExistsError, FloatFormat, MolecularFile, WriteOptions};
use crate::core::models::atom::Atom;
use crate::core::models::geometry::{Geometry, GeometryError};
use crate::core::models::trajectory::Trajectory;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

pub const DEFAULT_COMMENT: &str = "Created by vibzmat";

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Frame starting on line {line} promises {expected} atoms but only {found} lines follow")]
    Truncated {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    FileExists(#[from] FileExistsError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("Invalid coordinate '{0}'")]
    InvalidFloat(String),
    #[error("Atom line needs an element label and three coordinates")]
    TooFewFields,
}

/// Parses `label x y z` (further columns are ignored).
pub fn parse_atom_line(line: &str, line_number: usize) -> Result<(String, Point3<f64>), XyzError> {
    let mut fields = line.split_whitespace();
    let parse_error = |kind| XyzError::Parse {
        line: line_number,
        kind,
    };
    let label = fields
        .next()
        .ok_or_else(|| parse_error(XyzParseErrorKind::TooFewFields))?;
    let mut coords = [0.0; 3];
    for coord in coords.iter_mut() {
        let field = fields
            .next()
            .ok_or_else(|| parse_error(XyzParseErrorKind::TooFewFields))?;
        *coord = field
            .parse()
            .map_err(|_| parse_error(XyzParseErrorKind::InvalidFloat(field.to_string())))?;
    }
    Ok((label.to_string(), Point3::from(coords)))
}

/// Builds a geometry from consecutive atom lines, numbering atoms from `start_index`.
///
/// `first_line_number` is the 1-based file line of the first entry, used in errors.
pub fn parse_atoms<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    start_index: usize,
    first_line_number: usize,
) -> Result<Geometry, XyzError> {
    let mut geometry = Geometry::new();
    for (offset, line) in lines.into_iter().enumerate() {
        let (label, position) = parse_atom_line(line, first_line_number + offset)?;
        geometry.push(Atom::new(start_index + offset, &label, position))?;
    }
    Ok(geometry)
}

pub fn parse_atom_count(line: &str, line_number: usize) -> Result<usize, XyzError> {
    line.trim().parse().map_err(|_| XyzError::Parse {
        line: line_number,
        kind: XyzParseErrorKind::InvalidAtomCount(line.trim().to_string()),
    })
}

/// Renders one frame: atom count, comment, then one aligned line per atom.
///
/// The result carries no trailing newline.
pub fn format_frame(geometry: &Geometry, comment: &str, float_format: &FloatFormat) -> String {
    let rows: Vec<(&str, [String; 3])> = geometry
        .atoms()
        .iter()
        .map(|atom| {
            let p = atom.position;
            (
                atom.element.as_str(),
                [
                    float_format.format(p.x),
                    float_format.format(p.y),
                    float_format.format(p.z),
                ],
            )
        })
        .collect();

    let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let coord_width = rows
        .iter()
        .flat_map(|(_, c)| c.iter().map(String::len))
        .max()
        .unwrap_or(0);

    let mut out = format!("{}\n{}", geometry.len(), comment);
    for (label, [x, y, z]) in &rows {
        out.push_str(&format!(
            "\n{:<lw$} {:>cw$} {:>cw$} {:>cw$}",
            label,
            x,
            y,
            z,
            lw = label_width,
            cw = coord_width
        ));
    }
    out
}

/// Single- and multi-frame XYZ files.
pub struct XyzFile;

impl MolecularFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead, start_index: usize) -> Result<Trajectory, XyzError> {
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
        let mut geometries = Vec::new();
        let mut pos = 0;

        loop {
            while pos < lines.len() && lines[pos].trim().is_empty() {
                pos += 1;
            }
            if pos >= lines.len() {
                break;
            }

            let count = parse_atom_count(&lines[pos], pos + 1)?;
            let first_atom = pos + 2;
            let available = lines.len().saturating_sub(first_atom);
            if available < count {
                return Err(XyzError::Truncated {
                    line: pos + 1,
                    expected: count,
                    found: available,
                });
            }
            geometries.push(parse_atoms(
                lines[first_atom..first_atom + count].iter().map(String::as_str),
                start_index,
                first_atom + 1,
            )?);
            pos = first_atom + count;
        }

        Ok(Trajectory::new(geometries))
    }

    fn write_to(
        geometries: &[Geometry],
        options: &WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), XyzError> {
        for geometry in geometries {
            let frame = if options.sort_index {
                format_frame(&geometry.sort_index(), DEFAULT_COMMENT, &options.float_format)
            } else {
                format_frame(geometry, DEFAULT_COMMENT, &options.float_format)
            };
            writeln!(writer, "{}", frame)?;
        }
        Ok(())
    }
}

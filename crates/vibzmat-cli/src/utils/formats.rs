use crate::error::{CliError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;
use vibzmat::core::io::molden::MoldenFile;
use vibzmat::core::io::sections::SectionedTextReader;
use vibzmat::core::io::traits::{MolecularFile, WriteOptions};
use vibzmat::core::io::xyz::XyzFile;
use vibzmat::core::models::geometry::Geometry;
use vibzmat::engine::cartesian::CartesianVibration;
use vibzmat::engine::config::VibrationConfigBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Xyz,
    Molden,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xyz") => Ok(Self::Xyz),
            Some("molden") | Some("mold") => Ok(Self::Molden),
            _ => Err(CliError::Argument(format!(
                "Cannot infer the file format of {:?}; expected a .xyz or .molden extension",
                path
            ))),
        }
    }
}

/// Reads every geometry stored in `path`.
///
/// Molden files holding a `[GEOMETRIES]` trajectory yield all of its geometries; a
/// frequency file without one yields its `[FR-COORD]` reference geometry.
pub fn read_geometries(path: &Path, start_index: usize) -> Result<Vec<Geometry>> {
    match FileFormat::from_path(path)? {
        FileFormat::Xyz => XyzFile::read_from_path(path, start_index)
            .map(|trajectory| trajectory.geometries)
            .map_err(|e| CliError::parsing(path, e)),
        FileFormat::Molden => read_molden_geometries(path, start_index),
    }
}

fn read_molden_geometries(path: &Path, start_index: usize) -> Result<Vec<Geometry>> {
    let mut reader = BufReader::new(File::open(path)?);
    let sections =
        SectionedTextReader::read_from(&mut reader).map_err(|e| CliError::parsing(path, e))?;

    if sections.contains("N_GEO") {
        debug!("Reading {:?} as a Molden trajectory.", path);
        return MoldenFile::from_sections(&sections, start_index)
            .map(|trajectory| trajectory.geometries)
            .map_err(|e| CliError::parsing(path, e));
    }
    if sections.contains("FR-COORD") {
        debug!("Reading the reference geometry of {:?}.", path);
        let config = VibrationConfigBuilder::new()
            .start_index(start_index)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        let vibration = CartesianVibration::from_sections(&sections, &config)
            .map_err(|e| CliError::parsing(path, e))?;
        return Ok(vec![vibration.reference().clone()]);
    }
    Err(CliError::parsing(
        path,
        anyhow::anyhow!("neither [N_GEO] nor [FR-COORD] is present"),
    ))
}

/// Writes `geometries` in the format implied by the extension of `path`.
pub fn write_geometries(path: &Path, geometries: &[Geometry], options: &WriteOptions) -> Result<()> {
    let result = match FileFormat::from_path(path)? {
        FileFormat::Xyz => XyzFile::write_to_path(geometries, options, path).map_err(anyhow::Error::from),
        FileFormat::Molden => {
            MoldenFile::write_to_path(geometries, options, path).map_err(anyhow::Error::from)
        }
    };
    result.map_err(|e| CliError::writing(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use std::fs;
    use tempfile::tempdir;
    use vibzmat::core::models::atom::Atom;

    const FREQUENCY_FILE: &str = "\
[Molden Format]
[FREQ]
1600.0
[FR-COORD]
o 0.0 0.0 0.0
h 0.0 1.4 1.1
h 0.0 -1.4 1.1
[FR-NORM-COORD]
vibration 1
0.0 0.0 -0.07
0.0 0.43 0.56
0.0 -0.43 0.56
";

    fn water() -> Geometry {
        Geometry::from_atoms([
            Atom::new(0, "O", Point3::new(0.0, 0.0, 0.1)),
            Atom::new(1, "H", Point3::new(0.0, 0.75, -0.4)),
            Atom::new(2, "H", Point3::new(0.0, -0.75, -0.4)),
        ])
        .unwrap()
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.XYZ")).unwrap(), FileFormat::Xyz);
        assert_eq!(
            FileFormat::from_path(Path::new("dir/b.molden")).unwrap(),
            FileFormat::Molden
        );
        assert!(matches!(
            FileFormat::from_path(Path::new("c.pdb")),
            Err(CliError::Argument(_))
        ));
        assert!(FileFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn written_trajectories_read_back_in_either_format() {
        let dir = tempdir().unwrap();
        let frames = vec![water(), water().scaled(1.1)];
        for name in ["traj.xyz", "traj.molden"] {
            let path = dir.path().join(name);
            write_geometries(&path, &frames, &WriteOptions::default()).unwrap();
            let read = read_geometries(&path, 0).unwrap();
            assert_eq!(read.len(), 2, "{name}");
            assert_eq!(read[0].elements(), vec!["O", "H", "H"]);
        }
    }

    #[test]
    fn frequency_file_yields_its_reference_geometry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("water.molden");
        fs::write(&path, FREQUENCY_FILE).unwrap();

        let geometries = read_geometries(&path, 1).unwrap();
        assert_eq!(geometries.len(), 1);
        assert_eq!(geometries[0].indices().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn molden_file_without_geometry_sections_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.molden");
        fs::write(&path, "[Molden Format]\n[FREQ]\n1.0\n").unwrap();
        assert!(matches!(
            read_geometries(&path, 0),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn existing_output_is_kept_without_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keep.xyz");
        fs::write(&path, "original").unwrap();
        let options = WriteOptions {
            overwrite: false,
            ..WriteOptions::default()
        };
        let result = write_geometries(&path, &[water()], &options);
        assert!(matches!(result, Err(CliError::FileWriting { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }
}

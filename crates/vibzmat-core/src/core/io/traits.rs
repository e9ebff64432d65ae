use crate::core::models::geometry::Geometry;
use crate::core::models::trajectory::Trajectory;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Destination '{}' already exists and overwriting is disabled", path.display())]
pub struct FileExistsError {
    pub path: PathBuf,
}

/// How coordinates are rendered as text.
#[derive(Debug, Clone, Copy)]
pub enum FloatFormat {
    /// Fixed-point with the given number of decimals.
    Fixed { precision: usize },
    /// Scientific notation with the given number of decimals in the mantissa.
    Scientific { precision: usize },
    Custom(fn(f64) -> String),
}

impl Default for FloatFormat {
    fn default() -> Self {
        FloatFormat::Fixed { precision: 6 }
    }
}

impl FloatFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            FloatFormat::Fixed { precision } => format!("{:.*}", *precision, value),
            FloatFormat::Scientific { precision } => format!("{:.*e}", *precision, value),
            FloatFormat::Custom(f) => f(value),
        }
    }
}

/// Options shared by all trajectory writers.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Sort every geometry by atom index before writing.
    pub sort_index: bool,
    /// Replace an existing destination file. When `false` an existing file is an error
    /// and is left untouched.
    pub overwrite: bool,
    pub float_format: FloatFormat,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sort_index: true,
            overwrite: true,
            float_format: FloatFormat::default(),
        }
    }
}

/// Opens `path` for writing according to the overwrite policy.
///
/// With `overwrite == false` the file is created atomically, so an existing file is
/// never truncated.
pub fn open_destination(path: &Path, overwrite: bool) -> Result<File, DestinationError> {
    if overwrite {
        return Ok(File::create(path)?);
    }
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => DestinationError::Exists(FileExistsError {
                path: path.to_path_buf(),
            }),
            _ => DestinationError::Io(e),
        })
}

#[derive(Debug, Error)]
pub enum DestinationError {
    #[error(transparent)]
    Exists(#[from] FileExistsError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Defines the interface for reading and writing trajectory file formats.
///
/// Implementors handle the format-specific parsing and serialization; the path-based
/// helpers and the overwrite policy are shared.
pub trait MolecularFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error> + From<FileExistsError>;

    /// Reads a trajectory, numbering atoms of every geometry from `start_index`.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead, start_index: usize) -> Result<Trajectory, Self::Error>;

    /// Writes geometries in list order.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(
        geometries: &[Geometry],
        options: &WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(
        path: P,
        start_index: usize,
    ) -> Result<Trajectory, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, start_index)
    }

    /// Writes geometries to a file path, honouring `options.overwrite`.
    ///
    /// # Errors
    ///
    /// Returns a [`FileExistsError`] (converted into `Self::Error`) if the destination
    /// exists and overwriting is disabled; the existing file is not modified.
    fn write_to_path<P: AsRef<Path>>(
        geometries: &[Geometry],
        options: &WriteOptions,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = match open_destination(path.as_ref(), options.overwrite) {
            Ok(file) => file,
            Err(DestinationError::Exists(e)) => return Err(e.into()),
            Err(DestinationError::Io(e)) => return Err(e.into()),
        };
        let mut writer = BufWriter::new(file);
        Self::write_to(geometries, options, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Renders geometries to an in-memory string instead of a file.
    fn write_to_string(
        geometries: &[Geometry],
        options: &WriteOptions,
    ) -> Result<String, Self::Error> {
        let mut buffer = Vec::new();
        Self::write_to(geometries, options, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }
}

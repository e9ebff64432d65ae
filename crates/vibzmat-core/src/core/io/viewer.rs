use super::molden::{MoldenError, MoldenFile};
use super::traits::{MolecularFile, WriteOptions};
use crate::core::models::geometry::Geometry;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_VIEWER: &str = "gv";

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to write viewer input: {0}")]
    Molden(#[from] MoldenError),
    #[error("Failed to launch viewer '{program}': {source}")]
    Launch { program: String, source: io::Error },
    #[error("Viewer '{program}' exited with {status}")]
    Exit { program: String, status: ExitStatus },
    #[error("Viewer thread panicked")]
    ThreadPanicked,
}

/// What to show: one geometry or an ordered list of them.
#[derive(Debug, Clone, Copy)]
pub enum ViewTarget<'a> {
    Single(&'a Geometry),
    Trajectory(&'a [Geometry]),
}

impl<'a> ViewTarget<'a> {
    fn geometries(&self) -> &'a [Geometry] {
        match self {
            ViewTarget::Single(geometry) => std::slice::from_ref(*geometry),
            ViewTarget::Trajectory(geometries) => *geometries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Executable invoked with the Molden file as its only argument.
    pub program: String,
    /// Write into the working directory and keep the file afterwards.
    pub use_current_dir: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_VIEWER.to_string(),
            use_current_dir: false,
        }
    }
}

/// A running viewer. Dropping the handle detaches the viewer thread.
#[derive(Debug)]
pub struct ViewerHandle {
    path: PathBuf,
    thread: JoinHandle<Result<(), ViewerError>>,
}

impl ViewerHandle {
    /// The Molden file handed to the viewer.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocks until the viewer exits.
    pub fn wait(self) -> Result<(), ViewerError> {
        self.thread.join().map_err(|_| ViewerError::ThreadPanicked)?
    }
}

/// Writes `target` to a fresh Molden file and opens it with the configured viewer.
///
/// The file is named `vibzmat_list_{i}.molden` with the smallest free `i >= 1`. It is
/// written to the temporary directory and removed once the viewer exits, unless
/// `config.use_current_dir` is set.
pub fn view(target: ViewTarget<'_>, config: &ViewerConfig) -> Result<ViewerHandle, ViewerError> {
    let dir = if config.use_current_dir {
        std::env::current_dir()?
    } else {
        std::env::temp_dir()
    };
    view_in(&dir, target, config, !config.use_current_dir)
}

fn view_in(
    dir: &Path,
    target: ViewTarget<'_>,
    config: &ViewerConfig,
    remove_after: bool,
) -> Result<ViewerHandle, ViewerError> {
    let path = write_fresh_file(dir, target.geometries())?;
    info!(path = %path.display(), program = %config.program, "Launching viewer.");

    let program = config.program.clone();
    let file = path.clone();
    let thread = thread::spawn(move || {
        let status = Command::new(&program).arg(&file).status();
        if remove_after {
            if let Err(e) = std::fs::remove_file(&file) {
                warn!(path = %file.display(), "Could not remove viewer file: {}", e);
            }
        }
        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(ViewerError::Exit { program, status }),
            Err(source) => Err(ViewerError::Launch { program, source }),
        }
    });

    Ok(ViewerHandle { path, thread })
}

pub fn viewer_file_name(i: usize) -> String {
    format!("vibzmat_list_{}.molden", i)
}

fn write_fresh_file(dir: &Path, geometries: &[Geometry]) -> Result<PathBuf, ViewerError> {
    let options = WriteOptions {
        overwrite: false,
        ..WriteOptions::default()
    };
    let mut i = 1;
    loop {
        let path = dir.join(viewer_file_name(i));
        if !path.exists() {
            match MoldenFile::write_to_path(geometries, &options, &path) {
                Ok(()) => return Ok(path),
                // Another process claimed the name between the probe and the write.
                Err(MoldenError::FileExists(_)) => debug!(path = %path.display(), "Name taken."),
                Err(e) => return Err(e.into()),
            }
        }
        i += 1;
    }
}

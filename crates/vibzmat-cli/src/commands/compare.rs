use crate::cli::CompareArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::formats::read_geometries;
use std::path::Path;
use tracing::info;
use vibzmat::core::compare::{IsCloseOptions, isclose, rmsd};
use vibzmat::core::models::geometry::Geometry;

pub fn run(args: CompareArgs, config: &PartialAppConfig) -> Result<()> {
    let start_index = config.start_index(None);
    let first = select_frame(&args.first, args.frame, start_index)?;
    let second = select_frame(&args.second, args.frame, start_index)?;

    let options = IsCloseOptions {
        align: !args.no_align,
        rtol: args.rtol,
        atol: args.atol,
    };
    let close = isclose(&first, &second, &options);
    let deviation = rmsd(&first, &second, options.align);
    info!(close, rmsd = ?deviation, "Compared geometries.");

    match deviation {
        Some(value) => println!("RMSD: {:.6} Å", value),
        None => println!("RMSD: n/a (atom indices or elements differ)"),
    }
    if close {
        println!("Geometries are close.");
        Ok(())
    } else {
        println!("Geometries differ.");
        Err(CliError::Mismatch)
    }
}

fn select_frame(path: &Path, frame: usize, start_index: usize) -> Result<Geometry> {
    let geometries = read_geometries(path, start_index)?;
    let count = geometries.len();
    geometries.into_iter().nth(frame).ok_or_else(|| {
        CliError::Argument(format!(
            "{:?} holds {} geometries, frame {} requested",
            path, count, frame
        ))
    })
}

use crate::cli::ModesArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use std::fmt::Write;
use tracing::info;
use vibzmat::engine::cartesian::CartesianVibration;
use vibzmat::engine::internal::ZmatVibration;
use vibzmat::engine::progress::ProgressReporter;
use vibzmat::workflows::vibration::{self, VibrationRequest};

pub fn run(args: ModesArgs, config: &PartialAppConfig, progress: &CliProgressHandler) -> Result<()> {
    let vibration_config = config.vibration_config(&args.vibration)?;
    let request = VibrationRequest {
        molden_path: &args.input,
        table_path: args.vibration.table.as_deref(),
        internal: args.internal,
    };
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    info!("Reading vibrational modes from {:?}", &args.input);
    let analysis = vibration::run(&request, &vibration_config, &reporter)?;

    println!("{}", analysis.cartesian);
    print!("{}", mode_table(&analysis.cartesian));

    if let Some(internal) = &analysis.internal {
        println!();
        print!("{}", internal_report(internal));

        if let Some(path) = &args.export_table {
            internal
                .table()
                .save_csv(path)
                .map_err(|e| CliError::writing(path, e))?;
            info!("Construction table written to {:?}", path);
            println!("Construction table written to {}", path.display());
        }
    }
    Ok(())
}

/// One row per retained mode: index, wavenumber and intensity when known.
pub fn mode_table(vibration: &CartesianVibration) -> String {
    let mut out = format!("{:>6} {:>14} {:>14}\n", "mode", "freq (cm-1)", "intensity");
    for mode in vibration.modes() {
        let intensity = mode
            .intensity
            .map_or_else(|| "-".to_string(), |value| format!("{:.4}", value));
        let _ = writeln!(out, "{:>6} {:>14.2} {:>14}", mode.index, mode.frequency, intensity);
    }
    out
}

fn internal_report(internal: &ZmatVibration) -> String {
    let mut out = format!("{}\n\nReference Z-matrix:\n{}", internal, internal.reference());
    for (mode, displacement) in internal.displacements() {
        let _ = write!(out, "\nMode {}: {}", mode, displacement);
    }
    out
}

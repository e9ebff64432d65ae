use crate::cli::AnimateArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::formats::write_geometries;
use crate::utils::progress::CliProgressHandler;
use tracing::info;
use vibzmat::engine::config::{AnimationConfigBuilder, AnimationFrame};
use vibzmat::engine::progress::ProgressReporter;
use vibzmat::workflows::animate;
use vibzmat::workflows::vibration::{self, VibrationRequest};

pub fn run(args: AnimateArgs, config: &PartialAppConfig, progress: &CliProgressHandler) -> Result<()> {
    let vibration_config = config.vibration_config(&args.vibration)?;
    let frame = if args.internal {
        AnimationFrame::Internal
    } else {
        AnimationFrame::Cartesian
    };
    let animation_config = AnimationConfigBuilder::new()
        .mode(args.mode)
        .max_amplitude(args.max_amplitude)
        .steps(args.steps)
        .frame(frame)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let request = VibrationRequest {
        molden_path: &args.input,
        table_path: args.vibration.table.as_deref(),
        internal: args.internal,
    };
    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let analysis = vibration::run(&request, &vibration_config, &reporter)?;

    let frames = animate::run(&analysis, &animation_config)?;
    let options = config.write_options(&args.output_options);
    write_geometries(&args.output, &frames, &options)?;

    info!(
        mode = args.mode,
        frames = frames.len(),
        "Animation written to {:?}",
        &args.output
    );
    println!(
        "Wrote {} frames of mode {} to {}",
        frames.len(),
        args.mode,
        args.output.display()
    );
    Ok(())
}

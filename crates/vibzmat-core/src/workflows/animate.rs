use super::vibration::VibrationAnalysis;
use crate::core::models::geometry::Geometry;
use crate::engine::config::{AnimationConfig, AnimationFrame, ConfigError};
use crate::engine::error::EngineError;
use tracing::{debug, instrument};

/// `steps` evenly spaced amplitudes from `-max` to `max`; a single step samples 0.
pub fn amplitudes(max_amplitude: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..steps)
            .map(|k| -max_amplitude + 2.0 * max_amplitude * k as f64 / (steps - 1) as f64)
            .collect(),
    }
}

/// Samples one mode into a trajectory, in the frame chosen by `config.frame`.
///
/// # Errors
///
/// Returns [`EngineError::UnknownMode`] if the mode has no displacement field and a
/// configuration error if the internal frame is requested without internal modes.
#[instrument(skip_all, name = "animation_workflow", fields(mode = config.mode))]
pub fn run(analysis: &VibrationAnalysis, config: &AnimationConfig) -> Result<Vec<Geometry>, EngineError> {
    let samples = amplitudes(config.max_amplitude, config.steps);
    debug!(frames = samples.len(), frame = ?config.frame, "Sampling mode.");

    match config.frame {
        AnimationFrame::Cartesian => samples
            .iter()
            .map(|&amplitude| analysis.cartesian.displaced(config.mode, amplitude))
            .collect(),
        AnimationFrame::Internal => {
            let internal = analysis.internal.as_ref().ok_or_else(|| {
                EngineError::Config(ConfigError::InvalidParameter {
                    name: "frame",
                    reason: "internal coordinates were not computed".to_string(),
                })
            })?;
            samples
                .iter()
                .map(|&amplitude| internal.displaced(config.mode, amplitude))
                .collect()
        }
    }
}
